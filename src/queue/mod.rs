//! 设备队列
//!
//! 每个设备维护一个按取回时间排序的批次队列。

mod retrieval;

pub use retrieval::{QueuedWork, RetrievalQueue, Retrieved};
