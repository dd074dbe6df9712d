//! 静态混合调度仿真
//!
//! 模拟把固定大小的批次派发到一组异构设备、再取回结果的全过程，
//! 输出每个批次的派发、处理、取回与前移时间线。

mod error;
mod id;
mod scheduler;
mod trace;
mod work_event;

pub use error::DispatchError;
pub use id::{DeviceId, WorkId};
pub use scheduler::{StaticHybridScheduler, least_loaded, load_fraction, simulate};
pub use trace::{DeviceStats, DispatchTrace};
pub use work_event::{Shift, WorkEvent, process_duration};
