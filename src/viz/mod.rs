//! 可视化事件记录（供文档页动画回放）
//!
//! 设计目标：
//! - **结构化**：把每个批次的派发/处理/前移/取回展开为 JSON 事件
//! - **轻量**：只导出数据，渲染与播放由前端负责
//! - **可回放**：事件按时间排序，可直接驱动时间轴

mod types;

pub use types::{VizDeviceInfo, VizEvent, VizEventKind, VizLogger};
