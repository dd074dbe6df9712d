//! 仿真基础模块
//!
//! 此模块包含仿真时间与调度仿真的输入配置。

// 子模块声明
mod config;
mod time;

// 重新导出公共接口
pub use config::{
    ConfigError, DEFAULT_DISPATCH_LATENCY, DEFAULT_RETRIEVE_LATENCY, DeviceSpec, DeviceTable,
    DispatchConfig, DispatchMeta,
};
pub use time::SimTime;
