//! 调度仿真错误

use thiserror::Error;

use crate::sim::ConfigError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// 输入配置无效（仿真前拒绝）
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// 算法内部不变量被破坏，属于 bug
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}
