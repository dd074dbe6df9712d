//! 标识符类型
//!
//! 定义工作批次与设备的标识符。

use serde::{Deserialize, Serialize};

/// 工作批次标识符：按派发顺序从 0 递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(pub u64);

/// 设备标识符（设备列表下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub usize);
