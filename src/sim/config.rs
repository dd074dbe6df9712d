//! 调度仿真配置
//!
//! 设备列表、总工作量与通信时延。支持两种设备描述方式：
//! - `devices`：逐个设备的对象列表
//! - `device_table`：与文档动画 `WorkDispatcher` 构造参数一致的平行数组，
//!   单个 batch size / speed / capacity 会广播到所有设备

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::time::SimTime;

pub const DEFAULT_DISPATCH_LATENCY: SimTime = SimTime(500);
pub const DEFAULT_RETRIEVE_LATENCY: SimTime = SimTime(500);

fn default_dispatch_latency() -> SimTime {
    DEFAULT_DISPATCH_LATENCY
}

fn default_retrieve_latency() -> SimTime {
    DEFAULT_RETRIEVE_LATENCY
}

/// 配置错误：在仿真开始前检测并拒绝。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least one device is required")]
    NoDevices,
    #[error("device {device} has zero capacity")]
    ZeroCapacity { device: usize },
    #[error("device {device} has zero batch size")]
    ZeroBatchSize { device: usize },
    #[error("device {device} has invalid speed {speed} (must be finite and > 0)")]
    InvalidSpeed { device: usize, speed: f64 },
    #[error("duplicate device name: {name}")]
    DuplicateDeviceName { name: String },
    #[error("{field}: expected 1 or {expected} values, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("`devices` and `device_table` are mutually exclusive")]
    AmbiguousDevices,
}

/// 单个设备：容量、每批大小、处理速度（单位/毫秒）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub capacity: u64,
    pub batch_size: u64,
    pub speed: f64,
}

impl DeviceSpec {
    pub fn new(capacity: u64, batch_size: u64, speed: f64) -> Self {
        Self {
            name: None,
            capacity,
            batch_size,
            speed,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 显示名；未命名时使用 `dev{idx}`
    pub fn label(&self, idx: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("dev{idx}"),
        }
    }
}

/// 平行数组形式的设备表。
///
/// - `batch_sizes` / `speeds`：1 个值广播到全部设备，否则长度必须与 `devices` 一致
/// - `capacities`：为空表示容量不受限（`u64::MAX`），1 个值广播，否则长度必须一致
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTable {
    pub devices: Vec<String>,
    pub batch_sizes: Vec<u64>,
    #[serde(default)]
    pub capacities: Vec<u64>,
    pub speeds: Vec<f64>,
}

fn broadcast<T: Copy>(
    field: &'static str,
    values: &[T],
    n: usize,
    empty: Option<T>,
) -> Result<Vec<T>, ConfigError> {
    match (values.len(), empty) {
        (0, Some(fill)) => Ok(vec![fill; n]),
        (1, _) => Ok(vec![values[0]; n]),
        (len, _) if len == n => Ok(values.to_vec()),
        (len, _) => Err(ConfigError::LengthMismatch {
            field,
            expected: n,
            actual: len,
        }),
    }
}

impl DeviceTable {
    pub fn into_specs(self) -> Result<Vec<DeviceSpec>, ConfigError> {
        let n = self.devices.len();
        if n == 0 {
            return Err(ConfigError::NoDevices);
        }
        let batch_sizes = broadcast("batch_sizes", &self.batch_sizes, n, None)?;
        let capacities = broadcast("capacities", &self.capacities, n, Some(u64::MAX))?;
        let speeds = broadcast("speeds", &self.speeds, n, None)?;

        Ok(self
            .devices
            .into_iter()
            .enumerate()
            .map(|(i, name)| DeviceSpec {
                name: Some(name),
                capacity: capacities[i],
                batch_size: batch_sizes[i],
                speed: speeds[i],
            })
            .collect())
    }
}

/// 可选的描述信息（仅用于展示）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchMeta {
    #[serde(default)]
    pub title: Option<String>,
    /// 被切分的工作名称（例如 "batch of material points"）
    #[serde(default)]
    pub work: Option<String>,
}

/// 一次调度仿真的完整输入。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDispatchConfig")]
pub struct DispatchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<DispatchMeta>,
    pub total_work: u64,
    pub devices: Vec<DeviceSpec>,
    pub dispatch_latency: SimTime,
    pub retrieve_latency: SimTime,
}

#[derive(Debug, Deserialize)]
struct RawDispatchConfig {
    #[serde(default)]
    meta: Option<DispatchMeta>,
    total_work: u64,
    #[serde(default)]
    devices: Option<Vec<DeviceSpec>>,
    #[serde(default)]
    device_table: Option<DeviceTable>,
    #[serde(default = "default_dispatch_latency")]
    dispatch_latency: SimTime,
    #[serde(default = "default_retrieve_latency")]
    retrieve_latency: SimTime,
}

impl TryFrom<RawDispatchConfig> for DispatchConfig {
    type Error = ConfigError;

    fn try_from(raw: RawDispatchConfig) -> Result<Self, Self::Error> {
        let devices = match (raw.devices, raw.device_table) {
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousDevices),
            (Some(devices), None) => devices,
            (None, Some(table)) => table.into_specs()?,
            (None, None) => Vec::new(),
        };
        Ok(Self {
            meta: raw.meta,
            total_work: raw.total_work,
            devices,
            dispatch_latency: raw.dispatch_latency,
            retrieve_latency: raw.retrieve_latency,
        })
    }
}

impl DispatchConfig {
    /// 使用默认时延（各 500ms）创建配置
    pub fn new(total_work: u64, devices: Vec<DeviceSpec>) -> Self {
        Self {
            meta: None,
            total_work,
            devices,
            dispatch_latency: DEFAULT_DISPATCH_LATENCY,
            retrieve_latency: DEFAULT_RETRIEVE_LATENCY,
        }
    }

    pub fn with_latencies(mut self, dispatch: SimTime, retrieve: SimTime) -> Self {
        self.dispatch_latency = dispatch;
        self.retrieve_latency = retrieve;
        self
    }

    pub fn with_meta(mut self, meta: DispatchMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// 检查设备配置；返回遇到的第一个错误。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        let mut names = HashSet::new();
        for (device, spec) in self.devices.iter().enumerate() {
            if spec.capacity == 0 {
                return Err(ConfigError::ZeroCapacity { device });
            }
            if spec.batch_size == 0 {
                return Err(ConfigError::ZeroBatchSize { device });
            }
            if !(spec.speed.is_finite() && spec.speed > 0.0) {
                return Err(ConfigError::InvalidSpeed {
                    device,
                    speed: spec.speed,
                });
            }
            if let Some(name) = &spec.name {
                if !names.insert(name.as_str()) {
                    return Err(ConfigError::DuplicateDeviceName { name: name.clone() });
                }
            }
        }
        Ok(())
    }
}
