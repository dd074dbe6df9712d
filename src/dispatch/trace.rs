//! 仿真结果
//!
//! `DispatchTrace` 是工作批次 id 到 `WorkEvent` 的有序映射，提供统计与一致性校验。

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::DispatchError;
use super::id::{DeviceId, WorkId};
use super::work_event::{WorkEvent, process_duration};
use crate::sim::{DispatchConfig, SimTime};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchTrace {
    events: BTreeMap<WorkId, WorkEvent>,
}

/// 单个设备的汇总统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub device: DeviceId,
    pub batches: usize,
    pub units: u64,
    /// 处理耗时之和
    pub busy: SimTime,
    /// 按占用区间重建的峰值负载
    pub peak_load: u64,
}

fn invariant(msg: String) -> DispatchError {
    DispatchError::Invariant(msg)
}

impl DispatchTrace {
    pub(crate) fn new(events: BTreeMap<WorkId, WorkEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: WorkId) -> Option<&WorkEvent> {
        self.events.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkId, &WorkEvent)> {
        self.events.iter().map(|(id, ev)| (*id, ev))
    }

    pub fn events(&self) -> &BTreeMap<WorkId, WorkEvent> {
        &self.events
    }

    pub fn into_events(self) -> BTreeMap<WorkId, WorkEvent> {
        self.events
    }

    pub fn total_units(&self) -> u64 {
        self.events.values().map(|ev| ev.size).sum()
    }

    /// 最后一个批次取回完成的时间
    pub fn makespan(&self, retrieve_latency: SimTime) -> SimTime {
        self.events
            .values()
            .map(|ev| ev.retrieval_done(retrieve_latency))
            .max()
            .unwrap_or(SimTime::ZERO)
    }

    pub fn device_stats(&self, cfg: &DispatchConfig) -> Vec<DeviceStats> {
        let peaks = self.peak_loads(cfg);
        let mut stats: Vec<DeviceStats> = (0..cfg.devices.len())
            .map(|i| DeviceStats {
                device: DeviceId(i),
                batches: 0,
                units: 0,
                busy: SimTime::ZERO,
                peak_load: peaks[i],
            })
            .collect();
        for ev in self.events.values() {
            if let Some(s) = stats.get_mut(ev.dispatched_to.0) {
                s.batches += 1;
                s.units = s.units.saturating_add(ev.size);
                s.busy = s.busy.saturating_add(ev.process_duration);
            }
        }
        stats
    }

    /// 扫描每个设备的占用区间 `[dispatched_at, retrieved_at + retrieve_latency)`，
    /// 得到各设备的峰值负载。同一时刻先释放后占用。
    pub fn peak_loads(&self, cfg: &DispatchConfig) -> Vec<u64> {
        let n = cfg.devices.len();
        let mut marks: Vec<Vec<(SimTime, bool, u64)>> = vec![Vec::new(); n];
        for ev in self.events.values() {
            let Some(m) = marks.get_mut(ev.dispatched_to.0) else {
                continue;
            };
            m.push((ev.dispatched_at, true, ev.size));
            m.push((ev.retrieval_done(cfg.retrieve_latency), false, ev.size));
        }

        marks
            .into_iter()
            .map(|mut m| {
                m.sort_by_key(|&(t, acquire, _)| (t, acquire));
                let mut load = 0u64;
                let mut peak = 0u64;
                for (_, acquire, size) in m {
                    if acquire {
                        load = load.saturating_add(size);
                        peak = peak.max(load);
                    } else {
                        load = load.saturating_sub(size);
                    }
                }
                peak
            })
            .collect()
    }

    /// 校验结果与配置的一致性：id 连续、时间关系、处理耗时、总量守恒、
    /// 位移合并以及重建负载不超过容量。
    pub fn verify(&self, cfg: &DispatchConfig) -> Result<(), DispatchError> {
        for (expected, (id, ev)) in self.events.iter().enumerate() {
            if id.0 != expected as u64 {
                return Err(invariant(format!(
                    "work ids are not dense: expected {expected}, found {}",
                    id.0
                )));
            }
            let spec = cfg.devices.get(ev.dispatched_to.0).ok_or_else(|| {
                invariant(format!(
                    "work {} dispatched to unknown device {}",
                    id.0, ev.dispatched_to.0
                ))
            })?;
            if ev.size == 0 || ev.size > spec.capacity {
                return Err(invariant(format!(
                    "work {} has size {} (device capacity {})",
                    id.0, ev.size, spec.capacity
                )));
            }
            if ev.process_duration != process_duration(ev.size, spec.speed) {
                return Err(invariant(format!(
                    "work {} process duration {:?} != ceil({} / {})",
                    id.0, ev.process_duration, ev.size, spec.speed
                )));
            }
            if ev.processed_at != ev.dispatched_at.saturating_add(cfg.dispatch_latency)
                || ev.retrieved_at != ev.processed_at.saturating_add(ev.process_duration)
            {
                return Err(invariant(format!(
                    "work {} has inconsistent timestamps: {:?} / {:?} / {:?}",
                    id.0, ev.dispatched_at, ev.processed_at, ev.retrieved_at
                )));
            }
            let mut seen = HashSet::new();
            for shift in &ev.shifts {
                if shift.by == 0 || !seen.insert(shift.at) {
                    return Err(invariant(format!(
                        "work {} has invalid shift {:?}",
                        id.0, shift
                    )));
                }
            }
        }

        let total = self.total_units();
        if total != cfg.total_work {
            return Err(invariant(format!(
                "trace holds {total} units, expected {}",
                cfg.total_work
            )));
        }

        for (i, (peak, spec)) in self.peak_loads(cfg).iter().zip(&cfg.devices).enumerate() {
            if *peak > spec.capacity {
                return Err(invariant(format!(
                    "device {i} peak load {peak} exceeds capacity {}",
                    spec.capacity
                )));
            }
        }
        Ok(())
    }
}
