//! 工作批次事件
//!
//! 一个 `WorkEvent` 对应一次派发的批次。派发时一次性创建，之后只追加位移记录，
//! 仿真结束时合并一次。

use serde::{Deserialize, Serialize};

use super::id::{DeviceId, WorkId};
use crate::queue::QueuedWork;
use crate::sim::SimTime;

/// 位移：同一设备上更早的批次被取回后，本批次在队列中前移的量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub at: SimTime,
    pub by: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEvent {
    pub size: u64,
    pub dispatched_to: DeviceId,
    pub dispatched_at: SimTime,
    /// 派发通信完成、开始处理的时间
    pub processed_at: SimTime,
    pub process_duration: SimTime,
    /// 处理完成的时间（取回通信从此刻开始）
    pub retrieved_at: SimTime,
    pub shifts: Vec<Shift>,
    /// 入队时排在前面的工作量
    pub pos0: u64,
}

/// ceil(size / speed)
pub fn process_duration(size: u64, speed: f64) -> SimTime {
    SimTime((size as f64 / speed).ceil() as u64)
}

impl WorkEvent {
    pub(crate) fn dispatched(
        size: u64,
        device: DeviceId,
        at: SimTime,
        dispatch_latency: SimTime,
        speed: f64,
    ) -> Self {
        let processed_at = at.saturating_add(dispatch_latency);
        let process_duration = process_duration(size, speed);
        Self {
            size,
            dispatched_to: device,
            dispatched_at: at,
            processed_at,
            process_duration,
            retrieved_at: processed_at.saturating_add(process_duration),
            shifts: Vec::new(),
            pos0: 0,
        }
    }

    pub(crate) fn queued(&self, id: WorkId) -> QueuedWork {
        QueuedWork {
            id,
            size: self.size,
            dispatched_at: self.dispatched_at,
            retrieved_at: self.retrieved_at,
        }
    }

    pub(crate) fn record_shift(&mut self, shift: Shift) {
        self.shifts.push(shift);
    }

    /// 合并同一时刻的位移，保留各时刻首次出现的顺序
    pub(crate) fn consolidate_shifts(&mut self) {
        let mut merged: Vec<Shift> = Vec::with_capacity(self.shifts.len());
        for shift in self.shifts.drain(..) {
            match merged.iter_mut().find(|m| m.at == shift.at) {
                Some(m) => m.by = m.by.saturating_add(shift.by),
                None => merged.push(shift),
            }
        }
        self.shifts = merged;
    }

    /// 取回通信完成的时间
    pub fn retrieval_done(&self, retrieve_latency: SimTime) -> SimTime {
        self.retrieved_at.saturating_add(retrieve_latency)
    }

    pub fn total_shift(&self) -> u64 {
        self.shifts.iter().map(|s| s.by).sum()
    }
}
