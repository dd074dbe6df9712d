//! 静态混合调度器
//!
//! 把一份工作切成批次，轮流派发到负载最低的设备；目标设备放不下下一批时，
//! 取回全局最早完成取回的批次以腾出容量。派发/取回两个阶段交替推进仿真时间，
//! 派发完所有工作后依次清空每个设备的队列。

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use super::error::DispatchError;
use super::id::{DeviceId, WorkId};
use super::trace::DispatchTrace;
use super::work_event::WorkEvent;
use crate::queue::{QueuedWork, RetrievalQueue};
use crate::sim::{ConfigError, DeviceSpec, DispatchConfig, SimTime};

/// 负载百分比：`ceil(load / capacity * 100)`，按浮点计算后向上取整
pub fn load_fraction(load: u64, capacity: u64) -> u64 {
    ((load as f64 / capacity as f64) * 100.0).ceil() as u64
}

/// 负载百分比最小的设备；相同时取下标最小者。
pub fn least_loaded(devices: &[DeviceSpec], loads: &[u64]) -> DeviceId {
    let mut best = 0;
    let mut best_frac = u64::MAX;
    for (i, (spec, &load)) in devices.iter().zip(loads).enumerate() {
        let frac = load_fraction(load, spec.capacity);
        if frac < best_frac {
            best = i;
            best_frac = frac;
        }
    }
    DeviceId(best)
}

/// 持有校验过的配置；每次 `simulate` 使用独立的局部状态，可重复、并发调用。
#[derive(Debug, Clone)]
pub struct StaticHybridScheduler {
    cfg: DispatchConfig,
}

impl StaticHybridScheduler {
    pub fn new(cfg: DispatchConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.cfg
    }

    pub fn simulate(&self) -> Result<DispatchTrace, DispatchError> {
        run(&self.cfg)
    }
}

/// 校验配置并运行一次仿真。
pub fn simulate(cfg: &DispatchConfig) -> Result<DispatchTrace, DispatchError> {
    cfg.validate()?;
    run(cfg)
}

#[tracing::instrument(skip(cfg), fields(devices = cfg.devices.len(), total_work = cfg.total_work))]
fn run(cfg: &DispatchConfig) -> Result<DispatchTrace, DispatchError> {
    info!("▶️  开始调度仿真");

    let mut st = DispatchState::new(cfg);
    let (mut dev, mut batch) = st.select();
    while st.remaining > 0 {
        if st.free(dev) >= batch {
            st.dispatch(dev, batch)?;
        } else {
            st.retrieve_earliest()?;
        }
        (dev, batch) = st.select();
    }
    st.drain()?;

    let trace = st.finish()?;
    info!(
        events = trace.len(),
        makespan = ?trace.makespan(cfg.retrieve_latency),
        "✅ 调度仿真完成"
    );
    Ok(trace)
}

/// 单次仿真的全部可变状态
struct DispatchState<'a> {
    cfg: &'a DispatchConfig,
    now: SimTime,
    remaining: u64,
    dispatched_total: u64,
    next_id: u64,
    loads: Vec<u64>,
    queues: Vec<RetrievalQueue>,
    events: BTreeMap<WorkId, WorkEvent>,
}

impl<'a> DispatchState<'a> {
    fn new(cfg: &'a DispatchConfig) -> Self {
        let n = cfg.devices.len();
        Self {
            cfg,
            now: SimTime::ZERO,
            remaining: cfg.total_work,
            dispatched_total: 0,
            next_id: 0,
            loads: vec![0; n],
            queues: (0..n).map(|_| RetrievalQueue::new()).collect(),
            events: BTreeMap::new(),
        }
    }

    /// 下一个目标设备与候选批大小（不超过剩余工作量和设备容量）
    fn select(&self) -> (DeviceId, u64) {
        let dev = least_loaded(&self.cfg.devices, &self.loads);
        let spec = &self.cfg.devices[dev.0];
        let batch = spec.batch_size.min(self.remaining).min(spec.capacity);
        (dev, batch)
    }

    fn free(&self, dev: DeviceId) -> u64 {
        self.cfg.devices[dev.0]
            .capacity
            .saturating_sub(self.loads[dev.0])
    }

    fn dispatch(&mut self, dev: DeviceId, size: u64) -> Result<(), DispatchError> {
        let cfg = self.cfg;
        let spec = &cfg.devices[dev.0];
        let id = WorkId(self.next_id);
        let mut event = WorkEvent::dispatched(size, dev, self.now, cfg.dispatch_latency, spec.speed);
        event.pos0 = self.queues[dev.0].enqueue(event.queued(id));

        debug!(
            work = id.0,
            device = dev.0,
            size,
            at = ?event.dispatched_at,
            retrieved_at = ?event.retrieved_at,
            pos0 = event.pos0,
            "派发批次"
        );
        self.events.insert(id, event);
        self.next_id += 1;

        self.now = self.now.saturating_add(cfg.dispatch_latency);
        self.remaining = self.remaining.checked_sub(size).ok_or_else(|| {
            DispatchError::Invariant(format!(
                "dispatched {size} units with only {} remaining",
                self.remaining
            ))
        })?;
        self.dispatched_total = self.dispatched_total.saturating_add(size);
        self.loads[dev.0] = self.loads[dev.0].saturating_add(size);
        if self.loads[dev.0] > spec.capacity {
            return Err(DispatchError::Invariant(format!(
                "device {} load {} exceeds capacity {}",
                dev.0, self.loads[dev.0], spec.capacity
            )));
        }
        Ok(())
    }

    /// 取回阶段：在所有非空队列中选队首取回完成时间最早的设备（相同时取下标小者）
    fn retrieve_earliest(&mut self) -> Result<(), DispatchError> {
        let mut best: Option<(DeviceId, SimTime)> = None;
        for (i, q) in self.queues.iter().enumerate() {
            if let Some(head) = q.front() {
                let t = head.retrieved_at.saturating_add(self.cfg.retrieve_latency);
                if best.is_none_or(|(_, best_t)| t < best_t) {
                    best = Some((DeviceId(i), t));
                }
            }
        }
        let Some((dev, t)) = best else {
            return Err(DispatchError::Invariant(format!(
                "retrieve phase with no queued work ({} units remaining)",
                self.remaining
            )));
        };
        self.now = t;
        self.retrieve(dev)?;
        Ok(())
    }

    fn retrieve(&mut self, dev: DeviceId) -> Result<QueuedWork, DispatchError> {
        let retrieved = self.queues[dev.0]
            .dequeue(self.cfg.dispatch_latency)
            .ok_or_else(|| {
                DispatchError::Invariant(format!("retrieve from empty queue on device {}", dev.0))
            })?;
        let head = retrieved.head;

        for (id, shift) in retrieved.shifts {
            trace!(work = id.0, at = ?shift.at, by = shift.by, "批次前移");
            self.events
                .get_mut(&id)
                .ok_or_else(|| DispatchError::Invariant(format!("unknown work id {}", id.0)))?
                .record_shift(shift);
        }

        self.loads[dev.0] = self.loads[dev.0].checked_sub(head.size).ok_or_else(|| {
            DispatchError::Invariant(format!(
                "negative load on device {} (load {}, retrieving {})",
                dev.0, self.loads[dev.0], head.size
            ))
        })?;

        debug!(
            work = head.id.0,
            device = dev.0,
            now = ?self.now,
            load = self.loads[dev.0],
            "取回批次"
        );
        Ok(head)
    }

    /// 所有工作派发完后，依设备顺序清空队列
    fn drain(&mut self) -> Result<(), DispatchError> {
        for i in 0..self.queues.len() {
            while !self.queues[i].is_empty() {
                self.retrieve(DeviceId(i))?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<DispatchTrace, DispatchError> {
        if self.dispatched_total != self.cfg.total_work {
            return Err(DispatchError::Invariant(format!(
                "dispatched {} units, expected {}",
                self.dispatched_total, self.cfg.total_work
            )));
        }
        if let Some((i, load)) = self.loads.iter().enumerate().find(|(_, l)| **l != 0) {
            return Err(DispatchError::Invariant(format!(
                "device {i} still holds {load} units after draining"
            )));
        }
        for event in self.events.values_mut() {
            event.consolidate_shifts();
        }
        Ok(DispatchTrace::new(self.events))
    }
}
