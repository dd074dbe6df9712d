//! 取回队列
//!
//! 设备上尚未取回的批次，按预计取回时间升序排列；时间相同则按入队先后。

use std::collections::VecDeque;

use crate::dispatch::{Shift, WorkId};
use crate::sim::SimTime;

/// 队列中保存的批次快照（事件本身由调度器持有）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedWork {
    pub id: WorkId,
    pub size: u64,
    pub dispatched_at: SimTime,
    pub retrieved_at: SimTime,
}

/// 一次出队的结果：被取回的队首，以及剩余批次因此产生的位移
#[derive(Debug)]
pub struct Retrieved {
    pub head: QueuedWork,
    pub shifts: Vec<(WorkId, Shift)>,
}

#[derive(Debug, Default)]
pub struct RetrievalQueue {
    cur_units: u64,
    q: VecDeque<QueuedWork>,
}

impl RetrievalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入队：返回入队前队列中已有的工作量（即该批次的 pos0）
    pub fn enqueue(&mut self, work: QueuedWork) -> u64 {
        let pos0 = self.cur_units;
        let idx = self
            .q
            .iter()
            .position(|w| work.retrieved_at < w.retrieved_at)
            .unwrap_or(self.q.len());
        self.q.insert(idx, work);
        self.cur_units = self.cur_units.saturating_add(work.size);
        pos0
    }

    /// 出队：取回队首。
    ///
    /// 派发时间不早于队首的剩余批次会在 `max(队首处理完成, 自身派发完成)` 时刻
    /// 前移 `队首.size`。
    pub fn dequeue(&mut self, dispatch_latency: SimTime) -> Option<Retrieved> {
        let head = self.q.pop_front()?;
        self.cur_units = self.cur_units.saturating_sub(head.size);

        let shifts = self
            .q
            .iter()
            .filter(|w| w.dispatched_at >= head.dispatched_at)
            .map(|w| {
                let at = head
                    .retrieved_at
                    .max(w.dispatched_at.saturating_add(dispatch_latency));
                (w.id, Shift { at, by: head.size })
            })
            .collect();

        Some(Retrieved { head, shifts })
    }

    pub fn front(&self) -> Option<&QueuedWork> {
        self.q.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedWork> {
        self.q.iter()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// 队列中的总工作量
    pub fn units(&self) -> u64 {
        self.cur_units
    }
}
