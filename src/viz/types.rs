use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchTrace;
use crate::sim::DispatchConfig;

/// 可视化事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 仿真元信息（t=0 的第一条事件）
    Meta {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        work: Option<String>,
        total_work: u64,
        devices: Vec<VizDeviceInfo>,
        dispatch_latency_ms: u64,
        retrieve_latency_ms: u64,
    },
    /// 批次开始派发（动画：移入设备队列中 `pos0` 处）
    Dispatch { device: usize, size: u64, pos0: u64 },
    /// 派发通信完成，开始处理
    ProcessStart { device: usize, duration_ms: u64 },
    /// 前面的批次被取回，本批次前移
    Shift { device: usize, by: u64 },
    /// 处理完成，开始取回
    Retrieve { device: usize, size: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizDeviceInfo {
    pub id: usize,
    pub name: String,
    pub capacity: u64,
    pub batch_size: u64,
    pub speed: f64,
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizEvent {
    /// 仿真时间（毫秒，和 `SimTime.0` 同口径）
    pub t_ms: u64,
    pub work_id: Option<u64>,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 事件收集器：按时间排序后整体写出 JSON
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }

    /// 把仿真结果展开成时间线：meta 在前，其余按时间排序，同一时刻保持生成顺序
    pub fn from_trace(cfg: &DispatchConfig, trace: &DispatchTrace) -> Self {
        let mut v = VizLogger::default();
        v.push(VizEvent {
            t_ms: 0,
            work_id: None,
            kind: VizEventKind::Meta {
                title: cfg.meta.as_ref().and_then(|m| m.title.clone()),
                work: cfg.meta.as_ref().and_then(|m| m.work.clone()),
                total_work: cfg.total_work,
                devices: cfg
                    .devices
                    .iter()
                    .enumerate()
                    .map(|(id, d)| VizDeviceInfo {
                        id,
                        name: d.label(id),
                        capacity: d.capacity,
                        batch_size: d.batch_size,
                        speed: d.speed,
                    })
                    .collect(),
                dispatch_latency_ms: cfg.dispatch_latency.as_millis(),
                retrieve_latency_ms: cfg.retrieve_latency.as_millis(),
            },
        });

        for (id, ev) in trace.iter() {
            let device = ev.dispatched_to.0;
            let work_id = Some(id.0);
            v.push(VizEvent {
                t_ms: ev.dispatched_at.as_millis(),
                work_id,
                kind: VizEventKind::Dispatch {
                    device,
                    size: ev.size,
                    pos0: ev.pos0,
                },
            });
            v.push(VizEvent {
                t_ms: ev.processed_at.as_millis(),
                work_id,
                kind: VizEventKind::ProcessStart {
                    device,
                    duration_ms: ev.process_duration.as_millis(),
                },
            });
            for shift in &ev.shifts {
                v.push(VizEvent {
                    t_ms: shift.at.as_millis(),
                    work_id,
                    kind: VizEventKind::Shift {
                        device,
                        by: shift.by,
                    },
                });
            }
            v.push(VizEvent {
                t_ms: ev.retrieved_at.as_millis(),
                work_id,
                kind: VizEventKind::Retrieve {
                    device,
                    size: ev.size,
                },
            });
        }

        // stable sort：meta (t=0) 始终在第一条
        v.events.sort_by_key(|e| e.t_ms);
        v
    }
}
