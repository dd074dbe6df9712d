//! 演示配置
//!
//! 文档页动画使用的默认场景：一颗 CPU 加两块 GPU，速度和容量各不相同。

use crate::sim::{DeviceSpec, DispatchConfig, DispatchMeta};

pub const DEMO_TOTAL_WORK: u64 = 1000;

/// 文档动画的默认设备与工作量（派发/取回时延使用默认的 500ms）
pub fn doc_demo_config() -> DispatchConfig {
    DispatchConfig::new(
        DEMO_TOTAL_WORK,
        vec![
            DeviceSpec::new(200, 50, 0.1).named("cpu"),
            DeviceSpec::new(600, 200, 1.0).named("cuda:0"),
            DeviceSpec::new(600, 200, 0.5).named("cuda:1"),
        ],
    )
    .with_meta(DispatchMeta {
        title: Some("static hybrid scheduler".to_string()),
        work: Some("material points".to_string()),
    })
}
