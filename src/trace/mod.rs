//! 观测事件（trace）
//!
//! 设备在关键节点上发出通知：入队/出队/丢弃、开始发送、PHY 接收成功/丢弃、
//! MAC 接收成功/碰撞丢弃。通知只读、无返回值，不影响仿真状态。
//!
//! - `TraceSink`：外部观察者（闭包即可）
//! - `TraceLogger`：内存收集器，仿真结束后可写成 JSON

mod types;

pub use types::{TraceEvent, TraceEventKind, TraceLogger, TraceSink};
