//! 世界 trait
//!
//! 定义仿真世界接口。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现（例如无线网络、驱动程序状态）。
///
/// 事件通过 `as_any_mut` 向下转型拿到具体世界。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// 每个事件执行后调用一次
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
