//! 事件 trait
//!
//! 无线模型里的发送完成、竞争窗口结算、信道状态切换等都以事件的形式交给仿真器。

use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以便把携带的 packet 等数据按值移出。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
