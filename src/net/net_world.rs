//! 网络世界实现
//!
//! 定义无线仿真的世界（World）实现，持有网络拓扑。

use super::network::WirelessNetwork;
use crate::sim::{Simulator, World};
use std::any::Any;

/// 停止条件：每个事件执行后检查一次，返回 true 时停止仿真
pub type StopCondition = Box<dyn FnMut(&WirelessNetwork) -> bool + Send>;

/// 默认的无线世界：持有 WirelessNetwork。驱动程序自己的状态通过回调捕获的共享句柄保存。
#[derive(Default)]
pub struct WirelessWorld {
    pub net: WirelessNetwork,
    stop_when: Option<StopCondition>,
}

impl WirelessWorld {
    pub fn new(net: WirelessNetwork) -> Self {
        Self {
            net,
            stop_when: None,
        }
    }

    pub fn set_stop_condition(&mut self, cond: StopCondition) {
        self.stop_when = Some(cond);
    }
}

impl World for WirelessWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, sim: &mut Simulator) {
        if let Some(cond) = self.stop_when.as_mut() {
            if cond(&self.net) && !sim.is_stopped() {
                sim.stop();
            }
        }
    }
}
