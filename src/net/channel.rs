//! 共享无线信道
//!
//! 信道只记录挂在它上面的设备和损耗链；扇出时逐个接收者计算接收功率。

use tracing::trace;

use super::id::{ChannelId, DeviceId};
use crate::propagation::{ConstantSpeedDelay, Position, PropagationLoss};
use crate::sim::SimTime;

#[derive(Debug)]
pub struct Channel {
    id: ChannelId,
    pub(crate) devices: Vec<DeviceId>,
    pub(crate) losses: Vec<Box<dyn PropagationLoss>>,
    pub(crate) delay: Option<ConstantSpeedDelay>,
}

impl Channel {
    pub(crate) fn new(id: ChannelId) -> Self {
        Self {
            id,
            devices: Vec::new(),
            losses: Vec::new(),
            delay: None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    pub fn losses(&self) -> &[Box<dyn PropagationLoss>] {
        &self.losses
    }

    pub fn delay_model(&self) -> Option<ConstantSpeedDelay> {
        self.delay
    }

    /// 依次经过损耗链，每一级都看到上一级的输出
    pub(crate) fn rx_power(&mut self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64 {
        let mut power = tx_power_dbm;
        for loss in &mut self.losses {
            power = loss.calc_rx_power(power, a, b);
            trace!(model = loss.name(), power_dbm = power, "loss contributor applied");
        }
        power
    }

    pub(crate) fn propagation_delay(&self, a: &Position, b: &Position) -> SimTime {
        self.delay.map_or(SimTime::ZERO, |d| d.delay(a, b))
    }
}
