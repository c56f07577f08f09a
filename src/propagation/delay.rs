use crate::sim::SimTime;

use super::Position;

/// Propagation delay at a constant speed (speed of light by default).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSpeedDelay {
    pub speed_mps: f64,
}

impl Default for ConstantSpeedDelay {
    fn default() -> Self {
        Self {
            speed_mps: 299_792_458.0,
        }
    }
}

impl ConstantSpeedDelay {
    pub fn delay(&self, a: &Position, b: &Position) -> SimTime {
        if !(self.speed_mps > 0.0) {
            return SimTime::ZERO;
        }
        SimTime::from_secs_f64(a.distance_to(b) / self.speed_mps)
    }
}
