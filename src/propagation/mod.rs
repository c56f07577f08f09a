//! Loss contributors applied by a channel to each transmission.
//!
//! A channel starts from the sender's transmit power and threads it through
//! its contributors in configured order; each one sees the previous output.
//! A contributor may subtract a loss term or force the power down to
//! [`NO_SIGNAL_DBM`] to model an unconditional loss for that attempt.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::SimTime;

mod delay;
mod friis;
mod log_distance;
mod two_state;

pub use delay::ConstantSpeedDelay;
pub use friis::FriisLoss;
pub use log_distance::LogDistanceLoss;
pub use two_state::{ChannelState, TwoStateConfig, TwoStateLoss};

/// Received power standing for "nothing arrived".
pub const NO_SIGNAL_DBM: f64 = -1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

pub trait PropagationLoss: std::fmt::Debug + Send {
    fn name(&self) -> &'static str;

    /// Power (dBm) after this contributor, given the power entering it.
    fn calc_rx_power(&mut self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64;

    /// Called once when the network starts; `Some(delay)` arms a timer.
    fn start(&mut self, _now: SimTime) -> Option<SimTime> {
        None
    }

    /// Timer callback; `Some(delay)` re-arms it.
    fn on_timer(&mut self, _now: SimTime) -> Option<SimTime> {
        None
    }

    fn assign_streams(&mut self, _seed: u64, _first_stream: u64) -> u64 {
        0
    }

    fn as_any(&self) -> &dyn Any;
}

/// Distance-independent constant loss.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoss {
    pub loss_db: f64,
}

impl PropagationLoss for FixedLoss {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn calc_rx_power(&mut self, tx_power_dbm: f64, _a: &Position, _b: &Position) -> f64 {
        tx_power_dbm - self.loss_db
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Configuration form of a loss contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LossSpec {
    Fixed {
        loss_db: f64,
    },
    Friis {
        #[serde(default = "default_frequency_hz")]
        frequency_hz: f64,
    },
    LogDistance {
        #[serde(default)]
        exponent: Option<f64>,
        #[serde(default)]
        reference_loss_db: Option<f64>,
        #[serde(default)]
        reference_distance_m: Option<f64>,
    },
    TwoState(TwoStateConfig),
}

fn default_frequency_hz() -> f64 {
    5e9
}

impl LossSpec {
    pub fn build(&self) -> Result<Box<dyn PropagationLoss>, ConfigError> {
        Ok(match self {
            LossSpec::Fixed { loss_db } => Box::new(FixedLoss { loss_db: *loss_db }),
            LossSpec::Friis { frequency_hz } => Box::new(FriisLoss::new(*frequency_hz)),
            LossSpec::LogDistance {
                exponent,
                reference_loss_db,
                reference_distance_m,
            } => {
                let mut m = LogDistanceLoss::default();
                if let Some(v) = exponent {
                    m.exponent = *v;
                }
                if let Some(v) = reference_loss_db {
                    m.reference_loss_db = *v;
                }
                if let Some(v) = reference_distance_m {
                    m.reference_distance_m = *v;
                }
                Box::new(m)
            }
            LossSpec::TwoState(cfg) => Box::new(TwoStateLoss::new(cfg.clone())?),
        })
    }
}
