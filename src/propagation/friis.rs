use std::any::Any;
use std::f64::consts::PI;

use super::{Position, PropagationLoss};

const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Free-space path loss.
#[derive(Debug, Clone)]
pub struct FriisLoss {
    frequency_hz: f64,
    lambda: f64,
    pub system_loss: f64,
    pub min_loss_db: f64,
}

impl FriisLoss {
    pub fn new(frequency_hz: f64) -> Self {
        Self {
            frequency_hz,
            lambda: SPEED_OF_LIGHT / frequency_hz,
            system_loss: 1.0,
            min_loss_db: 0.0,
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }
}

impl PropagationLoss for FriisLoss {
    fn name(&self) -> &'static str {
        "friis"
    }

    fn calc_rx_power(&mut self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64 {
        let d = a.distance_to(b);
        // near field: the far-field formula is meaningless within a few wavelengths
        if d <= 3.0 * self.lambda {
            return tx_power_dbm - self.min_loss_db;
        }
        let numerator = self.lambda * self.lambda;
        let denominator = 16.0 * PI * PI * d * d * self.system_loss;
        let loss_db = -10.0 * (numerator / denominator).log10();
        tx_power_dbm - loss_db.max(self.min_loss_db)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
