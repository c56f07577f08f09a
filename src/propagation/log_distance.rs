use std::any::Any;

use super::{Position, PropagationLoss};

/// `L = L0 + 10 n log10(d / d0)`, with no extra loss inside `d0`.
#[derive(Debug, Clone)]
pub struct LogDistanceLoss {
    pub exponent: f64,
    pub reference_distance_m: f64,
    pub reference_loss_db: f64,
}

impl Default for LogDistanceLoss {
    fn default() -> Self {
        Self {
            exponent: 3.0,
            reference_distance_m: 1.0,
            reference_loss_db: 46.6777,
        }
    }
}

impl PropagationLoss for LogDistanceLoss {
    fn name(&self) -> &'static str {
        "log_distance"
    }

    fn calc_rx_power(&mut self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64 {
        let d = a.distance_to(b);
        if d <= self.reference_distance_m {
            return tx_power_dbm - self.reference_loss_db;
        }
        let path_loss = 10.0 * self.exponent * (d / self.reference_distance_m).log10();
        tx_power_dbm - (self.reference_loss_db + path_loss)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
