//! SNR -> packet error rate models.
//!
//! A receiver hands the effective SNR (dB) and payload size to an
//! [`ErrorModel`] and gets back the probability that the packet is corrupted.
//! The model never decides the outcome itself; the device draws against it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

mod bpsk;
mod table;

pub use bpsk::BpskErrorModel;
pub use table::TableErrorModel;

pub trait ErrorModel: std::fmt::Debug + Send {
    fn name(&self) -> &'static str;

    /// Packet error probability in `[0, 1]`.
    fn error_probability(&mut self, snr_db: f64, bytes: u32) -> f64;
}

/// Gaussian tail probability, Chernoff-style approximation.
///
/// The bound is singular at the origin, so arguments below `1e-4` saturate
/// to the exact value there, `Q(0) = 1/2`.
pub fn q_function(x: f64) -> f64 {
    if x < 1e-4 {
        return 0.5;
    }
    ((1.0 - (-1.4 * x).exp()) * (-0.5 * x * x).exp()) / (2.845 * x)
}

/// Packet error rate for `bytes` octets with independent bit errors.
pub fn ber_to_per(ber: f64, bytes: u32) -> f64 {
    let bits = 8.0 * bytes as f64;
    1.0 - (1.0 - ber).powf(bits)
}

/// Configuration form of an error model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorModelSpec {
    Bpsk,
    Table {
        /// `(snr_db, per)` control points, any order
        points: Vec<(f64, f64)>,
    },
}

impl ErrorModelSpec {
    pub fn build(&self) -> Result<Box<dyn ErrorModel>, ConfigError> {
        match self {
            ErrorModelSpec::Bpsk => Ok(Box::new(BpskErrorModel::default())),
            ErrorModelSpec::Table { points } => {
                let mut model = TableErrorModel::default();
                for &(snr_db, per) in points {
                    model.add_value(snr_db, per)?;
                }
                Ok(Box::new(model))
            }
        }
    }
}
