use tracing::{debug, trace};

use super::ErrorModel;
use crate::error::ConfigError;

/// Piecewise-linear SNR -> PER lookup.
///
/// Below the lowest control point the packet is assumed lost (PER 1), above
/// the highest it is assumed clean (PER 0). An empty table always answers 1.
#[derive(Debug, Clone, Default)]
pub struct TableErrorModel {
    // sorted by SNR, unique keys
    points: Vec<(f64, f64)>,
    cache: Option<(f64, f64)>,
}

impl TableErrorModel {
    /// Inserts a control point. An SNR that is already present keeps its
    /// first value.
    pub fn add_value(&mut self, snr_db: f64, per: f64) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&per) {
            return Err(ConfigError::InvalidPer(per));
        }
        if !(-100.0..=100.0).contains(&snr_db) {
            return Err(ConfigError::InvalidSnr(snr_db));
        }
        let idx = self.points.partition_point(|&(s, _)| s < snr_db);
        if self.points.get(idx).is_some_and(|&(s, _)| s == snr_db) {
            debug!(snr_db, per, "duplicate SNR control point ignored");
            return Ok(());
        }
        self.points.insert(idx, (snr_db, per));
        self.cache = None;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last `(snr_db, per)` answered.
    pub fn cached(&self) -> Option<(f64, f64)> {
        self.cache
    }

    fn lookup(&self, snr_db: f64) -> f64 {
        let idx = self.points.partition_point(|&(s, _)| s < snr_db);
        if let Some(&(s, per)) = self.points.get(idx) {
            if s == snr_db {
                return per;
            }
        }
        if idx == 0 {
            return 1.0;
        }
        if idx == self.points.len() {
            return 0.0;
        }
        let (lo_snr, lo_per) = self.points[idx - 1];
        let (hi_snr, hi_per) = self.points[idx];
        lo_per + (snr_db - lo_snr) / (hi_snr - lo_snr) * (hi_per - lo_per)
    }
}

impl ErrorModel for TableErrorModel {
    fn name(&self) -> &'static str {
        "table"
    }

    fn error_probability(&mut self, snr_db: f64, _bytes: u32) -> f64 {
        if let Some((s, per)) = self.cache {
            if s == snr_db {
                trace!(snr_db, per, "cached PER");
                return per;
            }
        }
        let per = self.lookup(snr_db);
        trace!(snr_db, per, "table PER");
        self.cache = Some((snr_db, per));
        per
    }
}
