//! Link data rate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataRate(pub u64);

impl DataRate {
    pub fn bps(self) -> u64 {
        self.0
    }

    /// Serialization time of `bytes`: ceil(bits * 1e9 / bps) nanoseconds.
    pub fn tx_time(self, bytes: u32) -> SimTime {
        if self.0 == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.0 as u128 - 1)) / self.0 as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// Accepts `"10Mbps"`, `"100kbps"`, `"1Gbps"`, `"81920bps"` or a bare bps count.
/// Unit prefixes are decimal, matching how link rates are usually quoted.
impl FromStr for DataRate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidDataRate(s.to_string());
        let t = s.trim();
        let lower = t.to_ascii_lowercase();
        let (num, mult) = if let Some(n) = lower.strip_suffix("gbps") {
            (n, 1e9)
        } else if let Some(n) = lower.strip_suffix("mbps") {
            (n, 1e6)
        } else if let Some(n) = lower.strip_suffix("kbps") {
            (n, 1e3)
        } else if let Some(n) = lower.strip_suffix("bps") {
            (n, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };
        let value: f64 = num.trim().parse().map_err(|_| invalid())?;
        let bps = value * mult;
        if !bps.is_finite() || bps <= 0.0 {
            return Err(invalid());
        }
        Ok(DataRate(bps.round() as u64))
    }
}
