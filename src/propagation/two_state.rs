//! Two-state (Gilbert-Elliott style) channel.
//!
//! The channel alternates between GOOD and BAD with exponentially distributed
//! dwell times. While in a state every transmission attempt is lost with that
//! state's fixed probability, regardless of distance or SNR. State changes are
//! driven by the scheduler through [`PropagationLoss::on_timer`]; nothing polls.

use std::any::Any;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NO_SIGNAL_DBM, Position, PropagationLoss};
use crate::error::ConfigError;
use crate::rng::RngStream;
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoStateConfig {
    /// Loss probability per attempt in GOOD
    pub per_good: f64,
    /// Loss probability per attempt in BAD
    pub per_bad: f64,
    /// Mean GOOD dwell (seconds)
    pub mean_good_s: f64,
    /// Mean BAD dwell (seconds)
    pub mean_bad_s: f64,
}

impl Default for TwoStateConfig {
    fn default() -> Self {
        Self {
            per_good: 0.001,
            per_bad: 0.01,
            mean_good_s: 10.0,
            mean_bad_s: 10.0,
        }
    }
}

impl TwoStateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (what, value) in [("per_good", self.per_good), ("per_bad", self.per_bad)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { what, value });
            }
        }
        for (what, value) in [
            ("mean_good_s", self.mean_good_s),
            ("mean_bad_s", self.mean_bad_s),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidMean { what, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TwoStateLoss {
    cfg: TwoStateConfig,
    state: ChannelState,
    entered_at: SimTime,
    time_good: SimTime,
    time_bad: SimTime,
    switches: u64,
    good_dwell: RngStream,
    bad_dwell: RngStream,
    good_draw: RngStream,
    bad_draw: RngStream,
}

impl TwoStateLoss {
    pub fn new(cfg: TwoStateConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut me = Self {
            cfg,
            state: ChannelState::Good,
            entered_at: SimTime::ZERO,
            time_good: SimTime::ZERO,
            time_bad: SimTime::ZERO,
            switches: 0,
            good_dwell: RngStream::default(),
            bad_dwell: RngStream::default(),
            good_draw: RngStream::default(),
            bad_draw: RngStream::default(),
        };
        me.assign_streams(crate::rng::DEFAULT_SEED, 0);
        Ok(me)
    }

    pub fn config(&self) -> &TwoStateConfig {
        &self.cfg
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn switches(&self) -> u64 {
        self.switches
    }

    /// Seconds spent in (GOOD, BAD) up to `now`, counting the open interval.
    pub fn occupancy(&self, now: SimTime) -> (f64, f64) {
        let open = now.saturating_since(self.entered_at);
        let (mut good, mut bad) = (self.time_good, self.time_bad);
        match self.state {
            ChannelState::Good => good = SimTime(good.0.saturating_add(open.0)),
            ChannelState::Bad => bad = SimTime(bad.0.saturating_add(open.0)),
        }
        (good.as_secs_f64(), bad.as_secs_f64())
    }

    fn loss_probability(&self) -> f64 {
        match self.state {
            ChannelState::Good => self.cfg.per_good,
            ChannelState::Bad => self.cfg.per_bad,
        }
    }

    fn sample_dwell(&mut self) -> SimTime {
        let secs = match self.state {
            ChannelState::Good => self.good_dwell.exponential(self.cfg.mean_good_s),
            ChannelState::Bad => self.bad_dwell.exponential(self.cfg.mean_bad_s),
        };
        // 不允许零时长，否则切换链会卡在同一时刻
        SimTime::from_secs_f64(secs).max(SimTime(1))
    }
}

impl PropagationLoss for TwoStateLoss {
    fn name(&self) -> &'static str {
        "two_state"
    }

    fn calc_rx_power(&mut self, tx_power_dbm: f64, _a: &Position, _b: &Position) -> f64 {
        let draw = match self.state {
            ChannelState::Good => self.good_draw.uniform(),
            ChannelState::Bad => self.bad_draw.uniform(),
        };
        if draw > self.loss_probability() {
            tx_power_dbm
        } else {
            NO_SIGNAL_DBM
        }
    }

    fn start(&mut self, now: SimTime) -> Option<SimTime> {
        self.state = ChannelState::Good;
        self.entered_at = now;
        let next = self.sample_dwell();
        debug!(next_switch_in = ?next, "two-state channel started in GOOD");
        Some(next)
    }

    fn on_timer(&mut self, now: SimTime) -> Option<SimTime> {
        let dwelt = now.saturating_since(self.entered_at);
        self.state = match self.state {
            ChannelState::Good => {
                self.time_good = SimTime(self.time_good.0.saturating_add(dwelt.0));
                ChannelState::Bad
            }
            ChannelState::Bad => {
                self.time_bad = SimTime(self.time_bad.0.saturating_add(dwelt.0));
                ChannelState::Good
            }
        };
        self.entered_at = now;
        self.switches = self.switches.saturating_add(1);
        let next = self.sample_dwell();
        debug!(state = ?self.state, next_switch_in = ?next, "two-state channel switched");
        Some(next)
    }

    fn assign_streams(&mut self, seed: u64, first_stream: u64) -> u64 {
        self.good_dwell.set_stream(seed, first_stream);
        self.bad_dwell.set_stream(seed, first_stream + 1);
        self.good_draw.set_stream(seed, first_stream + 2);
        self.bad_draw.set_stream(seed, first_stream + 3);
        4
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
