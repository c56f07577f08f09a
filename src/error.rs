//! Configuration errors.
//!
//! Runtime outcomes (PHY drops, collisions, queue overflow) are modeled events
//! reported through [`crate::trace`]; only operator/programmer mistakes land here.

use thiserror::Error;

use crate::net::{ChannelId, DeviceId, NodeId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("illegal PER value {0} (must be within [0, 1])")]
    InvalidPer(f64),

    #[error("illegal SNR value {0} dB (must be within [-100, 100])")]
    InvalidSnr(f64),

    #[error("illegal probability {value} for {what} (must be within [0, 1])")]
    InvalidProbability { what: &'static str, value: f64 },

    #[error("illegal mean dwell time {value}s for {what} (must be > 0)")]
    InvalidMean { what: &'static str, value: f64 },

    #[error("invalid data rate {0:?}")]
    InvalidDataRate(String),

    #[error("invalid MAC address {0:?}")]
    InvalidAddress(String),

    #[error("device {device:?} has no directional neighbor for node {node:?}")]
    UnknownNeighbor { device: DeviceId, node: NodeId },

    #[error("device {device:?} is already attached to channel {channel:?}")]
    AlreadyAttached { device: DeviceId, channel: ChannelId },

    #[error("device {0:?} is not attached to a channel")]
    NotAttached(DeviceId),
}
