//! 场景配置
//!
//! 驱动程序通过 `--config <json>` 读入的场景描述；所有字段都有默认值，
//! 空对象 `{}` 即默认场景。

use crate::error::ConfigError;
use crate::error_model::{ErrorModel, ErrorModelSpec};
use crate::net::{ChannelId, DeviceConfig, WirelessNetwork};
use crate::propagation::{ConstantSpeedDelay, LossSpec};
use crate::rng::DEFAULT_SEED;
use serde::{Deserialize, Serialize};

pub const SCENARIO_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    pub seed: u64,
    pub device: DeviceConfig,
    pub channel: ChannelSpec,
    pub error_model: Option<ErrorModelSpec>,
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        Self {
            schema_version: SCENARIO_SCHEMA_VERSION,
            seed: DEFAULT_SEED,
            device: DeviceConfig::default(),
            channel: ChannelSpec::default(),
            error_model: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSpec {
    /// 损耗链，按顺序生效
    pub losses: Vec<LossSpec>,
    /// 设置后启用恒速传播时延
    pub propagation_speed_mps: Option<f64>,
}

impl ScenarioSpec {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// 按配置创建信道（损耗链 + 可选传播时延）
    pub fn build_channel(&self, net: &mut WirelessNetwork) -> Result<ChannelId, ConfigError> {
        let ch = net.add_channel();
        self.apply_channel(net, ch)?;
        Ok(ch)
    }

    /// 把损耗链与传播时延装到已有信道上；任何一个损耗环节非法时信道保持不变
    pub fn apply_channel(&self, net: &mut WirelessNetwork, ch: ChannelId) -> Result<(), ConfigError> {
        let losses = self
            .channel
            .losses
            .iter()
            .map(LossSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        for loss in losses {
            net.add_loss_model(ch, loss);
        }
        if let Some(speed_mps) = self.channel.propagation_speed_mps {
            net.set_propagation_delay(ch, Some(ConstantSpeedDelay { speed_mps }));
        }
        Ok(())
    }

    pub fn build_error_model(&self) -> Result<Option<Box<dyn ErrorModel>>, ConfigError> {
        self.error_model.as_ref().map(ErrorModelSpec::build).transpose()
    }
}
