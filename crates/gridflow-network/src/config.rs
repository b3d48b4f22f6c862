//! Per-medium tier tables.

use std::path::Path;

use gridflow_core::config::{self, ConfigError};
use gridflow_core::topology::Medium;
use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Capacity and pull rate of one tier of one medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    /// Buffer capacity a segment contributes to its network.
    pub capacity: u64,
    /// Maximum amount a `Pull` side drains from an acceptor per tick.
    pub pull_rate: u64,
}

impl TierSpec {
    pub const fn new(capacity: u64, pull_rate: u64) -> Self {
        Self {
            capacity,
            pull_rate,
        }
    }
}

/// The four tiers of one medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediumTiers {
    pub basic: TierSpec,
    pub advanced: TierSpec,
    pub elite: TierSpec,
    pub ultimate: TierSpec,
}

impl MediumTiers {
    pub fn get(&self, tier: Tier) -> TierSpec {
        match tier {
            Tier::Basic => self.basic,
            Tier::Advanced => self.advanced,
            Tier::Elite => self.elite,
            Tier::Ultimate => self.ultimate,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Tier, TierSpec)> + '_ {
        Tier::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

/// Tier tables for every medium.
///
/// Missing sections in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Mechanical pipes.
    pub fluid: MediumTiers,
    /// Pressurized tubes.
    pub chemical: MediumTiers,
    /// Universal cables.
    pub energy: MediumTiers,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fluid: MediumTiers {
                basic: TierSpec::new(2_000, 250),
                advanced: TierSpec::new(8_000, 1_000),
                elite: TierSpec::new(32_000, 8_000),
                ultimate: TierSpec::new(128_000, 32_000),
            },
            chemical: MediumTiers {
                basic: TierSpec::new(4_000, 750),
                advanced: TierSpec::new(16_000, 2_000),
                elite: TierSpec::new(256_000, 64_000),
                ultimate: TierSpec::new(1_024_000, 256_000),
            },
            // Cables pull at their full capacity.
            energy: MediumTiers {
                basic: TierSpec::new(8_000, 8_000),
                advanced: TierSpec::new(128_000, 128_000),
                elite: TierSpec::new(1_024_000, 1_024_000),
                ultimate: TierSpec::new(8_192_000, 8_192_000),
            },
        }
    }
}

impl NetworkConfig {
    pub fn tiers(&self, medium: Medium) -> &MediumTiers {
        match medium {
            Medium::Fluid => &self.fluid,
            Medium::Chemical => &self.chemical,
            Medium::Energy => &self.energy,
        }
    }

    pub fn spec(&self, medium: Medium, tier: Tier) -> TierSpec {
        self.tiers(medium).get(tier)
    }

    /// Load from a RON, TOML or JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: NetworkConfig = config::load_file(path)?;
        config.validate().map_err(|detail| ConfigError::Invalid {
            file: path.to_path_buf(),
            detail,
        })?;
        Ok(config)
    }

    /// Every tier needs a non-zero capacity.
    pub fn validate(&self) -> Result<(), String> {
        for medium in [Medium::Fluid, Medium::Chemical, Medium::Energy] {
            for (tier, spec) in self.tiers(medium).iter() {
                if spec.capacity == 0 {
                    return Err(format!("{medium:?} {tier:?} has zero capacity"));
                }
            }
        }
        Ok(())
    }
}
