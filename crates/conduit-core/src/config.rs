//! Static transfer-rate configuration.
//!
//! Read once at startup and never mutated during simulation. Each network
//! type has its own per-tier rate table; the rate for a network is the
//! per-service budget of every endpoint it services.

use serde::{Deserialize, Serialize};

use crate::id::{NetworkType, Tier};

/// Errors raised while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{network:?} rate for {tier:?} must be nonzero")]
    ZeroRate { network: NetworkType, tier: Tier },
    #[error("{network:?} rate for {tier:?} ({rate}) must exceed the previous tier ({previous})")]
    NonIncreasingRate {
        network: NetworkType,
        tier: Tier,
        rate: u64,
        previous: u64,
    },
}

/// Maximum units moved per endpoint service, by pipe tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRates {
    pub mk1: u64,
    pub mk2: u64,
    pub mk3: u64,
    pub mk4: u64,
}

impl TierRates {
    pub fn new(mk1: u64, mk2: u64, mk3: u64, mk4: u64) -> Self {
        Self { mk1, mk2, mk3, mk4 }
    }

    pub fn rate(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Mk1 => self.mk1,
            Tier::Mk2 => self.mk2,
            Tier::Mk3 => self.mk3,
            Tier::Mk4 => self.mk4,
        }
    }

    fn validate(&self, network: NetworkType) -> Result<(), ConfigError> {
        let mut previous: Option<u64> = None;
        for tier in Tier::all() {
            let rate = self.rate(tier);
            if rate == 0 {
                return Err(ConfigError::ZeroRate { network, tier });
            }
            if let Some(previous) = previous
                && rate <= previous
            {
                return Err(ConfigError::NonIncreasingRate {
                    network,
                    tier,
                    rate,
                    previous,
                });
            }
            previous = Some(rate);
        }
        Ok(())
    }
}

/// Rate tables for every network type plus the routing RNG seed.
///
/// Missing fields fall back to [`TransferConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub energy: TierRates,
    pub fluid: TierRates,
    pub item: TierRates,
    /// Seed for the random routing mode.
    pub seed: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            energy: TierRates::new(128, 512, 2048, 8192),
            fluid: TierRates::new(1000, 2500, 5000, 10000),
            item: TierRates::new(64, 128, 256, 512),
            seed: 0,
        }
    }
}

impl TransferConfig {
    pub fn rates(&self, network: NetworkType) -> &TierRates {
        match network {
            NetworkType::Energy => &self.energy,
            NetworkType::Fluid => &self.fluid,
            NetworkType::Item => &self.item,
        }
    }

    /// Per-service budget for a network of the given type and tier.
    pub fn max_transfer(&self, network: NetworkType, tier: Tier) -> u64 {
        self.rates(network).rate(tier)
    }

    /// Check that every table is nonzero and strictly increasing with tier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for network in NetworkType::all() {
            self.rates(network).validate(network)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(TransferConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rate_lookup_by_tier() {
        let config = TransferConfig::default();
        assert_eq!(config.max_transfer(NetworkType::Item, Tier::Mk1), 64);
        assert_eq!(config.max_transfer(NetworkType::Item, Tier::Mk4), 512);
        assert_eq!(config.max_transfer(NetworkType::Fluid, Tier::Mk2), 2500);
    }

    #[test]
    fn flat_rates_are_rejected() {
        let mut config = TransferConfig::default();
        config.fluid = TierRates::new(100, 200, 200, 400);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonIncreasingRate {
                network: NetworkType::Fluid,
                tier: Tier::Mk3,
                rate: 200,
                previous: 200,
            })
        );
    }

    #[test]
    fn zero_rate_is_rejected() {
        let mut config = TransferConfig::default();
        config.energy = TierRates::new(0, 1, 2, 3);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroRate {
                network: NetworkType::Energy,
                tier: Tier::Mk1,
            })
        );
    }

    #[test]
    fn seed_defaults_when_missing() {
        let json = r#"{
            "energy": {"mk1": 1, "mk2": 2, "mk3": 3, "mk4": 4},
            "fluid": {"mk1": 1, "mk2": 2, "mk3": 3, "mk4": 4},
            "item": {"mk1": 1, "mk2": 2, "mk3": 3, "mk4": 4}
        }"#;
        let config: TransferConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 0);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn missing_tables_use_defaults() {
        let config: TransferConfig =
            serde_json::from_str(r#"{"item": {"mk1": 8, "mk2": 16, "mk3": 32, "mk4": 64}, "seed": 9}"#)
                .unwrap();
        assert_eq!(config.item.mk1, 8);
        assert_eq!(config.fluid, TransferConfig::default().fluid);
        assert_eq!(config.seed, 9);
    }
}
