//! Accumulator configuration.
//!
//! Provides [`AccumulatorConfig`] with defaults for the reward token, custody
//! account, epoch length and the weight-change settlement policy. Configs
//! deserialize from JSON with every field optional.

use serde::{Deserialize, Serialize};

use stakeflow_core::constants::{DEFAULT_REWARDS_DURATION, SECONDS_PER_DAY};
use stakeflow_core::error::StakingError;
use stakeflow_core::types::Address;

/// Whether pool registration and weight changes settle every pool first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUpdatePolicy {
    /// Settle all pools at the old weights before applying the change.
    #[default]
    SettleAll,
    /// Apply the change immediately; unsettled time is priced at the new
    /// weights when each pool is next touched.
    Deferred,
}

/// Configuration for a [`RewardAccumulator`](crate::RewardAccumulator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Token paid out as reward.
    pub reward_token: Address,
    /// Ledger account holding staked and reward tokens.
    pub custody: Address,
    /// Length of one refill epoch in seconds.
    pub rewards_duration: u64,
    pub weight_update_policy: WeightUpdatePolicy,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            reward_token: Address::from_label("stakeflow/reward-token"),
            custody: Address::from_label("stakeflow/accumulator"),
            rewards_duration: DEFAULT_REWARDS_DURATION,
            weight_update_policy: WeightUpdatePolicy::default(),
        }
    }
}

impl AccumulatorConfig {
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.rewards_duration == 0 {
            return Err(StakingError::ZeroDuration);
        }
        Ok(())
    }

    /// Epoch length in whole days.
    pub fn duration_days(&self) -> u64 {
        self.rewards_duration / SECONDS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_duration_is_thirty_days() {
        let cfg = AccumulatorConfig::default();
        assert_eq!(cfg.rewards_duration, DEFAULT_REWARDS_DURATION);
        assert_eq!(cfg.duration_days(), 30);
    }

    #[test]
    fn default_policy_settles_all() {
        assert_eq!(
            AccumulatorConfig::default().weight_update_policy,
            WeightUpdatePolicy::SettleAll
        );
    }

    #[test]
    fn default_accounts_are_distinct() {
        let cfg = AccumulatorConfig::default();
        assert_ne!(cfg.reward_token, cfg.custody);
        assert!(!cfg.custody.is_zero());
    }

    #[test]
    fn zero_duration_is_invalid() {
        let cfg = AccumulatorConfig {
            rewards_duration: 0,
            ..AccumulatorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(StakingError::ZeroDuration));
        assert!(AccumulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: AccumulatorConfig =
            serde_json::from_str(r#"{"rewards_duration": 600, "weight_update_policy": "deferred"}"#)
                .unwrap();
        assert_eq!(cfg.rewards_duration, 600);
        assert_eq!(cfg.weight_update_policy, WeightUpdatePolicy::Deferred);
        assert_eq!(cfg.custody, AccumulatorConfig::default().custody);
    }

    #[test]
    fn config_is_clone_and_debug() {
        let cfg = AccumulatorConfig::default();
        let cfg2 = cfg.clone();
        assert!(format!("{cfg2:?}").contains("AccumulatorConfig"));
    }
}
