//! Feeder configuration.

use serde::{Deserialize, Serialize};

use stakeflow_core::types::Address;

use crate::schedule::ScheduleParams;

/// What a second feed within one schedule month does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedPolicy {
    /// Reject with `AlreadyFed`.
    #[default]
    OncePerMonth,
    /// Succeed without refilling.
    SkipRepeat,
    /// Refill every time.
    Unguarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    /// Reward token held and forwarded by the feeder.
    pub token: Address,
    /// The feeder's own ledger account. It must own the target accumulator.
    pub custody: Address,
    /// Custody account of the accumulator the feeder refills.
    pub target: Address,
    pub schedule: ScheduleParams,
    pub feed_policy: FeedPolicy,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            token: Address::from_label("stakeflow/reward-token"),
            custody: Address::from_label("stakeflow/feeder"),
            target: Address::from_label("stakeflow/accumulator"),
            schedule: ScheduleParams::default(),
            feed_policy: FeedPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_rejects_repeat() {
        assert_eq!(FeederConfig::default().feed_policy, FeedPolicy::OncePerMonth);
    }

    #[test]
    fn defaults_line_up_with_accumulator() {
        let cfg = FeederConfig::default();
        let acc = stakeflow_pools::AccumulatorConfig::default();
        assert_eq!(cfg.token, acc.reward_token);
        assert_eq!(cfg.target, acc.custody);
        assert_ne!(cfg.custody, acc.custody);
    }

    #[test]
    fn policy_from_json() {
        let cfg: FeederConfig = serde_json::from_str(r#"{"feed_policy": "skip_repeat"}"#).unwrap();
        assert_eq!(cfg.feed_policy, FeedPolicy::SkipRepeat);
        assert_eq!(cfg.schedule, ScheduleParams::default());
    }
}
