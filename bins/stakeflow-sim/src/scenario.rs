//! Scripted replay of a staking scenario on an in-memory ledger.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use stakeflow_core::constants::{SECONDS_PER_DAY, SECONDS_PER_MONTH, TOKEN_UNIT};
use stakeflow_core::ledger::MemoryLedger;
use stakeflow_core::traits::TokenLedger;
use stakeflow_core::types::{Address, Amount, CallContext, Pool, PoolId, StakingEvent, Timestamp};
use stakeflow_feeder::{FeederConfig, RewardFeeder};
use stakeflow_pools::{AccumulatorConfig, RewardAccumulator};

/// One staker's initial deposit. `amount` is in whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEntry {
    pub account: String,
    pub pool_id: PoolId,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub start: Timestamp,
    pub accumulator: AccumulatorConfig,
    /// One pool per entry, in registration order.
    pub weights: Vec<u64>,
    pub stakes: Vec<StakeEntry>,
    /// Whole tokens refilled by the owner at `start`, or funded into the
    /// feeder when `feed_months > 0`.
    pub refill: u128,
    pub elapsed_days: u64,
    /// Hand the accumulator to a feeder and feed this many months.
    pub feed_months: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            start: 1_700_000_000,
            accumulator: AccumulatorConfig::default(),
            weights: vec![1, 2],
            stakes: vec![StakeEntry {
                account: "alice".into(),
                pool_id: 0,
                amount: 100,
            }],
            refill: 2_000,
            elapsed_days: 10,
            feed_months: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub pool_id: PoolId,
    #[serde(flatten)]
    pub pool: Pool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub account: String,
    pub address: Address,
    pub pool_id: PoolId,
    pub staked: Amount,
    pub pending_reward: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeederReport {
    pub total_fed: Amount,
    pub last_fed_month: Option<u64>,
    pub custody_balance: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub now: Timestamp,
    pub reward_rate: u128,
    pub period_finish: Timestamp,
    pub total_alloc_point: u64,
    pub total_rewards_deposited: Amount,
    pub pools: Vec<PoolReport>,
    pub users: Vec<UserReport>,
    pub feeder: Option<FeederReport>,
    pub events: Vec<StakingEvent>,
}

fn whole(tokens: u128) -> Result<Amount> {
    tokens
        .checked_mul(TOKEN_UNIT)
        .with_context(|| format!("{tokens} tokens overflow base units"))
}

/// Run `config` to completion and report the resulting state.
pub fn run(config: &ScenarioConfig) -> Result<ScenarioReport> {
    let start = config.start;
    let end = start
        .checked_add(config.elapsed_days.saturating_mul(SECONDS_PER_DAY))
        .context("scenario end overflows")?;
    let owner = Address::from_label("scenario/owner");

    let mut ledger = MemoryLedger::new();
    let mut chef = RewardAccumulator::new(config.accumulator.clone(), owner, start)
        .context("invalid accumulator config")?;
    let custody = chef.custody();

    for (i, weight) in config.weights.iter().enumerate() {
        let token = Address::from_label(&format!("scenario/stake-{i}"));
        chef.register_pool(CallContext::new(owner, start), *weight, token)
            .with_context(|| format!("registering pool {i}"))?;
    }

    for stake in &config.stakes {
        let account = Address::from_label(&stake.account);
        let token = chef
            .pool(stake.pool_id)
            .with_context(|| format!("stake for {}", stake.account))?
            .stake_token;
        let amount = whole(stake.amount)?;
        ledger.mint(&token, &account, amount);
        ledger.approve(&token, &account, &custody, amount);
        chef.deposit(&mut ledger, CallContext::new(account, start), stake.pool_id, amount)
            .with_context(|| format!("deposit by {}", stake.account))?;
    }

    let budget = whole(config.refill)?;
    let mut feeder = None;
    if config.feed_months == 0 {
        ledger.mint(&chef.reward_token(), &owner, budget);
        ledger.approve(&chef.reward_token(), &owner, &custody, budget);
        chef.refill(&mut ledger, CallContext::new(owner, start), budget)
            .context("owner refill")?;
    } else {
        let feeder_config = FeederConfig {
            token: chef.reward_token(),
            target: custody,
            ..FeederConfig::default()
        };
        let mut f = RewardFeeder::new(feeder_config, owner)?;
        chef.transfer_ownership(CallContext::new(owner, start), f.address())?;
        ledger.mint(&f.token(), &f.address(), budget);

        for month in 0..config.feed_months {
            let at = start.saturating_add(month.saturating_mul(SECONDS_PER_MONTH));
            if at > end {
                break;
            }
            f.feed_rewards(&mut ledger, &mut chef, CallContext::new(owner, at))
                .with_context(|| format!("feed {month}"))?;
        }
        feeder = Some(f);
    }

    chef.mass_update_pools(end)?;

    let users = config
        .stakes
        .iter()
        .map(|stake| -> Result<UserReport> {
            let address = Address::from_label(&stake.account);
            let position = chef.user_position(stake.pool_id, &address).unwrap_or_default();
            Ok(UserReport {
                account: stake.account.clone(),
                address,
                pool_id: stake.pool_id,
                staked: position.amount,
                pending_reward: chef.pending_reward(stake.pool_id, &address, end)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let pools = chef
        .registry()
        .iter()
        .map(|(pool_id, pool)| PoolReport {
            pool_id,
            pool: pool.clone(),
        })
        .collect();

    let mut events = chef.drain_events();
    let feeder = feeder.map(|mut f| {
        events.extend(f.drain_events());
        FeederReport {
            total_fed: f.total_fed(),
            last_fed_month: f.last_fed_month(),
            custody_balance: f.custody_balance(&ledger),
        }
    });

    info!(
        pools = chef.pool_count(),
        stakers = users.len(),
        reward_in_custody = ledger.balance_of(&chef.reward_token(), &custody),
        "scenario finished"
    );

    Ok(ScenarioReport {
        now: end,
        reward_rate: chef.reward_rate(),
        period_finish: chef.period_finish(),
        total_alloc_point: chef.total_alloc_point(),
        total_rewards_deposited: chef.total_rewards_deposited(),
        pools,
        users,
        feeder,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_pays_a_third() {
        let report = run(&ScenarioConfig::default()).unwrap();
        assert_eq!(report.total_alloc_point, 3);
        assert_eq!(report.pools.len(), 2);

        let alice = &report.users[0];
        let expected = 2_000 * TOKEN_UNIT * 10 / 30 / 3;
        assert!(alice.pending_reward.abs_diff(expected) < TOKEN_UNIT / 1_000);

        let empty = &report.pools[1].pool;
        assert!(empty.acc_undistributed_reward.abs_diff(expected * 2) < TOKEN_UNIT / 1_000);
        assert!(report.feeder.is_none());
    }

    #[test]
    fn feeder_scenario_feeds_each_month() {
        let config = ScenarioConfig {
            refill: 1_000_000,
            elapsed_days: 70,
            feed_months: 3,
            ..ScenarioConfig::default()
        };
        let report = run(&config).unwrap();
        let feeder = report.feeder.unwrap();
        assert!(feeder.total_fed > 0);
        assert!(feeder.last_fed_month.is_some());
        assert_eq!(report.total_rewards_deposited, feeder.total_fed);
        let fed = report
            .events
            .iter()
            .filter(|e| matches!(e, StakingEvent::RewardsFed { .. }))
            .count();
        assert_eq!(fed, 3);
    }

    #[test]
    fn stake_into_missing_pool_fails() {
        let config = ScenarioConfig {
            stakes: vec![StakeEntry {
                account: "mallory".into(),
                pool_id: 7,
                amount: 1,
            }],
            ..ScenarioConfig::default()
        };
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("mallory"));
    }

    #[test]
    fn config_from_partial_json() {
        let config: ScenarioConfig =
            serde_json::from_str(r#"{"weights": [5], "stakes": [], "elapsed_days": 1}"#).unwrap();
        assert_eq!(config.weights, vec![5]);
        assert_eq!(config.refill, 2_000);
        let report = run(&config).unwrap();
        assert!(report.users.is_empty());
        assert_eq!(report.total_alloc_point, 5);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = run(&ScenarioConfig::default()).unwrap();
        let text = serde_json::to_string(&report).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["pools"][0]["acc_reward_per_share"].is_number());
        assert_eq!(json["events"][0]["event"], "pool_added");
    }
}
