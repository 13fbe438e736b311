//! Reward accumulator: global emission rate, per-pool accumulators and the
//! per-user stake/debt ledger.
//!
//! Pools are settled lazily. Every user action touches exactly one pool, so
//! its cost does not depend on how many pools or users exist; only refills
//! and weight changes walk all pools.
//!
//! Each mutating operation stages the new pool and position values, commits
//! them, then executes its transfer batch against the [`TokenLedger`]. If the
//! batch fails the snapshot is restored, so callers observe all-or-nothing
//! behaviour. Operations that only pull tokens in (refill) transfer first and
//! commit afterwards.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use stakeflow_core::error::{MathError, StakingError};
use stakeflow_core::math::{checked_add, checked_mul, checked_sub, from_scaled, mul_div, scaled_share, to_scaled};
use stakeflow_core::traits::TokenLedger;
use stakeflow_core::types::{
    Address, Amount, CallContext, Pool, PoolId, StakingEvent, Timestamp, TokenRole, Transfer,
    UserPosition,
};

use crate::config::{AccumulatorConfig, WeightUpdatePolicy};
use crate::registry::PoolRegistry;

/// Global accrual parameters in force at one instant.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    reward_rate: u128,
    period_finish: Timestamp,
    total_alloc_point: u64,
}

/// Bring `pool` current to `now` without touching the original.
///
/// Reward accrues only up to `period_finish`; `last_update_time` still moves
/// to `now` so an expired epoch is never priced twice.
fn settled(pool: &Pool, window: RateWindow, now: Timestamp) -> Result<Pool, MathError> {
    let mut next = pool.clone();
    let applicable = now.min(window.period_finish);
    let elapsed = applicable.saturating_sub(pool.last_update_time);

    if elapsed > 0 && window.reward_rate > 0 && window.total_alloc_point > 0 {
        // elapsed * rate * alloc / total, multiplied before dividing.
        let emitted = checked_mul(elapsed as u128, window.reward_rate)?;
        let pool_reward = mul_div(
            emitted,
            pool.alloc_point as u128,
            window.total_alloc_point as u128,
        )?;

        if pool.total_staked == 0 {
            next.acc_undistributed_reward =
                checked_add(next.acc_undistributed_reward, from_scaled(pool_reward))?;
        } else {
            next.acc_reward_per_share =
                checked_add(next.acc_reward_per_share, pool_reward / pool.total_staked)?;
        }
    }

    next.last_update_time = pool.last_update_time.max(now);
    Ok(next)
}

/// Reward owed to `position` against an already-settled pool.
fn owed(pool: &Pool, position: &UserPosition) -> Result<Amount, MathError> {
    Ok(scaled_share(pool.acc_reward_per_share, position.amount)?.saturating_sub(position.reward_debt))
}

/// Multi-pool staking rewards engine.
#[derive(Debug, Clone)]
pub struct RewardAccumulator {
    config: AccumulatorConfig,
    owner: Address,
    registry: PoolRegistry,
    positions: HashMap<(PoolId, Address), UserPosition>,
    /// Reward units per second, multiplied by `SCALE`.
    reward_rate: u128,
    period_finish: Timestamp,
    total_rewards_deposited: Amount,
    deployed_at: Timestamp,
    /// Latest timestamp accepted by a mutating call.
    last_timestamp: Timestamp,
    events: Vec<StakingEvent>,
}

impl RewardAccumulator {
    /// Create an idle accumulator whose first epoch ends one duration from `now`.
    pub fn new(config: AccumulatorConfig, owner: Address, now: Timestamp) -> Result<Self, StakingError> {
        config.validate()?;
        let period_finish = now
            .checked_add(config.rewards_duration)
            .ok_or(MathError::Overflow)?;

        info!(
            owner = %owner,
            reward_token = %config.reward_token,
            rewards_duration = config.rewards_duration,
            "reward accumulator created"
        );

        Ok(Self {
            config,
            owner,
            registry: PoolRegistry::new(),
            positions: HashMap::new(),
            reward_rate: 0,
            period_finish,
            total_rewards_deposited: 0,
            deployed_at: now,
            last_timestamp: now,
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    fn ensure_owner(&self, caller: &Address) -> Result<(), StakingError> {
        if *caller != self.owner {
            return Err(StakingError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn check_clock(&self, now: Timestamp) -> Result<(), StakingError> {
        if now < self.last_timestamp {
            return Err(StakingError::StaleTimestamp {
                now,
                last: self.last_timestamp,
            });
        }
        Ok(())
    }

    fn advance_clock(&mut self, now: Timestamp) {
        self.last_timestamp = self.last_timestamp.max(now);
    }

    fn window(&self) -> RateWindow {
        RateWindow {
            reward_rate: self.reward_rate,
            period_finish: self.period_finish,
            total_alloc_point: self.registry.total_alloc_point(),
        }
    }

    fn emit(&mut self, event: StakingEvent) {
        self.events.push(event);
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    /// Every pool settled to `now` at the current rate, not yet committed.
    fn staged_settlement(&self, now: Timestamp) -> Result<Vec<Pool>, MathError> {
        let window = self.window();
        self.registry
            .pools()
            .iter()
            .map(|pool| settled(pool, window, now))
            .collect()
    }

    /// Write staged accrual state back. Weights and stake totals in the
    /// registry are left alone, so a weight change applied after staging
    /// survives the commit.
    fn commit_pools(&mut self, staged: Vec<Pool>) {
        for (slot, pool) in self.registry.pools_mut().iter_mut().zip(staged) {
            slot.last_update_time = pool.last_update_time;
            slot.acc_reward_per_share = pool.acc_reward_per_share;
            slot.acc_undistributed_reward = pool.acc_undistributed_reward;
        }
    }

    fn settle_pool(&mut self, pool_id: PoolId, now: Timestamp) -> Result<(), StakingError> {
        let next = settled(self.registry.pool(pool_id)?, self.window(), now)?;
        if let Some(slot) = self.registry.get_mut(pool_id) {
            *slot = next;
        }
        Ok(())
    }

    /// Settle one pool up to `now`. Anyone may call this.
    pub fn update_pool(&mut self, pool_id: PoolId, now: Timestamp) -> Result<(), StakingError> {
        self.check_clock(now)?;
        self.settle_pool(pool_id, now)?;
        self.advance_clock(now);
        debug!(pool_id, now, "pool settled");
        Ok(())
    }

    /// Settle every pool up to `now`. Anyone may call this.
    pub fn mass_update_pools(&mut self, now: Timestamp) -> Result<(), StakingError> {
        self.check_clock(now)?;
        let staged = self.staged_settlement(now)?;
        self.commit_pools(staged);
        self.advance_clock(now);
        debug!(pools = self.registry.len(), now, "all pools settled");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Owner operations
    // ------------------------------------------------------------------

    /// Register a pool for `stake_token` with weight `alloc_point`.
    pub fn register_pool(
        &mut self,
        ctx: CallContext,
        alloc_point: u64,
        stake_token: Address,
    ) -> Result<PoolId, StakingError> {
        self.ensure_owner(&ctx.caller)?;
        self.check_clock(ctx.now)?;

        let staged = match self.config.weight_update_policy {
            WeightUpdatePolicy::SettleAll => Some(self.staged_settlement(ctx.now)?),
            WeightUpdatePolicy::Deferred => None,
        };
        let pool_id = self.registry.register(alloc_point, stake_token, ctx.now)?;
        if let Some(staged) = staged {
            self.commit_pools(staged);
        }
        self.advance_clock(ctx.now);

        info!(pool_id, stake_token = %stake_token, alloc_point, "pool added");
        self.emit(StakingEvent::PoolAdded {
            pool_id,
            stake_token,
            alloc_point,
        });
        Ok(pool_id)
    }

    /// Change a pool's weight.
    pub fn set_weight(
        &mut self,
        ctx: CallContext,
        pool_id: PoolId,
        alloc_point: u64,
    ) -> Result<(), StakingError> {
        self.ensure_owner(&ctx.caller)?;
        self.check_clock(ctx.now)?;

        let staged = match self.config.weight_update_policy {
            WeightUpdatePolicy::SettleAll => Some(self.staged_settlement(ctx.now)?),
            WeightUpdatePolicy::Deferred => None,
        };
        let previous = self.registry.set_weight(pool_id, alloc_point)?;
        if let Some(staged) = staged {
            self.commit_pools(staged);
        }
        self.advance_clock(ctx.now);

        info!(pool_id, previous, alloc_point, "pool weight set");
        self.emit(StakingEvent::PoolWeightSet {
            pool_id,
            alloc_point,
        });
        Ok(())
    }

    /// Pull `amount` of reward token from the caller and restart the epoch.
    ///
    /// Elapsed time is priced at the old rate first; whatever the running
    /// epoch had not yet emitted rolls into the new rate.
    ///
    /// The scaled budget `amount * SCALE` plus the carried remainder must fit
    /// in a `u128`, which caps one epoch at about `3.4e26` base units
    /// (340 million tokens at 18 decimals). Larger refills fail with
    /// [`MathError::Overflow`] before any token moves.
    pub fn refill(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        amount: Amount,
    ) -> Result<(), StakingError> {
        self.ensure_owner(&ctx.caller)?;
        if amount == 0 {
            return Err(StakingError::ZeroRefill);
        }
        self.check_clock(ctx.now)?;

        let now = ctx.now;
        let staged = self.staged_settlement(now)?;

        let leftover = if now < self.period_finish {
            checked_mul((self.period_finish - now) as u128, self.reward_rate)?
        } else {
            0
        };
        let total_scaled = checked_add(to_scaled(amount)?, leftover)?;
        let reward_rate = total_scaled / self.config.rewards_duration as u128;
        let period_finish = now
            .checked_add(self.config.rewards_duration)
            .ok_or(MathError::Overflow)?;
        let total_rewards_deposited = checked_add(self.total_rewards_deposited, amount)?;

        ledger.transfer(Transfer::pull(
            self.config.reward_token,
            ctx.caller,
            self.config.custody,
            amount,
        ))?;

        self.commit_pools(staged);
        self.reward_rate = reward_rate;
        self.period_finish = period_finish;
        self.total_rewards_deposited = total_rewards_deposited;
        self.advance_clock(now);

        info!(amount, leftover_scaled = leftover, reward_rate, period_finish, "rewards refilled");
        self.emit(StakingEvent::RewardAdded {
            amount,
            reward_rate,
            period_finish,
        });
        Ok(())
    }

    /// Send `amount` of a token that is neither the reward token nor any
    /// pool's stake token from custody to the owner.
    pub fn withdraw_stuck_tokens(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        token: Address,
        amount: Amount,
    ) -> Result<(), StakingError> {
        self.ensure_owner(&ctx.caller)?;
        if token == self.config.reward_token {
            return Err(StakingError::ProtectedToken {
                token,
                role: TokenRole::Reward,
            });
        }
        if self.registry.contains_token(&token) {
            return Err(StakingError::ProtectedToken {
                token,
                role: TokenRole::Stake,
            });
        }

        ledger.transfer(Transfer::push(token, self.config.custody, self.owner, amount))?;

        info!(token = %token, amount, "stuck tokens withdrawn");
        self.emit(StakingEvent::StuckTokensWithdrawn { token, amount });
        Ok(())
    }

    pub fn transfer_ownership(&mut self, ctx: CallContext, new_owner: Address) -> Result<(), StakingError> {
        self.ensure_owner(&ctx.caller)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        info!(previous = %previous, new = %new_owner, "ownership transferred");
        self.emit(StakingEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // User operations
    // ------------------------------------------------------------------

    /// Commit a staged pool and position, then run `transfers`.
    ///
    /// Restores both snapshots if the ledger rejects the batch.
    fn apply_position_change(
        &mut self,
        ledger: &mut dyn TokenLedger,
        pool_id: PoolId,
        account: Address,
        pool: Pool,
        position: UserPosition,
        transfers: &[Transfer],
    ) -> Result<(), StakingError> {
        let key = (pool_id, account);
        let Some(slot) = self.registry.get_mut(pool_id) else {
            return Err(StakingError::UnknownPool(pool_id));
        };
        let previous_pool = std::mem::replace(slot, pool);
        let previous_position = self.positions.insert(key, position);

        if let Err(e) = ledger.execute(transfers) {
            if let Some(slot) = self.registry.get_mut(pool_id) {
                *slot = previous_pool;
            }
            match previous_position {
                Some(p) => self.positions.insert(key, p),
                None => self.positions.remove(&key),
            };
            return Err(e.into());
        }
        Ok(())
    }

    /// Stake `amount` into a pool, paying out any pending reward first.
    ///
    /// `amount` may be zero to claim without adding stake. Returns the
    /// reward paid.
    pub fn deposit(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        pool_id: PoolId,
        amount: Amount,
    ) -> Result<Amount, StakingError> {
        self.check_clock(ctx.now)?;
        let pool = self.registry.pool(pool_id)?;
        let stake_token = pool.stake_token;
        let mut next_pool = settled(pool, self.window(), ctx.now)?;

        let position = self.user_position(pool_id, &ctx.caller).unwrap_or_default();
        let reward = if position.amount > 0 {
            owed(&next_pool, &position)?
        } else {
            0
        };

        next_pool.total_staked = checked_add(next_pool.total_staked, amount)?;
        let staked = checked_add(position.amount, amount)?;
        let next_position = UserPosition {
            amount: staked,
            reward_debt: scaled_share(next_pool.acc_reward_per_share, staked)?,
        };

        let mut transfers = Vec::with_capacity(2);
        if amount > 0 {
            transfers.push(Transfer::pull(stake_token, ctx.caller, self.config.custody, amount));
        }
        if reward > 0 {
            transfers.push(Transfer::push(
                self.config.reward_token,
                self.config.custody,
                ctx.caller,
                reward,
            ));
        }

        self.apply_position_change(ledger, pool_id, ctx.caller, next_pool, next_position, &transfers)?;
        self.advance_clock(ctx.now);

        debug!(account = %ctx.caller, pool_id, amount, reward, "deposit");
        self.emit(StakingEvent::Deposit {
            account: ctx.caller,
            pool_id,
            amount,
        });
        if reward > 0 {
            self.emit(StakingEvent::RewardPaid {
                account: ctx.caller,
                pool_id,
                amount: reward,
            });
        }
        Ok(reward)
    }

    /// Unstake `amount` from a pool, paying out any pending reward.
    ///
    /// `amount` may be zero to claim only. Returns the reward paid.
    pub fn withdraw(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        pool_id: PoolId,
        amount: Amount,
    ) -> Result<Amount, StakingError> {
        let pool = self.registry.pool(pool_id)?;
        let stake_token = pool.stake_token;
        // Positions only come into being on deposit.
        let Some(position) = self.user_position(pool_id, &ctx.caller) else {
            if amount > 0 {
                return Err(StakingError::InsufficientStake { have: 0, need: amount });
            }
            return Ok(0);
        };
        if amount > position.amount {
            return Err(StakingError::InsufficientStake {
                have: position.amount,
                need: amount,
            });
        }
        self.check_clock(ctx.now)?;

        let mut next_pool = settled(pool, self.window(), ctx.now)?;
        let reward = owed(&next_pool, &position)?;

        next_pool.total_staked = checked_sub(next_pool.total_staked, amount)?;
        let staked = position.amount - amount;
        let next_position = UserPosition {
            amount: staked,
            reward_debt: scaled_share(next_pool.acc_reward_per_share, staked)?,
        };

        let mut transfers = Vec::with_capacity(2);
        if reward > 0 {
            transfers.push(Transfer::push(
                self.config.reward_token,
                self.config.custody,
                ctx.caller,
                reward,
            ));
        }
        if amount > 0 {
            transfers.push(Transfer::push(stake_token, self.config.custody, ctx.caller, amount));
        }

        self.apply_position_change(ledger, pool_id, ctx.caller, next_pool, next_position, &transfers)?;
        self.advance_clock(ctx.now);

        debug!(account = %ctx.caller, pool_id, amount, reward, "withdraw");
        self.emit(StakingEvent::Withdraw {
            account: ctx.caller,
            pool_id,
            amount,
        });
        if reward > 0 {
            self.emit(StakingEvent::RewardPaid {
                account: ctx.caller,
                pool_id,
                amount: reward,
            });
        }
        Ok(reward)
    }

    /// Pay out pending reward without moving stake.
    pub fn claim(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        pool_id: PoolId,
    ) -> Result<Amount, StakingError> {
        self.withdraw(ledger, ctx, pool_id, 0)
    }

    /// Return the caller's whole stake, forfeiting unclaimed reward.
    ///
    /// Neither settles the pool nor touches the reward token, so it keeps
    /// working when the reward side is broken. Returns the amount returned.
    pub fn emergency_withdraw(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        pool_id: PoolId,
    ) -> Result<Amount, StakingError> {
        let pool = self.registry.pool(pool_id)?;
        let stake_token = pool.stake_token;
        let Some(position) = self.user_position(pool_id, &ctx.caller) else {
            return Ok(0);
        };
        let amount = position.amount;

        let mut next_pool = pool.clone();
        next_pool.total_staked = checked_sub(next_pool.total_staked, amount)?;

        let transfers = if amount > 0 {
            vec![Transfer::push(stake_token, self.config.custody, ctx.caller, amount)]
        } else {
            Vec::new()
        };

        self.apply_position_change(
            ledger,
            pool_id,
            ctx.caller,
            next_pool,
            UserPosition::default(),
            &transfers,
        )?;

        warn!(account = %ctx.caller, pool_id, amount, "emergency withdraw, pending reward forfeited");
        self.emit(StakingEvent::EmergencyWithdraw {
            account: ctx.caller,
            pool_id,
            amount,
        });
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Reward `account` would receive if it claimed from `pool_id` at `now`.
    pub fn pending_reward(
        &self,
        pool_id: PoolId,
        account: &Address,
        now: Timestamp,
    ) -> Result<Amount, StakingError> {
        let projected = settled(self.registry.pool(pool_id)?, self.window(), now)?;
        match self.positions.get(&(pool_id, *account)) {
            Some(position) => Ok(owed(&projected, position)?),
            None => Ok(0),
        }
    }

    /// `min(now, period_finish)`.
    pub fn last_time_reward_applicable(&self, now: Timestamp) -> Timestamp {
        now.min(self.period_finish)
    }

    pub fn user_position(&self, pool_id: PoolId, account: &Address) -> Option<UserPosition> {
        self.positions.get(&(pool_id, *account)).copied()
    }

    pub fn pool(&self, pool_id: PoolId) -> Result<&Pool, StakingError> {
        self.registry.pool(pool_id)
    }

    pub fn pool_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn total_alloc_point(&self) -> u64 {
        self.registry.total_alloc_point()
    }

    pub fn reward_rate(&self) -> u128 {
        self.reward_rate
    }

    pub fn period_finish(&self) -> Timestamp {
        self.period_finish
    }

    pub fn total_rewards_deposited(&self) -> Amount {
        self.total_rewards_deposited
    }

    pub fn rewards_duration(&self) -> u64 {
        self.config.rewards_duration
    }

    pub fn deployed_at(&self) -> Timestamp {
        self.deployed_at
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn reward_token(&self) -> Address {
        self.config.reward_token
    }

    pub fn custody(&self) -> Address {
        self.config.custody
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.events)
    }
}
