//! Reward feeder: custody of reward tokens plus the monthly feed.
//!
//! The feeder is an account on the ledger (`config.custody`) that owns the
//! target accumulator. A feed approves the accumulator to pull exactly the
//! monthly budget from feeder custody, then refills it as the owner. If the
//! refill fails the previous allowance is restored.

use tracing::{debug, info, warn};

use stakeflow_core::error::{FeederError, MathError};
use stakeflow_core::traits::TokenLedger;
use stakeflow_core::types::{Address, Amount, CallContext, StakingEvent, Timestamp, Transfer};
use stakeflow_pools::RewardAccumulator;

use crate::config::{FeedPolicy, FeederConfig};
use crate::schedule::RewardSchedule;

/// Outcome of a successful feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedReceipt {
    pub month: u64,
    pub amount: Amount,
    /// Accumulator rate after the refill, scaled.
    pub reward_rate: u128,
    pub period_finish: Timestamp,
}

#[derive(Debug, Clone)]
pub struct RewardFeeder {
    config: FeederConfig,
    schedule: RewardSchedule,
    owner: Address,
    last_fed_month: Option<u64>,
    total_fed: Amount,
    events: Vec<StakingEvent>,
}

impl RewardFeeder {
    pub fn new(config: FeederConfig, owner: Address) -> Result<Self, FeederError> {
        let schedule = RewardSchedule::new(config.schedule)?;
        info!(
            custody = %config.custody,
            target = %config.target,
            policy = ?config.feed_policy,
            "reward feeder created"
        );
        Ok(Self {
            config,
            schedule,
            owner,
            last_fed_month: None,
            total_fed: 0,
            events: Vec::new(),
        })
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), FeederError> {
        if *caller != self.owner {
            return Err(FeederError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn fed_this_month(&self, month: u64) -> bool {
        self.last_fed_month.is_some_and(|last| last >= month)
    }

    /// Move `amount` of reward token from the caller into feeder custody.
    ///
    /// Anyone may top up. The caller must have approved the feeder.
    pub fn add_tokens(
        &mut self,
        ledger: &mut dyn TokenLedger,
        ctx: CallContext,
        amount: Amount,
    ) -> Result<(), FeederError> {
        ledger.transfer(Transfer::pull(
            self.config.token,
            ctx.caller,
            self.config.custody,
            amount,
        ))?;

        debug!(account = %ctx.caller, amount, "tokens added");
        self.events.push(StakingEvent::TokensAdded {
            account: ctx.caller,
            amount,
        });
        Ok(())
    }

    /// Refill `accumulator` with the current month's budget.
    ///
    /// Anyone may call. Returns `Ok(None)` when [`FeedPolicy::SkipRepeat`]
    /// turns a repeat feed into a no-op.
    pub fn feed_rewards(
        &mut self,
        ledger: &mut dyn TokenLedger,
        accumulator: &mut RewardAccumulator,
        ctx: CallContext,
    ) -> Result<Option<FeedReceipt>, FeederError> {
        let month = self.schedule.month_number(ctx.now)?;

        if self.fed_this_month(month) {
            match self.config.feed_policy {
                FeedPolicy::OncePerMonth => {
                    warn!(month, caller = %ctx.caller, "feed rejected, month already fed");
                    return Err(FeederError::AlreadyFed { month });
                }
                FeedPolicy::SkipRepeat => {
                    warn!(month, caller = %ctx.caller, "feed skipped, month already fed");
                    return Ok(None);
                }
                FeedPolicy::Unguarded => {}
            }
        }

        if accumulator.custody() != self.config.target {
            return Err(FeederError::TargetMismatch {
                expected: self.config.target,
                actual: accumulator.custody(),
            });
        }

        if accumulator.reward_token() != self.config.token {
            return Err(FeederError::RewardTokenMismatch {
                expected: self.config.token,
                actual: accumulator.reward_token(),
            });
        }

        let amount = self.schedule.monthly_reward(ctx.now)?;
        let total_fed = self
            .total_fed
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;

        let token = self.config.token;
        let feeder = self.config.custody;
        let spender = accumulator.custody();
        let previous = ledger.allowance(&token, &feeder, &spender);
        ledger.approve(&token, &feeder, &spender, previous.saturating_add(amount));

        if let Err(e) = accumulator.refill(ledger, CallContext::new(feeder, ctx.now), amount) {
            ledger.approve(&token, &feeder, &spender, previous);
            return Err(e.into());
        }

        self.last_fed_month = Some(month);
        self.total_fed = total_fed;

        info!(month, amount, caller = %ctx.caller, "rewards fed");
        self.events.push(StakingEvent::RewardsFed {
            account: ctx.caller,
            month,
            amount,
        });
        Ok(Some(FeedReceipt {
            month,
            amount,
            reward_rate: accumulator.reward_rate(),
            period_finish: accumulator.period_finish(),
        }))
    }

    /// Point the feeder at a different accumulator.
    pub fn set_target(&mut self, ctx: CallContext, target: Address) -> Result<(), FeederError> {
        self.ensure_owner(&ctx.caller)?;
        self.config.target = target;
        info!(target = %target, "feeder target set");
        self.events.push(StakingEvent::FeederTargetSet { target });
        Ok(())
    }

    /// Seconds until a feed at or after `now` would refill again.
    ///
    /// Zero when a feed is allowed right now.
    pub fn seconds_until_next_feed(&self, now: Timestamp) -> Result<u64, FeederError> {
        let month = self.schedule.month_number(now)?;
        if self.config.feed_policy == FeedPolicy::Unguarded || !self.fed_this_month(month) {
            return Ok(0);
        }
        self.schedule.seconds_until_next_month(now)
    }

    pub fn custody_balance(&self, ledger: &dyn TokenLedger) -> Amount {
        ledger.balance_of(&self.config.token, &self.config.custody)
    }

    pub fn schedule(&self) -> &RewardSchedule {
        &self.schedule
    }

    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The feeder's ledger account.
    pub fn address(&self) -> Address {
        self.config.custody
    }

    pub fn token(&self) -> Address {
        self.config.token
    }

    pub fn target(&self) -> Address {
        self.config.target
    }

    pub fn last_fed_month(&self) -> Option<u64> {
        self.last_fed_month
    }

    pub fn total_fed(&self) -> Amount {
        self.total_fed
    }

    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.events)
    }
}
