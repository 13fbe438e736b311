//! Shared fixtures for integration tests.

use stakeflow_core::constants::{SECONDS_PER_DAY, TOKEN_UNIT};
use stakeflow_core::error::{FeederError, StakingError};
use stakeflow_core::ledger::MemoryLedger;
use stakeflow_core::traits::TokenLedger;
use stakeflow_core::types::{Address, Amount, CallContext, PoolId, Timestamp};
use stakeflow_feeder::{FeedPolicy, FeedReceipt, FeederConfig, RewardFeeder};
use stakeflow_pools::{AccumulatorConfig, RewardAccumulator};

pub const T0: Timestamp = 1_700_000_000;
pub const TEN_DAYS: u64 = 10 * SECONDS_PER_DAY;
pub const TWENTY_DAYS: u64 = 20 * SECONDS_PER_DAY;

/// Stake tokens minted to each user per pool.
pub const USER_STAKE_FUNDS: Amount = 10_000 * TOKEN_UNIT;
/// Reward tokens minted to the owner.
pub const OWNER_REWARD_FUNDS: Amount = 10_000_000 * TOKEN_UNIT;

/// `n` whole tokens in base units.
pub fn unit(n: u128) -> Amount {
    n * TOKEN_UNIT
}

pub fn addr(label: &str) -> Address {
    Address::from_label(label)
}

/// Stake token backing the `i`-th registered pool.
pub fn stake_token(i: usize) -> Address {
    addr(&format!("stake-token-{i}"))
}

/// An accumulator, its owner, two users and a ledger with a movable clock.
pub struct World {
    pub ledger: MemoryLedger,
    pub chef: RewardAccumulator,
    pub owner: Address,
    pub alice: Address,
    pub bob: Address,
    pub now: Timestamp,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_config(AccumulatorConfig::default())
    }

    pub fn with_config(config: AccumulatorConfig) -> Self {
        let owner = addr("owner");
        let chef = RewardAccumulator::new(config, owner, T0).unwrap();
        let mut world = Self {
            ledger: MemoryLedger::new(),
            chef,
            owner,
            alice: addr("alice"),
            bob: addr("bob"),
            now: T0,
        };
        let reward = world.reward_token();
        world.fund(reward, owner, OWNER_REWARD_FUNDS);
        world
    }

    pub fn reward_token(&self) -> Address {
        self.chef.reward_token()
    }

    pub fn custody(&self) -> Address {
        self.chef.custody()
    }

    /// Mint `amount` of `token` to `who` and approve the accumulator.
    pub fn fund(&mut self, token: Address, who: Address, amount: Amount) {
        let custody = self.custody();
        self.ledger.mint(&token, &who, amount);
        self.ledger.approve(&token, &who, &custody, Amount::MAX);
    }

    pub fn advance(&mut self, secs: u64) {
        self.now += secs;
    }

    pub fn at(&self, who: Address) -> CallContext {
        CallContext::new(who, self.now)
    }

    /// Register the next pool and fund both users with its stake token.
    pub fn add_pool(&mut self, weight: u64) -> PoolId {
        let token = stake_token(self.chef.pool_count());
        let ctx = self.at(self.owner);
        let pid = self.chef.register_pool(ctx, weight, token).unwrap();
        for user in [self.alice, self.bob] {
            self.fund(token, user, USER_STAKE_FUNDS);
        }
        pid
    }

    pub fn refill(&mut self, amount: Amount) -> Result<(), StakingError> {
        let ctx = self.at(self.owner);
        self.chef.refill(&mut self.ledger, ctx, amount)
    }

    pub fn deposit(&mut self, who: Address, pid: PoolId, amount: Amount) -> Result<Amount, StakingError> {
        let ctx = self.at(who);
        self.chef.deposit(&mut self.ledger, ctx, pid, amount)
    }

    pub fn withdraw(&mut self, who: Address, pid: PoolId, amount: Amount) -> Result<Amount, StakingError> {
        let ctx = self.at(who);
        self.chef.withdraw(&mut self.ledger, ctx, pid, amount)
    }

    pub fn emergency_withdraw(&mut self, who: Address, pid: PoolId) -> Result<Amount, StakingError> {
        let ctx = self.at(who);
        self.chef.emergency_withdraw(&mut self.ledger, ctx, pid)
    }

    pub fn pending(&self, pid: PoolId, who: Address) -> Amount {
        self.chef.pending_reward(pid, &who, self.now).unwrap()
    }

    pub fn staked(&self, pid: PoolId, who: Address) -> Amount {
        self.chef.user_position(pid, &who).unwrap_or_default().amount
    }

    pub fn reward_balance(&self, who: Address) -> Amount {
        self.ledger.balance_of(&self.reward_token(), &who)
    }

    pub fn stake_balance(&self, pid: PoolId, who: Address) -> Amount {
        let token = self.chef.pool(pid).unwrap().stake_token;
        self.ledger.balance_of(&token, &who)
    }

    /// Two pools (weights 1 and 2), alice 100 and bob 200 in pool 0, ten
    /// days elapsed, then 2000 reward tokens refilled.
    pub fn with_stakers() -> Self {
        let mut w = Self::new();
        w.add_pool(1);
        w.add_pool(2);
        let (alice, bob) = (w.alice, w.bob);
        w.deposit(alice, 0, unit(100)).unwrap();
        w.deposit(bob, 0, unit(200)).unwrap();
        w.advance(TEN_DAYS);
        w.refill(unit(2_000)).unwrap();
        w
    }
}

/// A [`World`] whose accumulator is owned by a reward feeder.
pub struct FedWorld {
    pub world: World,
    pub feeder: RewardFeeder,
}

impl FedWorld {
    pub fn new(policy: FeedPolicy) -> Self {
        let mut world = World::new();
        let config = FeederConfig {
            token: world.reward_token(),
            target: world.custody(),
            feed_policy: policy,
            ..FeederConfig::default()
        };
        let feeder = RewardFeeder::new(config, world.owner).unwrap();
        let ctx = world.at(world.owner);
        world.chef.transfer_ownership(ctx, feeder.address()).unwrap();

        let reward = world.reward_token();
        for user in [world.alice, world.bob] {
            world.ledger.mint(&reward, &user, unit(1_000_000));
            world.ledger.approve(&reward, &user, &feeder.address(), Amount::MAX);
        }
        Self { world, feeder }
    }

    pub fn add_tokens(&mut self, who: Address, amount: Amount) -> Result<(), FeederError> {
        let ctx = self.world.at(who);
        self.feeder.add_tokens(&mut self.world.ledger, ctx, amount)
    }

    pub fn feed(&mut self, who: Address) -> Result<Option<FeedReceipt>, FeederError> {
        let ctx = self.world.at(who);
        self.feeder
            .feed_rewards(&mut self.world.ledger, &mut self.world.chef, ctx)
    }
}
