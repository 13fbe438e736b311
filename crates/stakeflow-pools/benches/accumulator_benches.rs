//! Criterion benchmarks for stakeflow-pools critical operations.
//!
//! Covers: pending reward projection, deposit with implicit claim, and
//! refill across many pools.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use stakeflow_core::constants::{SECONDS_PER_DAY, TOKEN_UNIT};
use stakeflow_core::ledger::MemoryLedger;
use stakeflow_core::traits::TokenLedger;
use stakeflow_core::types::{Address, CallContext};
use stakeflow_pools::{AccumulatorConfig, RewardAccumulator};

const T0: u64 = 1_700_000_000;

fn setup(pools: usize) -> (RewardAccumulator, MemoryLedger, Address) {
    let config = AccumulatorConfig::default();
    let owner = Address::from_label("bench-owner");
    let user = Address::from_label("bench-user");
    let mut chef = RewardAccumulator::new(config.clone(), owner, T0).unwrap();
    let mut ledger = MemoryLedger::new();

    ledger.mint(&config.reward_token, &owner, 1_000_000 * TOKEN_UNIT);
    ledger.approve(&config.reward_token, &owner, &config.custody, u128::MAX);

    for i in 0..pools {
        let token = Address::from_label(&format!("bench-stake-{i}"));
        chef.register_pool(CallContext::new(owner, T0), 1 + i as u64, token).unwrap();
        ledger.mint(&token, &user, 1_000 * TOKEN_UNIT);
        ledger.approve(&token, &user, &config.custody, u128::MAX);
        chef.deposit(&mut ledger, CallContext::new(user, T0), i, 100 * TOKEN_UNIT).unwrap();
    }
    chef.refill(&mut ledger, CallContext::new(owner, T0), 10_000 * TOKEN_UNIT).unwrap();
    (chef, ledger, user)
}

fn bench_pending_reward(c: &mut Criterion) {
    let (chef, _, user) = setup(4);
    let now = T0 + 10 * SECONDS_PER_DAY;

    c.bench_function("pending_reward", |b| {
        b.iter(|| chef.pending_reward(black_box(0), black_box(&user), black_box(now)))
    });
}

fn bench_deposit(c: &mut Criterion) {
    let (chef, ledger, user) = setup(4);
    let now = T0 + 10 * SECONDS_PER_DAY;

    c.bench_function("deposit_with_claim", |b| {
        b.iter_batched(
            || (chef.clone(), ledger.clone()),
            |(mut chef, mut ledger)| {
                chef.deposit(&mut ledger, CallContext::new(user, now), 0, black_box(TOKEN_UNIT))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_refill_many_pools(c: &mut Criterion) {
    let (chef, ledger, _) = setup(64);
    let owner = chef.owner();
    let now = T0 + 10 * SECONDS_PER_DAY;

    c.bench_function("refill_64_pools", |b| {
        b.iter_batched(
            || (chef.clone(), ledger.clone()),
            |(mut chef, mut ledger)| {
                let ctx = CallContext::new(owner, now);
                let res = chef.refill(&mut ledger, ctx, black_box(TOKEN_UNIT));
                (res, ledger.balance_of(&chef.reward_token(), &chef.custody()))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_pending_reward,
    bench_deposit,
    bench_refill_many_pools,
);
criterion_main!(benches);
