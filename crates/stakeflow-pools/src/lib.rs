//! # stakeflow-pools: Multi-pool staking reward accumulator.
//!
//! A single reward token is emitted at a constant rate per epoch and split
//! across pools by weight. Inside a pool each staker earns in proportion to
//! stake, tracked with a per-share accumulator and a per-user reward debt:
//! - **Lazy settlement**: a pool is brought current only when touched.
//! - **Rollover refills**: unspent emission carries into the next epoch.
//! - **Undistributed carry**: reward for an empty pool is counted, never paid.

pub mod accumulator;
pub mod config;
pub mod registry;

pub use accumulator::RewardAccumulator;
pub use config::{AccumulatorConfig, WeightUpdatePolicy};
pub use registry::PoolRegistry;
