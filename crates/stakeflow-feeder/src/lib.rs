//! # stakeflow-feeder: Decaying monthly reward feeder.
//!
//! Holds reward tokens in its own custody and, once per schedule month,
//! refills a [`RewardAccumulator`](stakeflow_pools::RewardAccumulator) with
//! that month's budget:
//! - **Schedule**: yearly budget decays by a quarter each 365-day year.
//! - **Top-ups**: anyone may add tokens to the feeder's custody.
//! - **Feed guard**: repeat feeds within a month follow a [`FeedPolicy`].

pub mod config;
pub mod feeder;
pub mod schedule;

pub use config::{FeedPolicy, FeederConfig};
pub use feeder::{FeedReceipt, RewardFeeder};
pub use schedule::{RewardSchedule, ScheduleParams};
