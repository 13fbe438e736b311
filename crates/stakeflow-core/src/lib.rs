//! # stakeflow-core
//! Foundation types, fixed-point math and collaborator traits for stakeflow.

pub mod constants;
pub mod error;
pub mod ledger;
pub mod math;
pub mod traits;
pub mod types;
