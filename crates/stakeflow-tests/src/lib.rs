//! Integration and adversarial test suite for stakeflow.
//!
//! Drives the accumulator and feeder together over a shared in-memory
//! ledger and checks the accounting invariants under scripted and
//! randomized call sequences.

pub mod helpers;
