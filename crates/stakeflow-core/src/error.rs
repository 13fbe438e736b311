//! Error types for the stakeflow engine.
use thiserror::Error;

use crate::types::{Address, PoolId, TokenRole};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")] Overflow,
    #[error("division by zero")] DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("invalid length: {0} bytes")] InvalidLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance of {token} for {account}: have {have}, need {need}")]
    InsufficientBalance { token: Address, account: Address, have: u128, need: u128 },
    #[error("insufficient allowance of {token} from {owner} to {spender}: have {have}, need {need}")]
    InsufficientAllowance { token: Address, owner: Address, spender: Address, have: u128, need: u128 },
    #[error("token frozen: {0}")] TokenFrozen(Address),
    #[error("balance overflow crediting {0}")] BalanceOverflow(Address),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingError {
    #[error("caller {caller} is not the owner")] Unauthorized { caller: Address },
    #[error("stake token has already been added: {0}")] DuplicateStakeToken(Address),
    #[error("unknown pool: {0}")] UnknownPool(PoolId),
    #[error("reward amount must be greater than zero")] ZeroRefill,
    #[error("rewards duration must be greater than zero")] ZeroDuration,
    #[error("withdraw amount is greater than user stake: have {have}, need {need}")] InsufficientStake { have: u128, need: u128 },
    #[error("cannot withdraw {role} token {token}")] ProtectedToken { token: Address, role: TokenRole },
    #[error("timestamp {now} is earlier than last accepted {last}")] StaleTimestamp { now: u64, last: u64 },
    #[error("transfer failed: {0}")] TransferFailed(#[from] TransferError),
    #[error(transparent)] Math(#[from] MathError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeederError {
    #[error("caller {caller} is not the feeder owner")] Unauthorized { caller: Address },
    #[error("timestamp {ts} precedes the schedule anchor {start}")] BeforePeriodStart { ts: u64, start: u64 },
    #[error("number of networks must be greater than zero")] ZeroNetworks,
    #[error("rewards already fed for month {month}")] AlreadyFed { month: u64 },
    #[error("accumulator {actual} is not the feeder target {expected}")] TargetMismatch { expected: Address, actual: Address },
    #[error("accumulator pays out {actual}, feeder holds {expected}")] RewardTokenMismatch { expected: Address, actual: Address },
    #[error("refill rejected: {0}")] Staking(#[from] StakingError),
    #[error("transfer failed: {0}")] TransferFailed(#[from] TransferError),
    #[error(transparent)] Math(#[from] MathError),
}

#[derive(Error, Debug)]
pub enum StakeflowError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Transfer(#[from] TransferError),
    #[error(transparent)] Staking(#[from] StakingError),
    #[error(transparent)] Feeder(#[from] FeederError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error("config: {0}")] Config(String),
}
