//! Core value types: addresses, pools, user positions, events.
//!
//! All token amounts are `u128` base units. Per-share and per-second values
//! carrying the fixed-point factor are named `*_scaled` or documented as such.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;

/// Seconds since the Unix epoch, supplied by the caller.
pub type Timestamp = u64;

/// Token amount in base units.
pub type Amount = u128;

/// Index of a pool in registration order.
pub type PoolId = usize;

/// A 32-byte identity for accounts, tokens and custody accounts.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic address derived from a human-readable label.
    ///
    /// ```
    /// use stakeflow_core::types::Address;
    /// assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
    /// assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    /// ```
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let len = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength(len))?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Role of a token the engine holds in custody and refuses to rescue.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenRole {
    Reward,
    Stake,
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reward => f.write_str("reward"),
            Self::Stake => f.write_str("stake"),
        }
    }
}

/// Caller identity and clock reading for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }
}

/// One staking pool. Created once per stake token, never removed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    /// Token this pool accepts. Immutable after registration.
    pub stake_token: Address,
    /// Weight of this pool's share of the global reward rate.
    pub alloc_point: u64,
    /// Timestamp through which the accumulator is current.
    pub last_update_time: Timestamp,
    /// Cumulative reward per staked unit, multiplied by `SCALE`.
    pub acc_reward_per_share: u128,
    /// Sum of all positions' `amount`.
    pub total_staked: Amount,
    /// Reward that accrued while nobody was staked. Bookkeeping only.
    pub acc_undistributed_reward: Amount,
}

impl Pool {
    pub fn new(stake_token: Address, alloc_point: u64, now: Timestamp) -> Self {
        Self {
            stake_token,
            alloc_point,
            last_update_time: now,
            acc_reward_per_share: 0,
            total_staked: 0,
            acc_undistributed_reward: 0,
        }
    }
}

/// A participant's stake in one pool.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserPosition {
    pub amount: Amount,
    /// `acc_reward_per_share * amount / SCALE` at the last settlement.
    pub reward_debt: Amount,
}

/// One token movement requested from the ledger.
///
/// `spender` is the account authorised to move `from`'s funds. A pull into
/// custody names the custody account and consumes allowance; a push out of
/// custody sets `spender == from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub spender: Address,
}

impl Transfer {
    /// `from` sends its own funds.
    pub fn push(token: Address, from: Address, to: Address, amount: Amount) -> Self {
        Self { token, from, to, amount, spender: from }
    }

    /// `to` collects funds from `from` against an allowance.
    pub fn pull(token: Address, from: Address, to: Address, amount: Amount) -> Self {
        Self { token, from, to, amount, spender: to }
    }
}

/// Observable side effects, emitted only after a call succeeds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StakingEvent {
    PoolAdded { pool_id: PoolId, stake_token: Address, alloc_point: u64 },
    PoolWeightSet { pool_id: PoolId, alloc_point: u64 },
    RewardAdded { amount: Amount, reward_rate: u128, period_finish: Timestamp },
    Deposit { account: Address, pool_id: PoolId, amount: Amount },
    Withdraw { account: Address, pool_id: PoolId, amount: Amount },
    EmergencyWithdraw { account: Address, pool_id: PoolId, amount: Amount },
    RewardPaid { account: Address, pool_id: PoolId, amount: Amount },
    StuckTokensWithdrawn { token: Address, amount: Amount },
    OwnershipTransferred { previous: Address, new: Address },
    TokensAdded { account: Address, amount: Amount },
    RewardsFed { account: Address, month: u64, amount: Amount },
    FeederTargetSet { target: Address },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_roundtrip() {
        let addr = Address::from_label("stake-token");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn address_accepts_0x_prefix() {
        let addr = Address([0xAB; 32]);
        let parsed: Address = format!("0x{addr}").parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn address_rejects_bad_input() {
        assert!(matches!(
            "zz".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
        assert_eq!(
            "abcd".parse::<Address>(),
            Err(AddressError::InvalidLength(2))
        );
    }

    #[test]
    fn address_serializes_as_hex_string() {
        let addr = Address([0x11; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "11".repeat(32)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("x").is_zero());
    }

    #[test]
    fn new_pool_starts_empty() {
        let pool = Pool::new(Address([1; 32]), 7, 1_000);
        assert_eq!(pool.alloc_point, 7);
        assert_eq!(pool.last_update_time, 1_000);
        assert_eq!(pool.acc_reward_per_share, 0);
        assert_eq!(pool.total_staked, 0);
        assert_eq!(pool.acc_undistributed_reward, 0);
    }

    #[test]
    fn transfer_constructors_set_spender() {
        let (t, a, b) = (Address([1; 32]), Address([2; 32]), Address([3; 32]));
        assert_eq!(Transfer::push(t, a, b, 5).spender, a);
        assert_eq!(Transfer::pull(t, a, b, 5).spender, b);
    }

    #[test]
    fn event_json_is_tagged() {
        let ev = StakingEvent::Deposit {
            account: Address::ZERO,
            pool_id: 3,
            amount: 10,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "deposit");
        assert_eq!(json["pool_id"], 3);
    }
}
