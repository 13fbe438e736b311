//! Ordered pool collection with one pool per stake token.
//!
//! The registry owns the weight bookkeeping: `total_alloc_point` always equals
//! the sum of every pool's `alloc_point`. Mutations validate first and only
//! then write, so a rejected call leaves the registry untouched.

use std::collections::HashMap;

use stakeflow_core::error::{MathError, StakingError};
use stakeflow_core::types::{Address, Pool, PoolId, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    by_token: HashMap<Address, PoolId>,
    total_alloc_point: u64,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pool for `stake_token` with the given weight.
    ///
    /// Fails with [`StakingError::DuplicateStakeToken`] if the token already
    /// backs a pool.
    pub fn register(
        &mut self,
        weight: u64,
        stake_token: Address,
        now: Timestamp,
    ) -> Result<PoolId, StakingError> {
        if self.by_token.contains_key(&stake_token) {
            return Err(StakingError::DuplicateStakeToken(stake_token));
        }
        let total = self
            .total_alloc_point
            .checked_add(weight)
            .ok_or(MathError::Overflow)?;

        let pool_id = self.pools.len();
        self.pools.push(Pool::new(stake_token, weight, now));
        self.by_token.insert(stake_token, pool_id);
        self.total_alloc_point = total;
        Ok(pool_id)
    }

    /// Replace a pool's weight, returning the previous one.
    pub fn set_weight(&mut self, pool_id: PoolId, weight: u64) -> Result<u64, StakingError> {
        let previous = self.pool(pool_id)?.alloc_point;
        let total = self
            .total_alloc_point
            .checked_sub(previous)
            .and_then(|rest| rest.checked_add(weight))
            .ok_or(MathError::Overflow)?;

        if let Some(pool) = self.pools.get_mut(pool_id) {
            pool.alloc_point = weight;
        }
        self.total_alloc_point = total;
        Ok(previous)
    }

    pub fn pool(&self, pool_id: PoolId) -> Result<&Pool, StakingError> {
        self.pools.get(pool_id).ok_or(StakingError::UnknownPool(pool_id))
    }

    pub fn get(&self, pool_id: PoolId) -> Option<&Pool> {
        self.pools.get(pool_id)
    }

    pub(crate) fn get_mut(&mut self, pool_id: PoolId) -> Option<&mut Pool> {
        self.pools.get_mut(pool_id)
    }

    pub(crate) fn pools_mut(&mut self) -> &mut [Pool] {
        &mut self.pools
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.pools.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn contains_token(&self, token: &Address) -> bool {
        self.by_token.contains_key(token)
    }

    pub fn pool_id_of(&self, token: &Address) -> Option<PoolId> {
        self.by_token.get(token).copied()
    }

    pub fn total_alloc_point(&self) -> u64 {
        self.total_alloc_point
    }
}
