//! In-memory [`TokenLedger`] with ERC-20 style balances and allowances.
//!
//! Batches are applied in order against a journal of previous values; the
//! first failing transfer rolls the journal back, so a batch either lands
//! completely or not at all. Frozen tokens reject every transfer, which lets
//! callers simulate a broken token contract.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::error::TransferError;
use crate::traits::TokenLedger;
use crate::types::{Address, Amount, Transfer};

type BalanceKey = (Address, Address);
type AllowanceKey = (Address, Address, Address);

enum JournalEntry {
    Balance(BalanceKey, Amount),
    Allowance(AllowanceKey, Amount),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<BalanceKey, Amount>,
    allowances: HashMap<AllowanceKey, Amount>,
    frozen: HashSet<Address>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `account` out of thin air.
    pub fn mint(&mut self, token: &Address, account: &Address, amount: Amount) {
        let entry = self.balances.entry((*token, *account)).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Make every transfer of `token` fail until [`unfreeze`](Self::unfreeze).
    pub fn freeze(&mut self, token: &Address) {
        self.frozen.insert(*token);
    }

    pub fn unfreeze(&mut self, token: &Address) {
        self.frozen.remove(token);
    }

    pub fn is_frozen(&self, token: &Address) -> bool {
        self.frozen.contains(token)
    }

    /// Sum of all balances held in `token`.
    pub fn total_supply(&self, token: &Address) -> Amount {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .fold(0u128, |acc, (_, v)| acc.saturating_add(*v))
    }

    fn apply_one(&mut self, t: &Transfer, journal: &mut Vec<JournalEntry>) -> Result<(), TransferError> {
        if self.frozen.contains(&t.token) {
            return Err(TransferError::TokenFrozen(t.token));
        }
        if t.amount == 0 {
            return Ok(());
        }

        if t.spender != t.from {
            let key = (t.token, t.from, t.spender);
            let have = *self.allowances.get(&key).unwrap_or(&0);
            if have < t.amount {
                return Err(TransferError::InsufficientAllowance {
                    token: t.token,
                    owner: t.from,
                    spender: t.spender,
                    have,
                    need: t.amount,
                });
            }
            journal.push(JournalEntry::Allowance(key, have));
            self.allowances.insert(key, have - t.amount);
        }

        let from_key = (t.token, t.from);
        let from_balance = *self.balances.get(&from_key).unwrap_or(&0);
        if from_balance < t.amount {
            return Err(TransferError::InsufficientBalance {
                token: t.token,
                account: t.from,
                have: from_balance,
                need: t.amount,
            });
        }
        journal.push(JournalEntry::Balance(from_key, from_balance));
        self.balances.insert(from_key, from_balance - t.amount);

        let to_key = (t.token, t.to);
        let to_balance = *self.balances.get(&to_key).unwrap_or(&0);
        let credited = to_balance
            .checked_add(t.amount)
            .ok_or(TransferError::BalanceOverflow(t.to))?;
        journal.push(JournalEntry::Balance(to_key, to_balance));
        self.balances.insert(to_key, credited);
        Ok(())
    }

    fn rollback(&mut self, journal: Vec<JournalEntry>) {
        for entry in journal.into_iter().rev() {
            match entry {
                JournalEntry::Balance(key, prev) => {
                    self.balances.insert(key, prev);
                }
                JournalEntry::Allowance(key, prev) => {
                    self.allowances.insert(key, prev);
                }
            }
        }
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, token: &Address, account: &Address) -> Amount {
        *self.balances.get(&(*token, *account)).unwrap_or(&0)
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        *self.allowances.get(&(*token, *owner, *spender)).unwrap_or(&0)
    }

    fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*token, *owner, *spender), amount);
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), TransferError> {
        let mut journal = Vec::with_capacity(transfers.len() * 3);
        for t in transfers {
            if let Err(e) = self.apply_one(t, &mut journal) {
                self.rollback(journal);
                return Err(e);
            }
            trace!(token = %t.token, from = %t.from, to = %t.to, amount = t.amount, "ledger transfer");
        }
        Ok(())
    }
}
