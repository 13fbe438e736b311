//! Trait interfaces for collaborators outside the accounting engine.
//!
//! - [`TokenLedger`]: fungible-token balances, allowances and transfers
//!   ([`MemoryLedger`](crate::ledger::MemoryLedger) implements it in memory)

use crate::error::TransferError;
use crate::types::{Address, Amount, Transfer};

/// Custody primitive for fungible tokens.
///
/// The engine never holds balances itself; every inbound and outbound
/// movement goes through [`execute`](Self::execute), which must apply the
/// whole batch or nothing.
pub trait TokenLedger {
    /// Balance of `account` in `token`.
    fn balance_of(&self, token: &Address, account: &Address) -> Amount;

    /// Amount `spender` may still pull from `owner` in `token`.
    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;

    /// Set the allowance `owner` grants `spender` in `token`.
    fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount);

    /// Apply every transfer in order, atomically.
    ///
    /// On error no balance or allowance has changed.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), TransferError>;

    /// Single-transfer convenience over [`execute`](Self::execute).
    fn transfer(&mut self, transfer: Transfer) -> Result<(), TransferError> {
        self.execute(std::slice::from_ref(&transfer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // ------------------------------------------------------------------
    // Mock: TokenLedger without allowances, applied non-atomically
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct CountingLedger {
        balances: HashMap<(Address, Address), Amount>,
        batches: usize,
    }

    impl TokenLedger for CountingLedger {
        fn balance_of(&self, token: &Address, account: &Address) -> Amount {
            *self.balances.get(&(*token, *account)).unwrap_or(&0)
        }

        fn allowance(&self, _token: &Address, _owner: &Address, _spender: &Address) -> Amount {
            Amount::MAX
        }

        fn approve(&mut self, _token: &Address, _owner: &Address, _spender: &Address, _amount: Amount) {}

        fn execute(&mut self, transfers: &[Transfer]) -> Result<(), TransferError> {
            self.batches += 1;
            for t in transfers {
                *self.balances.entry((t.token, t.to)).or_default() += t.amount;
            }
            Ok(())
        }
    }

    #[test]
    fn transfer_delegates_to_execute() {
        let mut ledger = CountingLedger::default();
        let token = Address([1; 32]);
        let to = Address([2; 32]);
        ledger
            .transfer(Transfer::push(token, Address::ZERO, to, 9))
            .unwrap();
        assert_eq!(ledger.batches, 1);
        assert_eq!(ledger.balance_of(&token, &to), 9);
    }

    #[test]
    fn ledger_is_object_safe() {
        let mut ledger = CountingLedger::default();
        let dyn_ledger: &mut dyn TokenLedger = &mut ledger;
        assert_eq!(dyn_ledger.balance_of(&Address::ZERO, &Address::ZERO), 0);
        dyn_ledger.execute(&[]).unwrap();
    }
}
