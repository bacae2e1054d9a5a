//! Settlement state machine of a single holding.
//!
//! Operations mutate the holding in place and validate everything before
//! touching it, so a failed call leaves the holding unchanged.

use crate::{Holding, HoldingStatus, HoldingStatusCode, HoldingsError};
use tokenized_hash::Hash32;
use tokenized_logging::tokenized_trace;
use tokenized_time::ProtocolTimestamp;

impl Holding {
    /// Balance that is available whichever way the outstanding statuses settle
    pub fn safe_balance(&self) -> u64 {
        self.pending_balance.min(self.finalized_balance)
    }

    /// Safe balance minus every freeze that has not expired at `now`
    pub fn unfrozen_balance(&self, now: ProtocolTimestamp) -> u64 {
        let mut result = self.safe_balance();
        for status in self.holding_statuses.values() {
            if status.code != HoldingStatusCode::Freeze || status.is_expired(now) {
                continue;
            }
            if status.amount > result {
                return 0;
            }
            result -= status.amount;
        }
        result
    }

    /// True while a multi-contract transfer involving this holding is outstanding
    pub fn is_locked(&self) -> bool {
        self.holding_statuses
            .values()
            .any(|status| status.code.is_multi_contract())
    }

    /// Adds a pending send of `amount`
    pub fn add_debit(
        &mut self,
        txid: &Hash32,
        amount: u64,
        is_single_contract: bool,
        now: ProtocolTimestamp,
    ) -> Result<(), HoldingsError> {
        if self.holding_statuses.contains_key(txid) {
            return Err(HoldingsError::DuplicateEntry(*txid));
        }
        let available = self.safe_balance();
        if available < amount {
            return Err(HoldingsError::InsufficientHoldings {
                available,
                requested: amount,
            });
        }
        if self.unfrozen_balance(now) < amount {
            return Err(HoldingsError::HoldingsFrozen);
        }
        if self.is_locked() {
            return Err(HoldingsError::HoldingsLocked);
        }

        let pending = self
            .pending_balance
            .checked_sub(amount)
            .ok_or(HoldingsError::BalanceOverflow)?;
        let code = if is_single_contract {
            HoldingStatusCode::Debit
        } else {
            HoldingStatusCode::MultiContractDebit
        };
        self.insert_status(*txid, code, amount, pending, ProtocolTimestamp::ZERO, now);
        tokenized_trace!("holdings.add_debit", {
            "address": self.address.to_string(),
            "txid": txid.to_string(),
            "amount": amount,
            "single_contract": is_single_contract,
        });
        Ok(())
    }

    /// Adds a pending receive of `amount`
    pub fn add_deposit(
        &mut self,
        txid: &Hash32,
        amount: u64,
        is_single_contract: bool,
        now: ProtocolTimestamp,
    ) -> Result<(), HoldingsError> {
        if self.holding_statuses.contains_key(txid) {
            return Err(HoldingsError::DuplicateEntry(*txid));
        }
        if self.is_locked() {
            return Err(HoldingsError::HoldingsLocked);
        }

        let pending = self
            .pending_balance
            .checked_add(amount)
            .ok_or(HoldingsError::BalanceOverflow)?;
        let code = if is_single_contract {
            HoldingStatusCode::Deposit
        } else {
            HoldingStatusCode::MultiContractDeposit
        };
        self.insert_status(*txid, code, amount, pending, ProtocolTimestamp::ZERO, now);
        tokenized_trace!("holdings.add_deposit", {
            "address": self.address.to_string(),
            "txid": txid.to_string(),
            "amount": amount,
            "single_contract": is_single_contract,
        });
        Ok(())
    }

    /// Adds a freeze of `amount` lasting until `timeout` (zero: until reverted).
    ///
    /// The pending balance grows by `amount` while the freeze is outstanding,
    /// and the freeze is subtracted from the unfrozen balance.
    pub fn add_freeze(
        &mut self,
        txid: &Hash32,
        amount: u64,
        timeout: ProtocolTimestamp,
        now: ProtocolTimestamp,
    ) -> Result<(), HoldingsError> {
        if self.holding_statuses.contains_key(txid) {
            return Err(HoldingsError::DuplicateEntry(*txid));
        }

        let pending = self
            .pending_balance
            .checked_add(amount)
            .ok_or(HoldingsError::BalanceOverflow)?;
        self.pending_balance = pending;
        self.updated_at = now;
        self.holding_statuses.insert(
            *txid,
            HoldingStatus {
                code: HoldingStatusCode::Freeze,
                expires: timeout,
                amount,
                tx_id: *txid,
                settle_quantity: 0,
                posted: false,
            },
        );
        tokenized_trace!("holdings.add_freeze", {
            "address": self.address.to_string(),
            "txid": txid.to_string(),
            "amount": amount,
            "expires": timeout.to_nanos(),
        });
        Ok(())
    }

    fn insert_status(
        &mut self,
        txid: Hash32,
        code: HoldingStatusCode,
        amount: u64,
        pending: u64,
        expires: ProtocolTimestamp,
        now: ProtocolTimestamp,
    ) {
        self.pending_balance = pending;
        self.updated_at = now;
        self.holding_statuses.insert(
            txid,
            HoldingStatus {
                code,
                expires,
                amount,
                tx_id: txid,
                settle_quantity: pending,
                posted: false,
            },
        );
    }

    /// Settles the status of `txid` into the finalized balance.
    ///
    /// Without a status for `txid` (recovery, replay of history) both balances
    /// are set to `balance`. Freezes are never finalized, they are reverted.
    /// A debit larger than the finalized balance fails `BalanceOverflow` and
    /// stays until reverted.
    pub fn finalize_tx(
        &mut self,
        txid: &Hash32,
        balance: u64,
        now: ProtocolTimestamp,
    ) -> Result<(), HoldingsError> {
        let Some(status) = self.holding_statuses.get(txid) else {
            self.finalized_balance = balance;
            self.pending_balance = balance;
            self.updated_at = now;
            tokenized_trace!("holdings.finalize_recovery", {
                "address": self.address.to_string(),
                "txid": txid.to_string(),
                "balance": balance,
            });
            return Ok(());
        };

        let finalized = if status.code.is_debit() {
            self.finalized_balance.checked_sub(status.amount)
        } else if status.code.is_deposit() {
            self.finalized_balance.checked_add(status.amount)
        } else {
            return Err(HoldingsError::UnknownStatusCode(status.code.as_char()));
        }
        .ok_or(HoldingsError::BalanceOverflow)?;

        self.finalized_balance = finalized;
        self.updated_at = now;
        self.holding_statuses.remove(txid);
        tokenized_trace!("holdings.finalize", {
            "address": self.address.to_string(),
            "txid": txid.to_string(),
            "finalized_balance": finalized,
        });
        Ok(())
    }

    /// Undoes the pending side of the status of `txid` and drops it
    pub fn revert_status(&mut self, txid: &Hash32) -> Result<(), HoldingsError> {
        let status = self
            .holding_statuses
            .get(txid)
            .ok_or(HoldingsError::StatusNotFound(*txid))?;

        let pending = if status.code.is_debit() {
            self.pending_balance.checked_add(status.amount)
        } else if status.code.is_deposit() {
            self.pending_balance.checked_sub(status.amount)
        } else {
            // a freeze is only dropped
            Some(self.pending_balance)
        }
        .ok_or(HoldingsError::BalanceOverflow)?;

        self.pending_balance = pending;
        self.holding_statuses.remove(txid);
        tokenized_trace!("holdings.revert", {
            "address": self.address.to_string(),
            "txid": txid.to_string(),
            "pending_balance": pending,
        });
        Ok(())
    }

    /// Checks a reported debit against the tracked status, returns its settle quantity
    pub fn check_debit(&self, txid: &Hash32, amount: u64) -> Result<u64, HoldingsError> {
        self.check_settlement(txid, amount, HoldingStatusCode::is_debit)
    }

    /// Checks a reported deposit against the tracked status, returns its settle quantity
    pub fn check_deposit(&self, txid: &Hash32, amount: u64) -> Result<u64, HoldingsError> {
        self.check_settlement(txid, amount, HoldingStatusCode::is_deposit)
    }

    fn check_settlement(
        &self,
        txid: &Hash32,
        amount: u64,
        expected_kind: fn(&HoldingStatusCode) -> bool,
    ) -> Result<u64, HoldingsError> {
        let status = self
            .holding_statuses
            .get(txid)
            .ok_or(HoldingsError::MissingSettlement(*txid))?;
        if !expected_kind(&status.code) {
            return Err(HoldingsError::WrongSettlementType(status.code.as_char()));
        }
        if status.amount != amount {
            return Err(HoldingsError::WrongSettlementAmount {
                expected: status.amount,
                got: amount,
            });
        }
        Ok(status.settle_quantity)
    }

    /// Checks a reported freeze against the tracked status
    pub fn check_freeze(&self, txid: &Hash32, amount: u64) -> Result<(), HoldingsError> {
        let status = self
            .holding_statuses
            .get(txid)
            .ok_or(HoldingsError::MissingFreeze(*txid))?;
        if status.code != HoldingStatusCode::Freeze {
            return Err(HoldingsError::WrongFreezeType(status.code.as_char()));
        }
        if status.amount != amount {
            return Err(HoldingsError::WrongFreezeAmount {
                expected: status.amount,
                got: amount,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use more_asserts::assert_le;
    use tokenized_models::address::Address;

    fn txid(n: u8) -> Hash32 {
        Hash32::compute_from(&[n])
    }

    fn t(secs: u64) -> ProtocolTimestamp {
        ProtocolTimestamp::from_secs(secs)
    }

    fn funded(balance: u64) -> Holding {
        let mut holding = Holding::new(Address::from_public_key(b"holder"), t(1));
        holding.finalize_tx(&txid(0), balance, t(1)).unwrap();
        holding
    }

    /// pending = finalized + net effect of outstanding debits and deposits
    fn assert_conserved(holding: &Holding) {
        let mut expected = holding.finalized_balance as i128;
        for status in holding.holding_statuses.values() {
            match status.code {
                c if c.is_debit() => expected -= status.amount as i128,
                c if c.is_deposit() => expected += status.amount as i128,
                _ => expected += status.amount as i128,
            }
        }
        assert_eq!(holding.pending_balance as i128, expected);
    }

    #[test]
    fn test_debit_then_finalize() {
        let mut holding = funded(100);
        holding.add_debit(&txid(1), 30, true, t(2)).unwrap();
        assert_eq!(holding.pending_balance, 70);
        assert_eq!(holding.finalized_balance, 100);
        assert_eq!(holding.safe_balance(), 70);
        assert_eq!(holding.check_debit(&txid(1), 30).unwrap(), 70);
        assert_eq!(holding.updated_at, t(2));
        assert_conserved(&holding);

        holding.finalize_tx(&txid(1), 0, t(3)).unwrap();
        assert_eq!(holding.pending_balance, 70);
        assert_eq!(holding.finalized_balance, 70);
        assert!(holding.holding_statuses.is_empty());
        assert_eq!(holding.updated_at, t(3));
    }

    #[test]
    fn test_balance_conservation_over_sequence() {
        let mut holding = funded(1_000);
        holding.add_debit(&txid(1), 100, true, t(2)).unwrap();
        holding.add_deposit(&txid(2), 250, true, t(2)).unwrap();
        holding.add_debit(&txid(3), 40, true, t(2)).unwrap();
        assert_conserved(&holding);

        holding.revert_status(&txid(3)).unwrap();
        assert_conserved(&holding);
        holding.finalize_tx(&txid(2), 0, t(3)).unwrap();
        assert_conserved(&holding);
        holding.finalize_tx(&txid(1), 0, t(3)).unwrap();
        assert_conserved(&holding);

        assert_eq!(holding.finalized_balance, 1_150);
        assert_eq!(holding.pending_balance, 1_150);
        assert!(holding.holding_statuses.is_empty());
    }

    #[test]
    fn test_no_double_apply() {
        let mut holding = funded(100);
        holding.add_debit(&txid(1), 10, true, t(2)).unwrap();
        let before = holding.clone();
        assert_matches!(
            holding.add_debit(&txid(1), 10, true, t(3)),
            Err(HoldingsError::DuplicateEntry(id)) if id == txid(1)
        );
        assert_matches!(
            holding.add_deposit(&txid(1), 10, true, t(3)),
            Err(HoldingsError::DuplicateEntry(_))
        );
        assert_matches!(
            holding.add_freeze(&txid(1), 10, ProtocolTimestamp::ZERO, t(3)),
            Err(HoldingsError::DuplicateEntry(_))
        );
        assert_eq!(holding, before);
    }

    #[test]
    fn test_duplicate_checked_before_balance() {
        let mut holding = funded(10);
        holding.add_debit(&txid(1), 10, true, t(2)).unwrap();
        assert_matches!(
            holding.add_debit(&txid(1), 50, true, t(2)),
            Err(HoldingsError::DuplicateEntry(_))
        );
    }

    #[test]
    fn test_multi_contract_lock() {
        let mut holding = funded(100);
        holding.add_debit(&txid(1), 10, false, t(2)).unwrap();
        assert!(holding.is_locked());
        assert_matches!(
            holding.add_debit(&txid(2), 10, true, t(2)),
            Err(HoldingsError::HoldingsLocked)
        );
        assert_matches!(
            holding.add_deposit(&txid(3), 10, true, t(2)),
            Err(HoldingsError::HoldingsLocked)
        );

        holding.finalize_tx(&txid(1), 0, t(3)).unwrap();
        assert!(!holding.is_locked());
        holding.add_deposit(&txid(3), 10, true, t(3)).unwrap();
    }

    #[test]
    fn test_multi_contract_deposit_locks_after_revert_unlocks() {
        let mut holding = funded(0);
        holding.add_deposit(&txid(1), 5, false, t(2)).unwrap();
        assert_eq!(
            holding.holding_statuses[&txid(1)].code,
            HoldingStatusCode::MultiContractDeposit
        );
        assert_matches!(
            holding.add_deposit(&txid(2), 5, true, t(2)),
            Err(HoldingsError::HoldingsLocked)
        );
        holding.revert_status(&txid(1)).unwrap();
        assert_eq!(holding.pending_balance, 0);
        holding.add_deposit(&txid(2), 5, true, t(2)).unwrap();
    }

    #[test]
    fn test_freeze_enforcement() {
        let mut holding = funded(100);
        holding
            .add_freeze(&txid(1), 30, ProtocolTimestamp::ZERO, t(2))
            .unwrap();
        // a freeze raises the pending balance, the safe balance is unchanged
        assert_eq!(holding.pending_balance, 130);
        assert_eq!(holding.safe_balance(), 100);
        assert_eq!(holding.unfrozen_balance(t(3)), 70);
        holding.check_freeze(&txid(1), 30).unwrap();

        assert_matches!(
            holding.add_debit(&txid(2), 80, true, t(3)),
            Err(HoldingsError::HoldingsFrozen)
        );
        holding.add_debit(&txid(3), 70, true, t(3)).unwrap();
        assert_eq!(holding.pending_balance, 60);
    }

    #[test]
    fn test_expired_freeze_is_ignored() {
        let mut holding = funded(100);
        holding.add_freeze(&txid(1), 60, t(10), t(2)).unwrap();
        assert_eq!(holding.unfrozen_balance(t(10)), 40);
        assert_eq!(holding.unfrozen_balance(t(11)), 100);
    }

    #[test]
    fn test_frozen_beyond_safe_balance() {
        let mut holding = funded(50);
        holding
            .add_freeze(&txid(1), 80, ProtocolTimestamp::ZERO, t(2))
            .unwrap();
        assert_eq!(holding.unfrozen_balance(t(3)), 0);
    }

    #[test]
    fn test_freeze_cannot_be_finalized_only_reverted() {
        let mut holding = funded(100);
        holding
            .add_freeze(&txid(1), 30, ProtocolTimestamp::ZERO, t(2))
            .unwrap();
        let before = holding.clone();
        assert_matches!(
            holding.finalize_tx(&txid(1), 0, t(3)),
            Err(HoldingsError::UnknownStatusCode('F'))
        );
        assert_eq!(holding, before);

        holding.revert_status(&txid(1)).unwrap();
        // reverting a freeze only drops it
        assert_eq!(holding.pending_balance, 130);
        assert!(holding.holding_statuses.is_empty());
    }

    #[test]
    fn test_recovery_finalize_overwrites_balances() {
        let mut holding = funded(100);
        holding.add_debit(&txid(1), 30, true, t(2)).unwrap();
        holding.finalize_tx(&txid(9), 500, t(3)).unwrap();
        assert_eq!(holding.finalized_balance, 500);
        assert_eq!(holding.pending_balance, 500);
        assert_eq!(holding.updated_at, t(3));
        // the tracked status survives the overwrite
        assert!(holding.holding_statuses.contains_key(&txid(1)));
    }

    #[test]
    fn test_debit_beyond_recovered_balance_stays_until_reverted() {
        let mut holding = funded(100);
        holding.add_debit(&txid(1), 30, false, t(2)).unwrap();
        holding.finalize_tx(&txid(9), 10, t(3)).unwrap();
        let before = holding.clone();

        assert_matches!(
            holding.finalize_tx(&txid(1), 0, t(4)),
            Err(HoldingsError::BalanceOverflow)
        );
        assert_eq!(holding, before);
        assert!(holding.is_locked());

        holding.revert_status(&txid(1)).unwrap();
        assert!(!holding.is_locked());
        assert_eq!(holding.finalized_balance, 10);
    }

    #[test]
    fn test_insufficient_holdings() {
        let mut holding = funded(10);
        assert_matches!(
            holding.add_debit(&txid(1), 11, true, t(2)),
            Err(HoldingsError::InsufficientHoldings {
                available: 10,
                requested: 11
            })
        );
        // pending deposits are not spendable
        holding.add_deposit(&txid(2), 100, true, t(2)).unwrap();
        assert_eq!(holding.safe_balance(), 10);
        assert_matches!(
            holding.add_debit(&txid(3), 11, true, t(2)),
            Err(HoldingsError::InsufficientHoldings { .. })
        );
    }

    #[test]
    fn test_check_settlement_errors() {
        let mut holding = funded(100);
        holding.add_debit(&txid(1), 10, true, t(2)).unwrap();
        holding.add_deposit(&txid(2), 20, true, t(2)).unwrap();

        assert_matches!(
            holding.check_debit(&txid(3), 10),
            Err(HoldingsError::MissingSettlement(_))
        );
        assert_matches!(
            holding.check_debit(&txid(2), 20),
            Err(HoldingsError::WrongSettlementType('R'))
        );
        assert_matches!(
            holding.check_debit(&txid(1), 11),
            Err(HoldingsError::WrongSettlementAmount {
                expected: 10,
                got: 11
            })
        );
        assert_eq!(holding.check_deposit(&txid(2), 20).unwrap(), 110);
        assert_matches!(
            holding.check_freeze(&txid(1), 10),
            Err(HoldingsError::WrongFreezeType('S'))
        );
        assert_matches!(
            holding.check_freeze(&txid(3), 10),
            Err(HoldingsError::MissingFreeze(_))
        );
    }

    #[test]
    fn test_revert_missing_status() {
        let mut holding = funded(1);
        assert_matches!(
            holding.revert_status(&txid(1)),
            Err(HoldingsError::StatusNotFound(_))
        );
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let mut holding = funded(u64::MAX - 1);
        let before = holding.clone();
        assert_matches!(
            holding.add_deposit(&txid(1), 2, true, t(2)),
            Err(HoldingsError::BalanceOverflow)
        );
        assert_eq!(holding, before);
        holding.add_deposit(&txid(1), 1, true, t(2)).unwrap();
        assert_le!(holding.finalized_balance, holding.pending_balance);
    }
}
