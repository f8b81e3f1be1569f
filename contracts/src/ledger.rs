//! # Deposit Ledger
//!
//! Escrow accounting for the auction registry. Deposits paid into an
//! auction are *held* against that auction until settlement; settlement
//! converts held amounts into *credits* that their owners drain through
//! [`DepositLedger::withdraw`]. Nothing is ever paid out from inside a
//! settlement operation — the pull-payment split keeps fund disposition
//! a pure state update.
//!
//! All arithmetic is checked. Wrapping arithmetic and money do not mix.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::config::FeeSplit;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A balance would exceed `u64::MAX`.
    #[error("ledger overflow while crediting {party}")]
    Overflow {
        /// The account whose balance would overflow.
        party: String,
    },

    /// Settlement referenced a deposit that is not held.
    #[error("nothing held for {party} on auction {auction_id}")]
    NothingHeld {
        /// The auction being settled.
        auction_id: u64,
        /// The party with no held deposit.
        party: String,
    },
}

// ---------------------------------------------------------------------------
// DepositLedger
// ---------------------------------------------------------------------------

/// Per-auction escrow of native-currency deposits plus withdrawable
/// credits and accrued protocol fees.
///
/// Conservation invariant: every unit paid in is either still held
/// against an auction, sitting in someone's credit, accrued as fees, or
/// has been withdrawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositLedger {
    /// `auction_id -> party -> amount held in escrow`.
    held: BTreeMap<u64, HashMap<String, u64>>,
    /// Withdrawable balances, drained by `withdraw`.
    credits: HashMap<String, u64>,
    /// Settlement fees accrued to the registry owner.
    fees_accrued: u64,
}

impl DepositLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds `amount` for `party` against `auction_id`.
    pub fn escrow(&mut self, auction_id: u64, party: &str, amount: u64) -> Result<(), LedgerError> {
        let slot = self
            .held
            .entry(auction_id)
            .or_default()
            .entry(party.to_string())
            .or_insert(0);
        *slot = slot.checked_add(amount).ok_or_else(|| LedgerError::Overflow {
            party: party.to_string(),
        })?;
        Ok(())
    }

    /// Amount currently held for `party` on `auction_id`.
    pub fn held_for(&self, auction_id: u64, party: &str) -> u64 {
        self.held
            .get(&auction_id)
            .and_then(|parties| parties.get(party))
            .copied()
            .unwrap_or(0)
    }

    /// Total amount held against `auction_id` across all parties.
    pub fn total_held(&self, auction_id: u64) -> u64 {
        self.held
            .get(&auction_id)
            .map(|parties| parties.values().sum())
            .unwrap_or(0)
    }

    /// Adds `amount` to `party`'s withdrawable credit.
    pub fn credit(&mut self, party: &str, amount: u64) -> Result<(), LedgerError> {
        let slot = self.credits.entry(party.to_string()).or_insert(0);
        *slot = slot.checked_add(amount).ok_or_else(|| LedgerError::Overflow {
            party: party.to_string(),
        })?;
        Ok(())
    }

    /// Converts `party`'s held deposit on `auction_id` into a credit in
    /// full. Returns the released amount.
    pub fn release(&mut self, auction_id: u64, party: &str) -> Result<u64, LedgerError> {
        let amount = self.take_held(auction_id, party)?;
        self.credit(party, amount)?;
        Ok(amount)
    }

    /// Settles `from`'s held deposit on `auction_id` as sale proceeds to
    /// `to`: the fee share accrues to the registry, the remainder is
    /// credited to `to`.
    pub fn award(
        &mut self,
        auction_id: u64,
        from: &str,
        to: &str,
        fee_bps: u32,
    ) -> Result<FeeSplit, LedgerError> {
        let amount = self.take_held(auction_id, from)?;
        let split = FeeSplit::of(amount, fee_bps);
        self.fees_accrued =
            self.fees_accrued
                .checked_add(split.fee)
                .ok_or_else(|| LedgerError::Overflow {
                    party: to.to_string(),
                })?;
        self.credit(to, split.net)?;
        Ok(split)
    }

    /// Drains and returns `party`'s withdrawable credit.
    pub fn withdraw(&mut self, party: &str) -> u64 {
        self.credits.remove(party).unwrap_or(0)
    }

    /// `party`'s current withdrawable credit.
    pub fn credit_of(&self, party: &str) -> u64 {
        self.credits.get(party).copied().unwrap_or(0)
    }

    /// Fees accrued and not yet collected.
    pub fn fees_accrued(&self) -> u64 {
        self.fees_accrued
    }

    /// Drains and returns the accrued fees.
    pub fn take_fees(&mut self) -> u64 {
        std::mem::take(&mut self.fees_accrued)
    }

    fn take_held(&mut self, auction_id: u64, party: &str) -> Result<u64, LedgerError> {
        let parties = self
            .held
            .get_mut(&auction_id)
            .ok_or_else(|| LedgerError::NothingHeld {
                auction_id,
                party: party.to_string(),
            })?;
        let amount = parties
            .remove(party)
            .ok_or_else(|| LedgerError::NothingHeld {
                auction_id,
                party: party.to_string(),
            })?;
        if parties.is_empty() {
            self.held.remove(&auction_id);
        }
        Ok(amount)
    }
}
