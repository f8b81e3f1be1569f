//! # Asset Custody Capability
//!
//! The registry never talks to an asset contract directly — it goes
//! through the [`AssetCustody`] capability, which exposes the three
//! ownership primitives an auction needs: query the holder, pull a token
//! into escrow, and push it back out at settlement.
//!
//! [`InMemoryCustody`] is the reference implementation used by the
//! execution engine and the test suites. It models the approve-then-pull
//! flow of the non-fungible asset standard: `transfer_into` only succeeds
//! after the holder has approved the custodian.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by custody operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// The referenced token does not exist.
    #[error("unknown asset: token {token_id} at {contract}")]
    UnknownAsset {
        /// Asset contract identity.
        contract: String,
        /// Token within the contract.
        token_id: u64,
    },

    /// The token's holder has not approved the custodian.
    #[error("transfer not approved: token {token_id} at {contract} is not approved for {operator}")]
    NotApproved {
        /// Asset contract identity.
        contract: String,
        /// Token within the contract.
        token_id: u64,
        /// The custodian that tried to pull the token.
        operator: String,
    },

    /// The caller does not hold the token it tried to act on.
    #[error("not the holder: {caller} does not hold token {token_id} at {contract}")]
    NotHolder {
        /// Asset contract identity.
        contract: String,
        /// Token within the contract.
        token_id: u64,
        /// The identity that attempted the operation.
        caller: String,
    },
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Ownership primitives over a non-fungible asset contract.
pub trait AssetCustody: Send + Sync {
    /// Returns the current holder of the token.
    fn owner_of(&self, contract: &str, token_id: u64) -> Result<String, CustodyError>;

    /// Moves the token from its current holder into `custodian`. Requires
    /// the holder's prior approval of `custodian`; approval is consumed.
    fn transfer_into(
        &self,
        contract: &str,
        token_id: u64,
        custodian: &str,
    ) -> Result<(), CustodyError>;

    /// Moves the token to `to`. The engine only calls this for tokens its
    /// escrow account currently holds.
    fn transfer_out(&self, contract: &str, token_id: u64, to: &str) -> Result<(), CustodyError>;
}

// ---------------------------------------------------------------------------
// InMemoryCustody
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CustodyBook {
    /// `(contract, token_id) -> holder`.
    holders: HashMap<(String, u64), String>,
    /// `(contract, token_id) -> approved operator`. One approval per
    /// token; cleared on every transfer.
    approvals: HashMap<(String, u64), String>,
}

/// In-memory asset book. Shared via `Arc`; interior locking keeps the
/// `&self` capability methods usable behind a trait object.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    book: RwLock<CustodyBook>,
}

impl InMemoryCustody {
    /// Creates an empty asset book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token under `owner`. Re-minting an existing token
    /// replaces its holder; the test suites never rely on that.
    pub fn mint(&self, contract: &str, token_id: u64, owner: &str) {
        let mut book = self.book.write();
        book.holders
            .insert((contract.to_string(), token_id), owner.to_string());
        book.approvals.remove(&(contract.to_string(), token_id));
    }

    /// Approves `operator` to pull the token. Only the holder may approve.
    pub fn approve(
        &self,
        caller: &str,
        contract: &str,
        token_id: u64,
        operator: &str,
    ) -> Result<(), CustodyError> {
        let mut book = self.book.write();
        let key = (contract.to_string(), token_id);
        let holder = book.holders.get(&key).ok_or_else(|| CustodyError::UnknownAsset {
            contract: contract.to_string(),
            token_id,
        })?;
        if holder != caller {
            return Err(CustodyError::NotHolder {
                contract: contract.to_string(),
                token_id,
                caller: caller.to_string(),
            });
        }
        book.approvals.insert(key, operator.to_string());
        Ok(())
    }
}

impl AssetCustody for InMemoryCustody {
    fn owner_of(&self, contract: &str, token_id: u64) -> Result<String, CustodyError> {
        self.book
            .read()
            .holders
            .get(&(contract.to_string(), token_id))
            .cloned()
            .ok_or_else(|| CustodyError::UnknownAsset {
                contract: contract.to_string(),
                token_id,
            })
    }

    fn transfer_into(
        &self,
        contract: &str,
        token_id: u64,
        custodian: &str,
    ) -> Result<(), CustodyError> {
        let mut book = self.book.write();
        let key = (contract.to_string(), token_id);
        if !book.holders.contains_key(&key) {
            return Err(CustodyError::UnknownAsset {
                contract: contract.to_string(),
                token_id,
            });
        }
        match book.approvals.get(&key) {
            Some(operator) if operator == custodian => {}
            _ => {
                return Err(CustodyError::NotApproved {
                    contract: contract.to_string(),
                    token_id,
                    operator: custodian.to_string(),
                });
            }
        }
        book.approvals.remove(&key);
        book.holders.insert(key, custodian.to_string());
        Ok(())
    }

    fn transfer_out(&self, contract: &str, token_id: u64, to: &str) -> Result<(), CustodyError> {
        let mut book = self.book.write();
        let key = (contract.to_string(), token_id);
        if !book.holders.contains_key(&key) {
            return Err(CustodyError::UnknownAsset {
                contract: contract.to_string(),
                token_id,
            });
        }
        book.approvals.remove(&key);
        book.holders.insert(key, to.to_string());
        Ok(())
    }
}
