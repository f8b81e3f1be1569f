//! # Liquidity Pool
//!
//! A fee-processing pool that runs beside the auction registry: separate
//! balance, separate owner-configured oracle, no shared state. Providers
//! pay native currency in through [`LiquidityPool::add_liquidity`]; the
//! pool meters its encrypted-value processing through a configurable
//! processing fee.
//!
//! The exact flow the processing fee attaches to is a deployment
//! decision, so the fee is exposed as an explicit hook
//! ([`LiquidityPool::apply_processing_fee`]) rather than being wired
//! into any particular operation here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{FeeSplit, BPS_DENOMINATOR, DEFAULT_PROCESSING_FEE_BPS};
use crate::events::Notification;
use crate::verifier::{VerificationError, VerifierOracle};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Only the pool owner may perform this operation.
    #[error("not the pool owner")]
    NotOwner {
        /// The identity that attempted the operation.
        caller: String,
    },

    /// Zero-value deposits are disallowed.
    #[error("deposit must be > 0")]
    ZeroDeposit,

    /// A balance would exceed `u64::MAX`.
    #[error("liquidity overflow")]
    Overflow,

    /// The fee rate exceeds 100%.
    #[error("fee out of range: {bps} bps")]
    FeeOutOfRange {
        /// The rejected rate.
        bps: u32,
    },

    /// No oracle has been configured for this pool.
    #[error("no oracle configured")]
    OracleNotSet,

    /// The configured oracle rejected a ciphertext or proof.
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Read-only snapshot of the pool's configuration and balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityInfo {
    /// Total native currency deposited by all providers.
    pub total_liquidity: u64,
    /// Processing fee rate, in basis points.
    pub processing_fee_bps: u32,
    /// Whether an oracle capability is installed.
    pub oracle_configured: bool,
}

// ---------------------------------------------------------------------------
// LiquidityPool
// ---------------------------------------------------------------------------

/// The fee-processing liquidity pool. Created once at deployment,
/// mutated by provider deposits and owner configuration, never
/// destroyed.
pub struct LiquidityPool {
    owner: String,
    total_liquidity: u64,
    processing_fee_bps: u32,
    oracle: Option<Arc<dyn VerifierOracle>>,
    /// Provider → amount deposited.
    deposits: HashMap<String, u64>,
    fees_accrued: u64,
    notifications: Vec<Notification>,
}

impl LiquidityPool {
    /// Creates an empty pool owned by `owner`, at the default processing
    /// fee, with no oracle installed.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            total_liquidity: 0,
            processing_fee_bps: DEFAULT_PROCESSING_FEE_BPS,
            oracle: None,
            deposits: HashMap::new(),
            fees_accrued: 0,
            notifications: Vec::new(),
        }
    }

    /// Deposits `value` into the pool under the caller's account.
    pub fn add_liquidity(&mut self, caller: &str, value: u64) -> Result<(), PoolError> {
        if value == 0 {
            return Err(PoolError::ZeroDeposit);
        }
        let total = self
            .total_liquidity
            .checked_add(value)
            .ok_or(PoolError::Overflow)?;
        let slot = self.deposits.entry(caller.to_string()).or_insert(0);
        *slot = slot.checked_add(value).ok_or(PoolError::Overflow)?;
        self.total_liquidity = total;

        info!(provider = %caller, amount = value, total, "liquidity added");
        self.notifications.push(Notification::LiquidityAdded {
            provider: caller.to_string(),
            amount: value,
            total_liquidity: total,
        });
        Ok(())
    }

    /// Installs the oracle capability this pool validates encrypted
    /// computations with. Owner-only.
    pub fn set_oracle(
        &mut self,
        caller: &str,
        oracle: Arc<dyn VerifierOracle>,
    ) -> Result<(), PoolError> {
        self.require_owner(caller)?;
        self.oracle = Some(oracle);
        info!(owner = %caller, "pool oracle configured");
        Ok(())
    }

    /// Sets the processing fee rate. Owner-only; at most 10 000 bps.
    pub fn set_processing_fee(&mut self, caller: &str, bps: u32) -> Result<(), PoolError> {
        self.require_owner(caller)?;
        if bps as u64 > BPS_DENOMINATOR {
            return Err(PoolError::FeeOutOfRange { bps });
        }
        self.processing_fee_bps = bps;
        info!(owner = %caller, bps, "processing fee updated");
        Ok(())
    }

    /// Opens a sealed contribution through the configured oracle.
    pub fn decrypt_contribution(&self, payload: &[u8], proof: &[u8]) -> Result<u64, PoolError> {
        let oracle = self.oracle.as_ref().ok_or(PoolError::OracleNotSet)?;
        Ok(oracle.decrypt(payload, proof)?)
    }

    /// Splits `gross` at the configured processing fee rate and accrues
    /// the fee share to the pool. Where in a flow this hook fires is the
    /// calling layer's decision.
    pub fn apply_processing_fee(&mut self, gross: u64) -> Result<FeeSplit, PoolError> {
        let split = FeeSplit::of(gross, self.processing_fee_bps);
        self.fees_accrued = self
            .fees_accrued
            .checked_add(split.fee)
            .ok_or(PoolError::Overflow)?;
        debug!(gross, fee = split.fee, "processing fee applied");
        Ok(split)
    }

    /// The pool's configuration and balance snapshot.
    pub fn liquidity_info(&self) -> LiquidityInfo {
        LiquidityInfo {
            total_liquidity: self.total_liquidity,
            processing_fee_bps: self.processing_fee_bps,
            oracle_configured: self.oracle.is_some(),
        }
    }

    /// Amount `identity` has deposited into the pool.
    pub fn user_deposit(&self, identity: &str) -> u64 {
        self.deposits.get(identity).copied().unwrap_or(0)
    }

    /// The pool deployment owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Processing fees accrued so far.
    pub fn fees_accrued(&self) -> u64 {
        self.fees_accrued
    }

    /// Drains the buffered notifications, in emission order.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn require_owner(&self, caller: &str) -> Result<(), PoolError> {
        if caller != self.owner {
            return Err(PoolError::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::PassthroughVerifier;

    #[test]
    fn deposits_accumulate_per_provider() {
        let mut pool = LiquidityPool::new("owner");
        pool.add_liquidity("alice", 1_000).unwrap();
        pool.add_liquidity("bob", 500).unwrap();
        pool.add_liquidity("alice", 250).unwrap();

        assert_eq!(pool.user_deposit("alice"), 1_250);
        assert_eq!(pool.user_deposit("bob"), 500);
        assert_eq!(pool.liquidity_info().total_liquidity, 1_750);
    }

    #[test]
    fn zero_deposit_rejected() {
        let mut pool = LiquidityPool::new("owner");
        assert!(matches!(
            pool.add_liquidity("alice", 0),
            Err(PoolError::ZeroDeposit)
        ));
    }

    #[test]
    fn deposit_overflow_rejected() {
        let mut pool = LiquidityPool::new("owner");
        pool.add_liquidity("alice", u64::MAX).unwrap();
        assert!(matches!(
            pool.add_liquidity("bob", 1),
            Err(PoolError::Overflow)
        ));
        // The failed deposit left no trace.
        assert_eq!(pool.user_deposit("bob"), 0);
        assert_eq!(pool.liquidity_info().total_liquidity, u64::MAX);
    }

    #[test]
    fn oracle_installation_is_owner_gated() {
        let mut pool = LiquidityPool::new("owner");
        let err = pool
            .set_oracle("mallory", Arc::new(PassthroughVerifier))
            .unwrap_err();
        assert!(matches!(err, PoolError::NotOwner { .. }));
        assert!(!pool.liquidity_info().oracle_configured);

        pool.set_oracle("owner", Arc::new(PassthroughVerifier))
            .unwrap();
        assert!(pool.liquidity_info().oracle_configured);
    }

    #[test]
    fn decrypt_requires_oracle() {
        let pool = LiquidityPool::new("owner");
        let sealed = PassthroughVerifier::seal(77);
        assert!(matches!(
            pool.decrypt_contribution(&sealed.payload, &sealed.proof),
            Err(PoolError::OracleNotSet)
        ));
    }

    #[test]
    fn decrypt_delegates_to_oracle() {
        let mut pool = LiquidityPool::new("owner");
        pool.set_oracle("owner", Arc::new(PassthroughVerifier))
            .unwrap();

        let sealed = PassthroughVerifier::seal(77);
        assert_eq!(
            pool.decrypt_contribution(&sealed.payload, &sealed.proof)
                .unwrap(),
            77
        );
        assert!(matches!(
            pool.decrypt_contribution(&sealed.payload, b""),
            Err(PoolError::Verification(_))
        ));
    }

    #[test]
    fn processing_fee_hook_accrues() {
        let mut pool = LiquidityPool::new("owner");
        pool.set_processing_fee("owner", 100).unwrap();

        let split = pool.apply_processing_fee(10_000).unwrap();
        assert_eq!(split.fee, 100);
        assert_eq!(split.net, 9_900);
        assert_eq!(pool.fees_accrued(), 100);

        pool.apply_processing_fee(10_000).unwrap();
        assert_eq!(pool.fees_accrued(), 200);
    }

    #[test]
    fn fee_rate_bounds_enforced() {
        let mut pool = LiquidityPool::new("owner");
        assert!(matches!(
            pool.set_processing_fee("owner", 10_001),
            Err(PoolError::FeeOutOfRange { bps: 10_001 })
        ));
        assert!(matches!(
            pool.set_processing_fee("mallory", 50),
            Err(PoolError::NotOwner { .. })
        ));
        pool.set_processing_fee("owner", 10_000).unwrap();
        assert_eq!(pool.liquidity_info().processing_fee_bps, 10_000);
    }

    #[test]
    fn liquidity_notifications_in_order() {
        let mut pool = LiquidityPool::new("owner");
        pool.add_liquidity("alice", 100).unwrap();
        pool.add_liquidity("bob", 200).unwrap();

        let events = pool.take_notifications();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Notification::LiquidityAdded { provider, amount: 100, total_liquidity: 100 }
                if provider == "alice"
        ));
        assert!(matches!(
            &events[1],
            Notification::LiquidityAdded { provider, amount: 200, total_liquidity: 300 }
                if provider == "bob"
        ));
        assert!(pool.take_notifications().is_empty());
    }
}
