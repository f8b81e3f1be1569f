//! # Verifier Oracle Capability
//!
//! Bids arrive as opaque ciphertext and stay opaque until settlement.
//! The contracts never compare encrypted values themselves — everything
//! that needs a plaintext goes through the [`VerifierOracle`] capability,
//! which the execution environment wires to the actual decryption
//! service.
//!
//! Two query shapes are consumed:
//!
//! - `decrypt` — plaintext of a single sealed value, gated by its proof.
//!   Used once per bid at finalization.
//! - `threshold_count` — how many of a batch of sealed values exceed a
//!   threshold. Only the aggregate count crosses the capability
//!   boundary, so callers learn a distribution statistic without
//!   learning who bid what.
//!
//! [`PassthroughVerifier`] is the development implementation: payloads
//! are 8-byte little-endian amounts and any non-empty proof passes. The
//! signature-presence stance matches the rest of the contract layer,
//! where full cryptographic verification is plugged in by the execution
//! engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the verifier oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The proof does not validate the ciphertext.
    #[error("invalid proof")]
    InvalidProof,

    /// The ciphertext is not a well-formed sealed value.
    #[error("malformed ciphertext: expected {expected} bytes, got {got}")]
    MalformedCiphertext {
        /// Byte length the verifier requires.
        expected: usize,
        /// Byte length it was handed.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A ciphertext together with the proof that gates its decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedValue {
    /// Opaque encrypted payload.
    pub payload: Vec<u8>,
    /// Opaque proof, consumed only by the oracle.
    pub proof: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Decryption and aggregate-query capability over sealed values.
pub trait VerifierOracle: Send + Sync {
    /// Decrypts a sealed value. Fails with [`VerificationError`] if the
    /// proof does not validate.
    fn decrypt(&self, payload: &[u8], proof: &[u8]) -> Result<u64, VerificationError>;

    /// Counts how many sealed values decrypt to a plaintext strictly
    /// above `threshold`. Implementations must only surface the count —
    /// never the individual plaintexts or their order.
    fn threshold_count(
        &self,
        sealed: &[SealedValue],
        threshold: u64,
    ) -> Result<u64, VerificationError> {
        let mut count = 0;
        for value in sealed {
            if self.decrypt(&value.payload, &value.proof)? > threshold {
                count += 1;
            }
        }
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// PassthroughVerifier
// ---------------------------------------------------------------------------

/// Development oracle: payload is the amount in 8 little-endian bytes,
/// proof must be non-empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughVerifier;

impl PassthroughVerifier {
    /// Seals an amount the way this verifier expects to open it. Test
    /// and tooling convenience.
    pub fn seal(amount: u64) -> SealedValue {
        SealedValue {
            payload: amount.to_le_bytes().to_vec(),
            proof: b"attested".to_vec(),
        }
    }
}

impl VerifierOracle for PassthroughVerifier {
    fn decrypt(&self, payload: &[u8], proof: &[u8]) -> Result<u64, VerificationError> {
        if proof.is_empty() {
            return Err(VerificationError::InvalidProof);
        }
        let bytes: [u8; 8] =
            payload
                .try_into()
                .map_err(|_| VerificationError::MalformedCiphertext {
                    expected: 8,
                    got: payload.len(),
                })?;
        Ok(u64::from_le_bytes(bytes))
    }
}
