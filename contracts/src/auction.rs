//! # Auction Data Model
//!
//! The records the registry stores: an [`Auction`] owning its
//! append-only list of [`Bid`]s. Records are created once, mutated only
//! through the registry's state machine, and retained forever as
//! history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::verifier::SealedValue;

// ---------------------------------------------------------------------------
// AssetKind
// ---------------------------------------------------------------------------

/// The asset standard a listed token belongs to. A single non-fungible
/// kind is live today; the enum is the extension point for further
/// standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    /// A single-owner, non-fungible token.
    Unique,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Unique => write!(f, "Unique"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuctionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of an auction.
///
/// `Active` is the only state that accepts bids or cancellation. Both
/// terminal states are absorbing: once an auction leaves `Active` it
/// never returns, and re-settling a settled auction always fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Open for bids until `end_time`.
    Active,
    /// Settled by `finalize_auction` after the window closed.
    Finalized,
    /// Terminated by the seller before any bid arrived.
    Cancelled,
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionStatus::Active => write!(f, "Active"),
            AuctionStatus::Finalized => write!(f, "Finalized"),
            AuctionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bid
// ---------------------------------------------------------------------------

/// A sealed bid. Appended once, never mutated or removed. The payload
/// and proof stay opaque to the contracts; only the verifier oracle can
/// open them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Identity that submitted the bid.
    pub bidder: String,
    /// Encrypted bid value.
    pub encrypted_payload: Vec<u8>,
    /// Proof gating decryption of the payload.
    pub proof: Vec<u8>,
    /// Full value escrowed with the bid.
    pub deposit_amount: u64,
    /// When the bid was accepted.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Auction
// ---------------------------------------------------------------------------

/// A sealed-deposit auction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    /// Unique, monotonically assigned identifier. The first auction is 1.
    pub auction_id: u64,
    /// Identity that listed the asset.
    pub seller: String,
    /// Asset contract the token lives in.
    pub asset_contract: String,
    /// Token within the asset contract.
    pub token_id: u64,
    /// Standard the token belongs to.
    pub asset_kind: AssetKind,
    /// Deposit the seller escrowed at creation.
    pub seller_deposit: u64,
    /// Minimum deposit required with each bid.
    pub bidder_deposit: u64,
    /// When the auction opened.
    pub start_time: DateTime<Utc>,
    /// When bidding closes. Always after `start_time`.
    pub end_time: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: AuctionStatus,
    /// Bids in arrival order. At most one per bidder.
    pub bids: Vec<Bid>,
    /// Winning bidder, set at finalization when at least one bid exists.
    pub winner: Option<String>,
    /// Decrypted winning bid value, set alongside `winner`.
    pub winning_bid: Option<u64>,
}

impl Auction {
    /// Whether the auction still accepts state transitions.
    pub fn is_active(&self) -> bool {
        self.status == AuctionStatus::Active
    }

    /// Whether a terminal transition has occurred. The complement of
    /// [`is_active`](Self::is_active) at all times.
    pub fn is_finalized(&self) -> bool {
        !self.is_active()
    }

    /// Number of bids received. Derived from the owned list, so it can
    /// never disagree with it.
    pub fn bid_count(&self) -> usize {
        self.bids.len()
    }

    /// The bid `bidder` submitted, if any.
    pub fn bid_from(&self, bidder: &str) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.bidder == bidder)
    }

    /// The auction's ciphertexts, in bid order, for oracle queries.
    pub fn sealed_bids(&self) -> Vec<SealedValue> {
        self.bids
            .iter()
            .map(|bid| SealedValue {
                payload: bid.encrypted_payload.clone(),
                proof: bid.proof.clone(),
            })
            .collect()
    }
}
