//! # Notifications
//!
//! Every successful state transition emits a [`Notification`] for
//! external consumers — indexers, frontends, settlement monitors. The
//! emitting aggregate buffers its notifications in order; callers drain
//! them with the aggregate's `take_notifications`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auction::AssetKind;

/// A state-transition notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A new auction opened.
    AuctionCreated {
        auction_id: u64,
        seller: String,
        asset_contract: String,
        token_id: u64,
        asset_kind: AssetKind,
        seller_deposit: u64,
        bidder_deposit: u64,
        end_time: DateTime<Utc>,
    },

    /// A sealed bid was accepted.
    BidSubmitted {
        auction_id: u64,
        bidder: String,
        encrypted_payload: Vec<u8>,
        proof: Vec<u8>,
        deposit_amount: u64,
    },

    /// An auction settled. `winner` is `None` when no bids arrived.
    AuctionFinalized {
        auction_id: u64,
        winner: Option<String>,
        winning_bid: Option<u64>,
    },

    /// The seller terminated a bidless auction.
    AuctionCancelled {
        auction_id: u64,
        seller: String,
        reason: String,
    },

    /// Liquidity was added to the pool.
    LiquidityAdded {
        provider: String,
        amount: u64,
        total_liquidity: u64,
    },
}
