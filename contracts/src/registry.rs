//! # Auction Registry
//!
//! The sealed-deposit auction state machine. Sellers lock a non-fungible
//! asset and a deposit, bidders lock deposits alongside opaque encrypted
//! bids, and once the window closes anyone can trigger settlement:
//! custody of the asset and the disposition of every deposit are decided
//! in one atomic transition.
//!
//! ## Lifecycle
//!
//! ```text
//!    create_auction          submit_bid_with_deposit
//!         │                        │ (append-only)
//!         ▼                        ▼
//!    ┌──────────┐  finalize   ┌───────────┐
//!    │  Active  │────────────►│ Finalized │  terminal
//!    └────┬─────┘             └───────────┘
//!         │ cancel (seller, zero bids)
//!         ▼
//!    ┌───────────┐
//!    │ Cancelled │  terminal
//!    └───────────┘
//! ```
//!
//! ## Atomicity
//!
//! Every operation validates all of its preconditions before touching
//! state, and writes every invariant-bearing field (`status`, `winner`,
//! ledger balances) before the external custody transfer runs. If the
//! transfer fails, the pre-effect snapshot is restored — an operation
//! either commits completely or leaves zero observable effects.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auction::{AssetKind, Auction, AuctionStatus, Bid};
use crate::config::AuctionConfig;
use crate::custody::{AssetCustody, CustodyError};
use crate::events::Notification;
use crate::ledger::{DepositLedger, LedgerError};
use crate::time::{Clock, SystemClock};
use crate::verifier::{VerificationError, VerifierOracle};

/// Reason recorded when a seller cancels their own auction.
const CANCEL_REASON_SELLER: &str = "Cancelled by seller";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum AuctionError {
    /// The referenced auction does not exist.
    #[error("auction {0} not found")]
    AuctionNotFound(u64),

    /// A seller deposit of zero is disallowed.
    #[error("seller deposit must be > 0")]
    ZeroSellerDeposit,

    /// The value sent with creation does not cover the seller deposit.
    #[error("insufficient seller deposit: required {required}, supplied {supplied}")]
    InsufficientSellerDeposit {
        /// The declared seller deposit.
        required: u64,
        /// The value actually sent.
        supplied: u64,
    },

    /// The value sent with a bid does not cover the required deposit.
    #[error("insufficient bidder deposit: required {required}, supplied {supplied}")]
    InsufficientBidderDeposit {
        /// The auction's minimum bid deposit.
        required: u64,
        /// The value actually sent.
        supplied: u64,
    },

    /// The requested window is below the configured minimum.
    #[error("duration too short: {duration_secs}s is below the {min_secs}s minimum")]
    DurationTooShort {
        /// The requested duration.
        duration_secs: u64,
        /// The configured minimum.
        min_secs: u64,
    },

    /// The requested window is above the configured maximum.
    #[error("duration too long: {duration_secs}s is above the {max_secs}s maximum")]
    DurationTooLong {
        /// The requested duration.
        duration_secs: u64,
        /// The configured maximum.
        max_secs: u64,
    },

    /// The caller does not own the asset it tried to list.
    #[error("not token owner: {caller} does not own token {token_id}")]
    NotAssetOwner {
        /// The identity that attempted the listing.
        caller: String,
        /// The token it does not own.
        token_id: u64,
    },

    /// Sellers cannot bid on their own auctions.
    #[error("seller cannot bid")]
    SellerCannotBid,

    /// One bid per bidder per auction.
    #[error("already submitted a bid on auction {0}")]
    DuplicateBid(u64),

    /// The auction has already reached a terminal state.
    #[error("auction {0} is not active")]
    AuctionNotActive(u64),

    /// The bidding window has closed; the auction awaits finalization.
    #[error("bidding closed: auction {0} is past its end time")]
    BiddingClosed(u64),

    /// Finalization attempted before the window closed.
    #[error("auction still active until {end_time}")]
    StillActive {
        /// When the window closes.
        end_time: DateTime<Utc>,
    },

    /// The auction was already finalized or cancelled.
    #[error("already finalized")]
    AlreadyFinalized(u64),

    /// Cancellation is forbidden once any bid exists.
    #[error("cannot cancel auction with bids")]
    CancelWithBids {
        /// Number of bids blocking the cancellation.
        bid_count: usize,
    },

    /// Only the auction's seller may cancel it.
    #[error("not the auction seller")]
    NotAuctionSeller {
        /// The identity that attempted the cancellation.
        caller: String,
    },

    /// Only the registry owner may perform this operation.
    #[error("not the registry owner")]
    NotOwner {
        /// The identity that attempted the operation.
        caller: String,
    },

    /// The verifier oracle rejected a ciphertext or proof.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The asset custody collaborator failed.
    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// Deposit accounting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Coarse classification of [`AuctionError`], for callers that branch on
/// the failure class rather than the precise variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the authority for the operation.
    Authorization,
    /// Operation attempted in the wrong lifecycle state.
    State,
    /// Supplied or accounted funds are insufficient or invalid.
    Funds,
    /// A parameter fell outside its configured window.
    Bounds,
    /// Propagated verifier oracle failure.
    Verification,
    /// Propagated asset custody failure.
    Custody,
}

impl AuctionError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuctionError::NotAuctionSeller { .. }
            | AuctionError::SellerCannotBid
            | AuctionError::NotAssetOwner { .. }
            | AuctionError::NotOwner { .. } => ErrorKind::Authorization,
            AuctionError::AuctionNotFound(_)
            | AuctionError::AuctionNotActive(_)
            | AuctionError::BiddingClosed(_)
            | AuctionError::DuplicateBid(_)
            | AuctionError::StillActive { .. }
            | AuctionError::AlreadyFinalized(_)
            | AuctionError::CancelWithBids { .. } => ErrorKind::State,
            AuctionError::ZeroSellerDeposit
            | AuctionError::InsufficientSellerDeposit { .. }
            | AuctionError::InsufficientBidderDeposit { .. }
            | AuctionError::Ledger(_) => ErrorKind::Funds,
            AuctionError::DurationTooShort { .. } | AuctionError::DurationTooLong { .. } => {
                ErrorKind::Bounds
            }
            AuctionError::Verification(_) => ErrorKind::Verification,
            AuctionError::Custody(_) => ErrorKind::Custody,
        }
    }
}

// ---------------------------------------------------------------------------
// AuctionStore
// ---------------------------------------------------------------------------

/// Owned auction records: an ordered id→record map plus the monotonic id
/// counter. Injected into the registry at construction, never ambient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionStore {
    auctions: BTreeMap<u64, Auction>,
    /// Next id to assign. Starts at 1; only ever increases.
    next_id: u64,
    /// Seller → auctions they created, in creation order.
    by_seller: HashMap<String, Vec<u64>>,
}

impl AuctionStore {
    /// Creates an empty store. The first auction will be id 1.
    pub fn new() -> Self {
        Self {
            auctions: BTreeMap::new(),
            next_id: 1,
            by_seller: HashMap::new(),
        }
    }

    /// The id the next created auction will receive.
    pub fn next_auction_id(&self) -> u64 {
        self.next_id
    }

    /// Number of auctions ever created.
    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    /// Whether no auction has been created yet.
    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }

    /// Looks up an auction by id.
    pub fn get(&self, auction_id: u64) -> Option<&Auction> {
        self.auctions.get(&auction_id)
    }

    /// All auctions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    /// Ids of the auctions `seller` created, in creation order.
    pub fn by_seller(&self, seller: &str) -> Vec<u64> {
        self.by_seller.get(seller).cloned().unwrap_or_default()
    }

    pub(crate) fn get_mut(&mut self, auction_id: u64) -> Option<&mut Auction> {
        self.auctions.get_mut(&auction_id)
    }

    /// Commits a freshly built record. The record's id must be the one
    /// [`next_auction_id`](Self::next_auction_id) promised.
    pub(crate) fn insert(&mut self, auction: Auction) {
        debug_assert_eq!(auction.auction_id, self.next_id);
        self.next_id = auction.auction_id + 1;
        self.by_seller
            .entry(auction.seller.clone())
            .or_default()
            .push(auction.auction_id);
        self.auctions.insert(auction.auction_id, auction);
    }
}

impl Default for AuctionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// AuctionRegistry
// ---------------------------------------------------------------------------

/// The auction escrow engine. Composes the injected [`AuctionStore`],
/// the [`DepositLedger`], and the custody / verifier / clock
/// capabilities.
pub struct AuctionRegistry {
    owner: String,
    store: AuctionStore,
    ledger: DepositLedger,
    custody: Arc<dyn AssetCustody>,
    verifier: Arc<dyn VerifierOracle>,
    clock: Arc<dyn Clock>,
    config: AuctionConfig,
    notifications: Vec<Notification>,
}

impl AuctionRegistry {
    /// Creates a registry reading the system clock.
    pub fn new(
        owner: impl Into<String>,
        store: AuctionStore,
        custody: Arc<dyn AssetCustody>,
        verifier: Arc<dyn VerifierOracle>,
        config: AuctionConfig,
    ) -> Self {
        Self::with_clock(owner, store, custody, verifier, config, Arc::new(SystemClock))
    }

    /// Creates a registry with an explicit time source.
    pub fn with_clock(
        owner: impl Into<String>,
        store: AuctionStore,
        custody: Arc<dyn AssetCustody>,
        verifier: Arc<dyn VerifierOracle>,
        config: AuctionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            owner: owner.into(),
            store,
            ledger: DepositLedger::new(),
            custody,
            verifier,
            clock,
            config,
            notifications: Vec::new(),
        }
    }

    // -- mutations ----------------------------------------------------------

    /// Opens an auction: pulls the asset into escrow, holds the seller
    /// deposit, and records the listing. `value` is the native-currency
    /// amount sent with the call; any excess over `seller_deposit` is
    /// immediately credited back to the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn create_auction(
        &mut self,
        caller: &str,
        asset_contract: &str,
        token_id: u64,
        asset_kind: AssetKind,
        seller_deposit: u64,
        bidder_deposit: u64,
        duration_secs: u64,
        value: u64,
    ) -> Result<u64, AuctionError> {
        if seller_deposit == 0 {
            return Err(AuctionError::ZeroSellerDeposit);
        }
        if value < seller_deposit {
            return Err(AuctionError::InsufficientSellerDeposit {
                required: seller_deposit,
                supplied: value,
            });
        }
        if duration_secs < self.config.min_duration_secs {
            return Err(AuctionError::DurationTooShort {
                duration_secs,
                min_secs: self.config.min_duration_secs,
            });
        }
        if duration_secs > self.config.max_duration_secs {
            return Err(AuctionError::DurationTooLong {
                duration_secs,
                max_secs: self.config.max_duration_secs,
            });
        }
        let holder = self.custody.owner_of(asset_contract, token_id)?;
        if holder != caller {
            return Err(AuctionError::NotAssetOwner {
                caller: caller.to_string(),
                token_id,
            });
        }

        // The pull into escrow is this operation's only external call.
        // It runs after every check and before any engine state is
        // written, so a failure here leaves zero effects.
        self.custody
            .transfer_into(asset_contract, token_id, &self.config.escrow_account)?;

        let now = self.clock.now();
        let auction_id = self.store.next_auction_id();
        let ledger_undo = self.ledger.clone();
        let funds = self
            .ledger
            .escrow(auction_id, caller, seller_deposit)
            .and_then(|()| match value - seller_deposit {
                0 => Ok(()),
                excess => self.ledger.credit(caller, excess),
            });
        if let Err(err) = funds {
            // The registry must not keep custody of an asset whose
            // record never materialized: hand it back and report.
            self.ledger = ledger_undo;
            warn!(auction_id, error = %err, "auction creation rolled back");
            let _ = self.custody.transfer_out(asset_contract, token_id, caller);
            return Err(err.into());
        }

        let end_time = now + Duration::seconds(duration_secs as i64);
        self.store.insert(Auction {
            auction_id,
            seller: caller.to_string(),
            asset_contract: asset_contract.to_string(),
            token_id,
            asset_kind,
            seller_deposit,
            bidder_deposit,
            start_time: now,
            end_time,
            status: AuctionStatus::Active,
            bids: Vec::new(),
            winner: None,
            winning_bid: None,
        });
        self.notifications.push(Notification::AuctionCreated {
            auction_id,
            seller: caller.to_string(),
            asset_contract: asset_contract.to_string(),
            token_id,
            asset_kind,
            seller_deposit,
            bidder_deposit,
            end_time,
        });
        info!(
            auction_id,
            seller = %caller,
            asset_contract = %asset_contract,
            token_id,
            "auction created"
        );
        Ok(auction_id)
    }

    /// Accepts a sealed bid with its deposit. `value` is escrowed in
    /// full as the bid's deposit.
    pub fn submit_bid_with_deposit(
        &mut self,
        caller: &str,
        auction_id: u64,
        encrypted_payload: Vec<u8>,
        proof: Vec<u8>,
        value: u64,
    ) -> Result<(), AuctionError> {
        let now = self.clock.now();
        let auction = self
            .store
            .get(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        if !auction.is_active() {
            return Err(AuctionError::AuctionNotActive(auction_id));
        }
        if now >= auction.end_time {
            return Err(AuctionError::BiddingClosed(auction_id));
        }
        if auction.seller == caller {
            return Err(AuctionError::SellerCannotBid);
        }
        if auction.bid_from(caller).is_some() {
            return Err(AuctionError::DuplicateBid(auction_id));
        }
        if value < auction.bidder_deposit {
            return Err(AuctionError::InsufficientBidderDeposit {
                required: auction.bidder_deposit,
                supplied: value,
            });
        }

        self.ledger.escrow(auction_id, caller, value)?;
        let auction = self
            .store
            .get_mut(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        auction.bids.push(Bid {
            bidder: caller.to_string(),
            encrypted_payload: encrypted_payload.clone(),
            proof: proof.clone(),
            deposit_amount: value,
            timestamp: now,
        });
        debug!(
            auction_id,
            bidder = %caller,
            deposit = value,
            payload = %hex::encode(&encrypted_payload),
            "sealed bid accepted"
        );
        self.notifications.push(Notification::BidSubmitted {
            auction_id,
            bidder: caller.to_string(),
            encrypted_payload,
            proof,
            deposit_amount: value,
        });
        Ok(())
    }

    /// Settles an auction after its window closed. Callable by anyone,
    /// succeeds exactly once.
    ///
    /// With zero bids the asset and seller deposit go back to the
    /// seller. Otherwise the bids are decrypted through the oracle, the
    /// highest value wins (earlier bid on ties — the multi-bid rule
    /// still awaits confirmation from the oracle contract), the winning
    /// deposit becomes seller proceeds net of the auction fee, and every
    /// losing deposit is credited back in full.
    pub fn finalize_auction(&mut self, auction_id: u64) -> Result<(), AuctionError> {
        let now = self.clock.now();
        let auction = self
            .store
            .get(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        if auction.is_finalized() {
            return Err(AuctionError::AlreadyFinalized(auction_id));
        }
        if now < auction.end_time {
            return Err(AuctionError::StillActive {
                end_time: auction.end_time,
            });
        }

        // Decrypt before anything is mutated: an oracle failure aborts
        // the whole settlement with zero effects.
        let mut winner: Option<(String, u64)> = None;
        for bid in &auction.bids {
            let value = self.verifier.decrypt(&bid.encrypted_payload, &bid.proof)?;
            // Strict comparison keeps the earliest bid on equal values.
            match &winner {
                Some((_, best)) if value <= *best => {}
                _ => winner = Some((bid.bidder.clone(), value)),
            }
        }

        let seller = auction.seller.clone();
        let asset_contract = auction.asset_contract.clone();
        let token_id = auction.token_id;
        let winner_id = winner.as_ref().map(|(bidder, _)| bidder.clone());
        let winning_value = winner.as_ref().map(|(_, value)| *value);
        let losers: Vec<String> = auction
            .bids
            .iter()
            .map(|bid| bid.bidder.clone())
            .filter(|bidder| Some(bidder) != winner_id.as_ref())
            .collect();
        let snapshot = auction.clone();
        let ledger_undo = self.ledger.clone();

        // Effects: status, winner, and every ledger balance are written
        // before the asset leaves escrow.
        let auction = self
            .store
            .get_mut(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        auction.status = AuctionStatus::Finalized;
        auction.winner = winner_id.clone();
        auction.winning_bid = winning_value;

        if let Err(err) =
            self.settle_finalized_funds(auction_id, &seller, winner_id.as_deref(), &losers)
        {
            self.rollback(snapshot, ledger_undo);
            warn!(auction_id, error = %err, "finalization rolled back");
            return Err(err.into());
        }

        // Interaction: the custody transfer runs last.
        let recipient = winner_id.clone().unwrap_or_else(|| seller.clone());
        if let Err(err) = self.custody.transfer_out(&asset_contract, token_id, &recipient) {
            self.rollback(snapshot, ledger_undo);
            warn!(auction_id, error = %err, "finalization rolled back");
            return Err(err.into());
        }

        info!(
            auction_id,
            winner = ?winner_id,
            winning_bid = ?winning_value,
            "auction finalized"
        );
        self.notifications.push(Notification::AuctionFinalized {
            auction_id,
            winner: winner_id,
            winning_bid: winning_value,
        });
        Ok(())
    }

    /// Terminates a bidless auction. Seller-only; forbidden forever once
    /// any bid exists.
    pub fn cancel_auction(&mut self, caller: &str, auction_id: u64) -> Result<(), AuctionError> {
        let auction = self
            .store
            .get(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        if auction.seller != caller {
            return Err(AuctionError::NotAuctionSeller {
                caller: caller.to_string(),
            });
        }
        if auction.is_finalized() {
            return Err(AuctionError::AlreadyFinalized(auction_id));
        }
        if auction.bid_count() > 0 {
            return Err(AuctionError::CancelWithBids {
                bid_count: auction.bid_count(),
            });
        }

        let seller = auction.seller.clone();
        let asset_contract = auction.asset_contract.clone();
        let token_id = auction.token_id;
        let snapshot = auction.clone();
        let ledger_undo = self.ledger.clone();

        let auction = self
            .store
            .get_mut(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        auction.status = AuctionStatus::Cancelled;

        if let Err(err) = self.ledger.release(auction_id, &seller) {
            self.rollback(snapshot, ledger_undo);
            warn!(auction_id, error = %err, "cancellation rolled back");
            return Err(err.into());
        }
        if let Err(err) = self.custody.transfer_out(&asset_contract, token_id, &seller) {
            self.rollback(snapshot, ledger_undo);
            warn!(auction_id, error = %err, "cancellation rolled back");
            return Err(err.into());
        }

        info!(auction_id, seller = %seller, "auction cancelled");
        self.notifications.push(Notification::AuctionCancelled {
            auction_id,
            seller,
            reason: CANCEL_REASON_SELLER.to_string(),
        });
        Ok(())
    }

    /// Drains the caller's withdrawable credit and returns the amount.
    pub fn withdraw(&mut self, caller: &str) -> u64 {
        let amount = self.ledger.withdraw(caller);
        if amount > 0 {
            debug!(party = %caller, amount, "credit withdrawn");
        }
        amount
    }

    /// Drains accrued settlement fees. Registry-owner only.
    pub fn withdraw_fees(&mut self, caller: &str) -> Result<u64, AuctionError> {
        if caller != self.owner {
            return Err(AuctionError::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(self.ledger.take_fees())
    }

    // -- queries ------------------------------------------------------------

    /// Counts this auction's bids whose decrypted value strictly exceeds
    /// `threshold`, without revealing which bidder submitted which
    /// value. Read-only; delegates the aggregate to the oracle.
    pub fn reveal_auction_stats(
        &self,
        auction_id: u64,
        threshold: u64,
    ) -> Result<u64, AuctionError> {
        let auction = self
            .store
            .get(auction_id)
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        Ok(self
            .verifier
            .threshold_count(&auction.sealed_bids(), threshold)?)
    }

    /// Looks up an auction record.
    pub fn get_auction(&self, auction_id: u64) -> Option<&Auction> {
        self.store.get(auction_id)
    }

    /// The bids of an auction, in arrival order.
    pub fn get_auction_bids(&self, auction_id: u64) -> Option<&[Bid]> {
        self.store.get(auction_id).map(|a| a.bids.as_slice())
    }

    /// Ids of the auctions `identity` created, in creation order.
    pub fn get_user_auctions(&self, identity: &str) -> Vec<u64> {
        self.store.by_seller(identity)
    }

    /// The id the next created auction will receive.
    pub fn next_auction_id(&self) -> u64 {
        self.store.next_auction_id()
    }

    /// The registry deployment owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The configured settlement fee, in basis points.
    pub fn auction_fee_bps(&self) -> u32 {
        self.config.auction_fee_bps
    }

    /// The active configuration.
    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    /// `identity`'s current withdrawable credit.
    pub fn withdrawable(&self, identity: &str) -> u64 {
        self.ledger.credit_of(identity)
    }

    /// Settlement fees accrued and not yet collected.
    pub fn accrued_fees(&self) -> u64 {
        self.ledger.fees_accrued()
    }

    /// Escrow accounting, read-only.
    pub fn ledger(&self) -> &DepositLedger {
        &self.ledger
    }

    /// Notifications emitted so far and not yet drained.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drains the buffered notifications, in emission order.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // -- internals ----------------------------------------------------------

    fn settle_finalized_funds(
        &mut self,
        auction_id: u64,
        seller: &str,
        winner: Option<&str>,
        losers: &[String],
    ) -> Result<(), LedgerError> {
        for loser in losers {
            self.ledger.release(auction_id, loser)?;
        }
        if let Some(winner) = winner {
            self.ledger
                .award(auction_id, winner, seller, self.config.auction_fee_bps)?;
        }
        self.ledger.release(auction_id, seller)?;
        Ok(())
    }

    /// Restores the pre-effect snapshot of a settlement that failed at
    /// its external transfer.
    fn rollback(&mut self, snapshot: Auction, ledger: DepositLedger) {
        let auction_id = snapshot.auction_id;
        if let Some(slot) = self.store.get_mut(auction_id) {
            *slot = snapshot;
        }
        self.ledger = ledger;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ESCROW_ACCOUNT;
    use crate::custody::InMemoryCustody;
    use crate::time::ManualClock;
    use crate::verifier::PassthroughVerifier;

    const NFT: &str = "nft-contract";
    const HOUR: u64 = 3_600;
    const DAY: u64 = 86_400;
    /// 1.0 in base units.
    const ONE: u64 = 1_000_000_000;
    /// 0.1 in base units.
    const TENTH: u64 = 100_000_000;

    fn setup() -> (AuctionRegistry, Arc<InMemoryCustody>, Arc<ManualClock>) {
        let custody = Arc::new(InMemoryCustody::new());
        let clock = Arc::new(ManualClock::starting_now());
        let registry = AuctionRegistry::with_clock(
            "registry_owner",
            AuctionStore::new(),
            custody.clone(),
            Arc::new(PassthroughVerifier),
            AuctionConfig::default(),
            clock.clone(),
        );
        (registry, custody, clock)
    }

    fn list_token(custody: &InMemoryCustody, token_id: u64, owner: &str) {
        custody.mint(NFT, token_id, owner);
        custody
            .approve(owner, NFT, token_id, DEFAULT_ESCROW_ACCOUNT)
            .unwrap();
    }

    /// Creates a standard 7-day auction for `seller` over `token_id`.
    fn open_auction(
        registry: &mut AuctionRegistry,
        custody: &InMemoryCustody,
        seller: &str,
        token_id: u64,
    ) -> u64 {
        list_token(custody, token_id, seller);
        registry
            .create_auction(
                seller,
                NFT,
                token_id,
                AssetKind::Unique,
                ONE,
                TENTH,
                7 * DAY,
                ONE,
            )
            .unwrap()
    }

    fn bid(registry: &mut AuctionRegistry, bidder: &str, auction_id: u64, amount: u64) {
        let sealed = PassthroughVerifier::seal(amount);
        registry
            .submit_bid_with_deposit(bidder, auction_id, sealed.payload, sealed.proof, TENTH)
            .unwrap();
    }

    #[test]
    fn first_auction_gets_id_one() {
        let (mut registry, custody, _clock) = setup();
        assert_eq!(registry.next_auction_id(), 1);

        let id = open_auction(&mut registry, &custody, "seller", 1);
        assert_eq!(id, 1);
        assert_eq!(registry.next_auction_id(), 2);

        let auction = registry.get_auction(id).unwrap();
        assert!(auction.is_active());
        assert!(!auction.is_finalized());
        assert_eq!(auction.bid_count(), 0);
        assert_eq!(auction.seller, "seller");
    }

    #[test]
    fn creation_moves_asset_into_escrow() {
        let (mut registry, custody, _clock) = setup();
        open_auction(&mut registry, &custody, "seller", 1);
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), DEFAULT_ESCROW_ACCOUNT);
        assert_eq!(registry.ledger().held_for(1, "seller"), ONE);
    }

    #[test]
    fn zero_seller_deposit_rejected() {
        let (mut registry, custody, _clock) = setup();
        list_token(&custody, 1, "seller");
        let err = registry
            .create_auction("seller", NFT, 1, AssetKind::Unique, 0, TENTH, 7 * DAY, 0)
            .unwrap_err();
        assert!(matches!(err, AuctionError::ZeroSellerDeposit));
        assert_eq!(err.kind(), ErrorKind::Funds);
    }

    #[test]
    fn underfunded_creation_rejected_with_no_effect() {
        let (mut registry, custody, _clock) = setup();
        list_token(&custody, 1, "seller");
        let err = registry
            .create_auction(
                "seller",
                NFT,
                1,
                AssetKind::Unique,
                ONE,
                TENTH,
                7 * DAY,
                ONE / 2,
            )
            .unwrap_err();
        assert!(matches!(err, AuctionError::InsufficientSellerDeposit { .. }));
        assert_eq!(err.kind(), ErrorKind::Funds);

        // Nothing created, nothing moved.
        assert_eq!(registry.next_auction_id(), 1);
        assert!(registry.get_auction(1).is_none());
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), "seller");
    }

    #[test]
    fn duration_bounds_enforced() {
        let (mut registry, custody, _clock) = setup();
        list_token(&custody, 1, "seller");

        let err = registry
            .create_auction("seller", NFT, 1, AssetKind::Unique, ONE, TENTH, 60, ONE)
            .unwrap_err();
        assert!(matches!(err, AuctionError::DurationTooShort { .. }));
        assert_eq!(err.kind(), ErrorKind::Bounds);

        let err = registry
            .create_auction(
                "seller",
                NFT,
                1,
                AssetKind::Unique,
                ONE,
                TENTH,
                31 * DAY,
                ONE,
            )
            .unwrap_err();
        assert!(matches!(err, AuctionError::DurationTooLong { .. }));
        assert_eq!(err.kind(), ErrorKind::Bounds);

        // Both observed-accepted windows pass.
        registry
            .create_auction("seller", NFT, 1, AssetKind::Unique, ONE, TENTH, DAY, ONE)
            .unwrap();
    }

    #[test]
    fn non_owner_cannot_list() {
        let (mut registry, custody, _clock) = setup();
        custody.mint(NFT, 1, "alice");
        let err = registry
            .create_auction(
                "mallory",
                NFT,
                1,
                AssetKind::Unique,
                ONE,
                TENTH,
                7 * DAY,
                ONE,
            )
            .unwrap_err();
        assert!(matches!(err, AuctionError::NotAssetOwner { .. }));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn unapproved_listing_fails_before_any_state_change() {
        let (mut registry, custody, _clock) = setup();
        custody.mint(NFT, 1, "seller");
        // No approval of the escrow account.
        let err = registry
            .create_auction("seller", NFT, 1, AssetKind::Unique, ONE, TENTH, 7 * DAY, ONE)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Custody);
        assert_eq!(registry.next_auction_id(), 1);
        assert_eq!(registry.ledger().total_held(1), 0);
    }

    #[test]
    fn excess_creation_value_is_withdrawable() {
        let (mut registry, custody, _clock) = setup();
        list_token(&custody, 1, "seller");
        registry
            .create_auction(
                "seller",
                NFT,
                1,
                AssetKind::Unique,
                ONE,
                TENTH,
                7 * DAY,
                ONE + TENTH,
            )
            .unwrap();
        assert_eq!(registry.withdrawable("seller"), TENTH);
        assert_eq!(registry.withdraw("seller"), TENTH);
        assert_eq!(registry.withdraw("seller"), 0);
    }

    #[test]
    fn bid_appends_and_escrows() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 500);

        let auction = registry.get_auction(id).unwrap();
        assert_eq!(auction.bid_count(), 1);
        let bids = registry.get_auction_bids(id).unwrap();
        assert_eq!(bids[0].bidder, "alice");
        assert_eq!(bids[0].deposit_amount, TENTH);
        assert_eq!(registry.ledger().held_for(id, "alice"), TENTH);
    }

    #[test]
    fn seller_cannot_bid() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        let sealed = PassthroughVerifier::seal(1);
        let err = registry
            .submit_bid_with_deposit("seller", id, sealed.payload, sealed.proof, TENTH)
            .unwrap_err();
        assert!(matches!(err, AuctionError::SellerCannotBid));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn second_bid_from_same_identity_rejected() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 500);

        let sealed = PassthroughVerifier::seal(600);
        let err = registry
            .submit_bid_with_deposit("alice", id, sealed.payload, sealed.proof, TENTH)
            .unwrap_err();
        assert!(matches!(err, AuctionError::DuplicateBid(_)));
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(registry.get_auction(id).unwrap().bid_count(), 1);
    }

    #[test]
    fn underfunded_bid_rejected() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        let sealed = PassthroughVerifier::seal(500);
        let err = registry
            .submit_bid_with_deposit("alice", id, sealed.payload, sealed.proof, TENTH - 1)
            .unwrap_err();
        assert!(matches!(err, AuctionError::InsufficientBidderDeposit { .. }));
        assert_eq!(err.kind(), ErrorKind::Funds);
    }

    #[test]
    fn bid_after_window_rejected() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        clock.advance_secs(7 * DAY + 1);

        let sealed = PassthroughVerifier::seal(500);
        let err = registry
            .submit_bid_with_deposit("alice", id, sealed.payload, sealed.proof, TENTH)
            .unwrap_err();
        assert!(matches!(err, AuctionError::BiddingClosed(_)));
    }

    #[test]
    fn bid_on_unknown_auction_rejected() {
        let (mut registry, _custody, _clock) = setup();
        let sealed = PassthroughVerifier::seal(500);
        let err = registry
            .submit_bid_with_deposit("alice", 9, sealed.payload, sealed.proof, TENTH)
            .unwrap_err();
        assert!(matches!(err, AuctionError::AuctionNotFound(9)));
    }

    #[test]
    fn finalize_before_end_rejected() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        let err = registry.finalize_auction(id).unwrap_err();
        assert!(matches!(err, AuctionError::StillActive { .. }));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn finalize_with_zero_bids_returns_everything_to_seller() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        clock.advance_secs(7 * DAY);

        registry.finalize_auction(id).unwrap();

        let auction = registry.get_auction(id).unwrap();
        assert!(auction.is_finalized());
        assert_eq!(auction.winner, None);
        assert_eq!(auction.winning_bid, None);
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), "seller");
        assert_eq!(registry.withdrawable("seller"), ONE);
        assert_eq!(registry.accrued_fees(), 0);
    }

    #[test]
    fn finalize_single_bid_awards_winner() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 500);
        clock.advance_secs(7 * DAY);

        registry.finalize_auction(id).unwrap();

        let auction = registry.get_auction(id).unwrap();
        assert_eq!(auction.winner.as_deref(), Some("alice"));
        assert_eq!(auction.winning_bid, Some(500));
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), "alice");

        // Winner's deposit became seller proceeds net of the fee;
        // the seller's own deposit came back in full.
        let fee = crate::config::basis_points(TENTH, registry.auction_fee_bps());
        assert_eq!(registry.withdrawable("seller"), ONE + TENTH - fee);
        assert_eq!(registry.accrued_fees(), fee);
        assert_eq!(registry.withdrawable("alice"), 0);
    }

    #[test]
    fn finalize_multiple_bids_highest_decrypted_value_wins() {
        // Winner rule: highest decrypted value, earliest bid on ties.
        // The oracle contract has not pinned down the multi-bid rule;
        // revisit if it lands differently.
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 300);
        bid(&mut registry, "bob", id, 900);
        bid(&mut registry, "carol", id, 700);
        clock.advance_secs(7 * DAY);

        registry.finalize_auction(id).unwrap();

        let auction = registry.get_auction(id).unwrap();
        assert_eq!(auction.winner.as_deref(), Some("bob"));
        assert_eq!(auction.winning_bid, Some(900));
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), "bob");

        // Losing deposits refunded in full.
        assert_eq!(registry.withdrawable("alice"), TENTH);
        assert_eq!(registry.withdrawable("carol"), TENTH);
        assert_eq!(registry.withdrawable("bob"), 0);
    }

    #[test]
    fn equal_bids_resolve_to_earliest() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 500);
        bid(&mut registry, "bob", id, 500);
        clock.advance_secs(7 * DAY);

        registry.finalize_auction(id).unwrap();
        assert_eq!(
            registry.get_auction(id).unwrap().winner.as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn finalize_twice_rejected() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        clock.advance_secs(7 * DAY);
        registry.finalize_auction(id).unwrap();

        let err = registry.finalize_auction(id).unwrap_err();
        assert!(matches!(err, AuctionError::AlreadyFinalized(_)));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn bad_proof_aborts_finalization_with_no_effect() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        registry
            .submit_bid_with_deposit("alice", id, 500u64.to_le_bytes().to_vec(), Vec::new(), TENTH)
            .unwrap();
        clock.advance_secs(7 * DAY);

        let err = registry.finalize_auction(id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);

        // Still active, deposits still held, asset still in escrow.
        let auction = registry.get_auction(id).unwrap();
        assert!(auction.is_active());
        assert_eq!(registry.ledger().held_for(id, "alice"), TENTH);
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), DEFAULT_ESCROW_ACCOUNT);
    }

    #[test]
    fn cancel_returns_asset_and_deposit() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);

        registry.cancel_auction("seller", id).unwrap();

        let auction = registry.get_auction(id).unwrap();
        assert!(auction.is_finalized());
        assert!(!auction.is_active());
        assert_eq!(auction.status, AuctionStatus::Cancelled);
        assert_eq!(custody.owner_of(NFT, 1).unwrap(), "seller");
        assert_eq!(registry.withdrawable("seller"), ONE);
    }

    #[test]
    fn non_seller_cannot_cancel() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        let err = registry.cancel_auction("mallory", id).unwrap_err();
        assert!(matches!(err, AuctionError::NotAuctionSeller { .. }));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn cancel_with_bids_rejected_permanently() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 500);

        let err = registry.cancel_auction("seller", id).unwrap_err();
        assert!(matches!(err, AuctionError::CancelWithBids { bid_count: 1 }));

        // Still forbidden later in the window.
        clock.advance_secs(3 * DAY);
        assert!(registry.cancel_auction("seller", id).is_err());
    }

    #[test]
    fn reveal_stats_counts_above_threshold() {
        let (mut registry, custody, _clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 300);
        bid(&mut registry, "bob", id, 900);
        bid(&mut registry, "carol", id, 700);

        assert_eq!(registry.reveal_auction_stats(id, 500).unwrap(), 2);
        assert_eq!(registry.reveal_auction_stats(id, 900).unwrap(), 0);
        assert_eq!(registry.reveal_auction_stats(id, 0).unwrap(), 3);
    }

    #[test]
    fn user_auctions_track_creations_in_order() {
        let (mut registry, custody, _clock) = setup();
        open_auction(&mut registry, &custody, "seller", 1);
        open_auction(&mut registry, &custody, "other", 2);
        open_auction(&mut registry, &custody, "seller", 3);

        assert_eq!(registry.get_user_auctions("seller"), vec![1, 3]);
        assert_eq!(registry.get_user_auctions("other"), vec![2]);
        assert!(registry.get_user_auctions("nobody").is_empty());
    }

    #[test]
    fn fee_withdrawal_is_owner_gated() {
        let (mut registry, custody, clock) = setup();
        let id = open_auction(&mut registry, &custody, "seller", 1);
        bid(&mut registry, "alice", id, 500);
        clock.advance_secs(7 * DAY);
        registry.finalize_auction(id).unwrap();

        let err = registry.withdraw_fees("mallory").unwrap_err();
        assert!(matches!(err, AuctionError::NotOwner { .. }));
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let fee = crate::config::basis_points(TENTH, registry.auction_fee_bps());
        assert_eq!(registry.withdraw_fees("registry_owner").unwrap(), fee);
        assert_eq!(registry.accrued_fees(), 0);
    }

    #[test]
    fn shorter_min_duration_config_is_honored() {
        let custody = Arc::new(InMemoryCustody::new());
        let clock = Arc::new(ManualClock::starting_now());
        let config = AuctionConfig {
            min_duration_secs: HOUR / 2,
            ..AuctionConfig::default()
        };
        let mut registry = AuctionRegistry::with_clock(
            "registry_owner",
            AuctionStore::new(),
            custody.clone(),
            Arc::new(PassthroughVerifier),
            config,
            clock,
        );
        list_token(&custody, 1, "seller");
        registry
            .create_auction(
                "seller",
                NFT,
                1,
                AssetKind::Unique,
                ONE,
                TENTH,
                HOUR / 2,
                ONE,
            )
            .unwrap();
    }
}
