//! # Obscura Marketplace Contracts
//!
//! Contract layer for the Obscura sealed-bid marketplace. Sellers lock a
//! non-fungible asset and a deposit, bidders lock deposits alongside
//! encrypted bids, and once the auction window closes the engine settles
//! custody of the asset and the disposition of every deposit in a single
//! deterministic transition:
//!
//! - **Auction Registry** — the escrow state machine: creation, sealed
//!   bidding, finalization, cancellation, and the query surface.
//! - **Deposit Ledger** — per-auction escrow with pull-payment credits,
//!   so settlement never pays out mid-operation.
//! - **Liquidity Pool** — an independent fee-processing pool with its
//!   own balance and its own owner-configured oracle.
//! - **Capabilities** — asset custody, the verifier oracle that opens
//!   sealed bids, and the clock, all behind traits the execution
//!   environment wires up.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do
//!    not mix.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. Checks, then effects, then interactions: every invariant-bearing
//!    field is written before an external transfer runs, and a failed
//!    transfer restores the pre-effect snapshot.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod auction;
pub mod config;
pub mod custody;
pub mod events;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod time;
pub mod verifier;
