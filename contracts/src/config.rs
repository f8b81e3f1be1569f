//! # Contract Configuration & Constants
//!
//! Every tunable the contracts depend on lives here: auction window
//! bounds, fee rates, and the escrow account identity. Deployments
//! override the runtime knobs through [`AuctionConfig`]; the constants
//! are the defaults a fresh deployment starts from.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Auction window bounds
// ---------------------------------------------------------------------------

/// Shortest auction window a seller can open, in seconds. One hour.
/// Anything below this is rejected as "duration too short".
pub const MIN_AUCTION_DURATION_SECS: u64 = 3_600;

/// Longest auction window, in seconds. Thirty days. A 31-day window is
/// rejected as "duration too long".
pub const MAX_AUCTION_DURATION_SECS: u64 = 30 * 86_400;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Fee unit: 1 basis point = 0.01%. All fee rates in the contracts are
/// denominated in basis points of this denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default auction settlement fee, taken from the winning deposit before
/// it is credited to the seller. 250 bps = 2.50%.
pub const DEFAULT_AUCTION_FEE_BPS: u32 = 250;

/// Default processing fee for the liquidity pool. 100 bps = 1.00%.
pub const DEFAULT_PROCESSING_FEE_BPS: u32 = 100;

/// Identity under which the registry holds assets and deposits in escrow.
pub const DEFAULT_ESCROW_ACCOUNT: &str = "obscura-escrow";

/// Computes `amount * bps / 10_000`, rounding down. The widening to
/// `u128` keeps the intermediate product from overflowing.
pub fn basis_points(amount: u64, bps: u32) -> u64 {
    ((amount as u128 * bps as u128) / BPS_DENOMINATOR as u128) as u64
}

/// The outcome of applying a fee to a gross amount: `net + fee == gross`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Amount remaining after the fee.
    pub net: u64,
    /// Amount taken as the fee.
    pub fee: u64,
}

impl FeeSplit {
    /// Splits `gross` at the given rate. A rate above 10 000 bps is
    /// clamped so the fee never exceeds the gross amount.
    pub fn of(gross: u64, bps: u32) -> Self {
        let fee = basis_points(gross, bps).min(gross);
        Self {
            net: gross - fee,
            fee,
        }
    }
}

// ---------------------------------------------------------------------------
// AuctionConfig
// ---------------------------------------------------------------------------

/// Per-deployment auction parameters. `Default` mirrors the constants
/// above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Minimum accepted auction duration, in seconds.
    pub min_duration_secs: u64,
    /// Maximum accepted auction duration, in seconds.
    pub max_duration_secs: u64,
    /// Settlement fee on the winning deposit, in basis points.
    pub auction_fee_bps: u32,
    /// Identity that holds escrowed assets while auctions run.
    pub escrow_account: String,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: MIN_AUCTION_DURATION_SECS,
            max_duration_secs: MAX_AUCTION_DURATION_SECS,
            auction_fee_bps: DEFAULT_AUCTION_FEE_BPS,
            escrow_account: DEFAULT_ESCROW_ACCOUNT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_points_rounds_down() {
        assert_eq!(basis_points(10_000, 250), 250);
        assert_eq!(basis_points(999, 250), 24); // 24.975 floored
        assert_eq!(basis_points(0, 250), 0);
        assert_eq!(basis_points(10_000, 0), 0);
    }

    #[test]
    fn basis_points_survives_large_amounts() {
        // u64::MAX * 10_000 overflows u64; the u128 widening must not.
        assert_eq!(basis_points(u64::MAX, 10_000), u64::MAX);
    }

    #[test]
    fn fee_split_conserves_gross() {
        let split = FeeSplit::of(1_000_000, 250);
        assert_eq!(split.net + split.fee, 1_000_000);
        assert_eq!(split.fee, 25_000);
    }

    #[test]
    fn fee_split_clamps_excessive_rate() {
        let split = FeeSplit::of(100, 20_000);
        assert_eq!(split.fee, 100);
        assert_eq!(split.net, 0);
    }

    #[test]
    fn default_config_matches_constants() {
        let config = AuctionConfig::default();
        assert_eq!(config.min_duration_secs, MIN_AUCTION_DURATION_SECS);
        assert_eq!(config.max_duration_secs, MAX_AUCTION_DURATION_SECS);
        assert_eq!(config.auction_fee_bps, DEFAULT_AUCTION_FEE_BPS);
    }
}
