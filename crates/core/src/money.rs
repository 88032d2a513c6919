//! Monetary arithmetic for commission splits.
//!
//! Amounts and rates are [`rust_decimal::Decimal`]; floats are never used
//! for money. Commission is rounded to [`MONEY_DP`] places half-away-from-zero
//! and the vendor net is derived by subtraction, so
//! `total == commission + vendor_net` holds exactly for every split.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places used for stored currency amounts.
pub const MONEY_DP: u32 = 2;

/// Lowest legal commission rate, in percent.
pub const RATE_MIN: Decimal = Decimal::ZERO;

/// Highest legal commission rate, in percent.
pub const RATE_MAX: Decimal = Decimal::ONE_HUNDRED;

/// Per-transaction result of splitting one sale.
///
/// Returned to the caller of `record_sale`; never persisted (the ledger
/// keeps running aggregates only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleBreakdown {
    /// Full sale amount.
    pub total: Decimal,
    /// Portion retained by the platform.
    pub commission: Decimal,
    /// Portion credited to the vendor.
    pub vendor_net: Decimal,
}

/// Round a currency amount to [`MONEY_DP`] places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `rate` is a legal commission percentage.
pub fn rate_in_range(rate: Decimal) -> bool {
    rate >= RATE_MIN && rate <= RATE_MAX
}

/// Split one sale into commission and vendor net.
///
/// `commission = round_money(amount * rate / 100)`, clamped to `amount` so a
/// sub-cent total can never round the vendor net negative. The vendor net is
/// `amount - commission`, never rounded on its own.
///
/// Returns `None` when `amount * rate` leaves the decimal range. Callers
/// validate `amount > 0` and `rate` in range before calling.
pub fn split_sale(amount: Decimal, rate: Decimal) -> Option<SaleBreakdown> {
    let scaled = amount.checked_mul(rate)? / Decimal::ONE_HUNDRED;
    let commission = round_money(scaled).min(amount);
    let vendor_net = amount - commission;
    Some(SaleBreakdown {
        total: amount,
        commission,
        vendor_net,
    })
}
