//! Persisted ledger records.
//!
//! Two records back the whole ledger: [`CommissionConfig`] (the live
//! commission rate) and [`MarketplaceStats`] (running financial aggregates).
//! Both serialize to JSON, one object per storage key. Decoding is strict:
//! a record that fails to decode is reported as corrupt, never replaced
//! with defaults.

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::money::SaleBreakdown;

/// Marketplace commission configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionConfig {
    /// Percentage of each sale retained by the platform (`0..=100`).
    pub commission_rate: Decimal,
}

impl CommissionConfig {
    /// Platform commission applied when no configuration has been stored.
    pub const DEFAULT_RATE: Decimal = Decimal::TEN;
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            commission_rate: Self::DEFAULT_RATE,
        }
    }
}

/// Running financial aggregates across every recorded sale.
///
/// Invariant: `total_volume == platform_revenue + vendor_payouts`, exactly.
/// Splits derive the vendor net by subtraction, so the identity survives any
/// sequence of applied sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceStats {
    /// Sum of all sale amounts ever recorded.
    pub total_volume: Decimal,
    /// Sum of all commissions taken.
    pub platform_revenue: Decimal,
    /// Sum of all amounts credited to vendors.
    pub vendor_payouts: Decimal,
    /// Commission rate observed when this aggregate was first created.
    /// Frozen at creation; later configuration changes do not rewrite it.
    pub commission_rate: Decimal,
}

impl MarketplaceStats {
    /// Fresh aggregate with zero volume, stamped with `commission_rate`.
    pub fn zeroed(commission_rate: Decimal) -> Self {
        Self {
            total_volume: Decimal::ZERO,
            platform_revenue: Decimal::ZERO,
            vendor_payouts: Decimal::ZERO,
            commission_rate,
        }
    }

    /// Fold one sale split into the running totals.
    ///
    /// Returns `None` when any aggregate would leave the decimal range, with
    /// nothing applied.
    pub fn apply(self, split: &SaleBreakdown) -> Option<MarketplaceStats> {
        Some(MarketplaceStats {
            total_volume: self.total_volume.checked_add(split.total)?,
            platform_revenue: self.platform_revenue.checked_add(split.commission)?,
            vendor_payouts: self.vendor_payouts.checked_add(split.vendor_net)?,
            commission_rate: self.commission_rate,
        })
    }

    /// True when the volume identity holds exactly.
    pub fn balanced(&self) -> bool {
        self.total_volume == self.platform_revenue + self.vendor_payouts
    }
}

/// Encode a record as JSON bytes for storage under `key`.
pub fn encode_record<T: Serialize>(key: &str, record: &T) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| StorageError::corrupt(key, format!("encode failed: {e}")))
}

/// Strictly decode a record read from storage under `key`.
pub fn decode_record<T: DeserializeOwned>(key: &str, data: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(data)
        .map_err(|e| StorageError::corrupt(key, format!("decode failed: {e}")))
}
