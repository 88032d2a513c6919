//! Commission ledger
//!
//! Single source of truth for the platform commission rate and the running
//! financial aggregates. Two records back it, one per storage key: the
//! configuration and the stats.
//!
//! # Design
//!
//! CommissionLedger is a stateless facade - it holds only an Arc<dyn Storage>
//! reference. Multiple ledger instances sharing the same store see the same
//! records. Clone is cheap (just Arc clone).
//!
//! Every mutation is a compare-and-swap loop: read the record with its
//! version, compute the update, write back expecting that version, and on
//! conflict re-read and retry. Concurrent sales serialize through this loop,
//! so no recorded sale is ever lost to an interleaved read-modify-write and
//! `total_volume == platform_revenue + vendor_payouts` holds exactly.
//!
//! Decode policy is strict: a config or stats record that fails to decode
//! surfaces as a persistence error. Only true absence bootstraps defaults.

use rust_decimal::Decimal;
use std::sync::Arc;
use tally_core::{
    decode_record, encode_record, rate_in_range, split_sale, CommissionConfig, Expected,
    LedgerError, LedgerResult, MarketplaceStats, SaleBreakdown, Storage,
};
use tracing::{debug, info};

/// Storage key holding the commission configuration record.
pub const CONFIG_KEY: &str = "ledger/config";
/// Storage key holding the aggregate stats record.
pub const STATS_KEY: &str = "ledger/stats";

/// Commission ledger facade
///
/// # Thread Safety
///
/// CommissionLedger is Clone and Send + Sync. Multiple instances sharing the
/// same store reference see the same records (no local state).
#[derive(Clone)]
pub struct CommissionLedger {
    /// Storage backend (shared)
    store: Arc<dyn Storage>,
}

impl CommissionLedger {
    /// Create a ledger facade over a shared storage backend.
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Get the commission configuration.
    ///
    /// Creates and persists the default configuration (rate 10) on first
    /// read. A corrupt stored record is a persistence error, never replaced
    /// with the default.
    pub fn config(&self) -> LedgerResult<CommissionConfig> {
        Ok(self.config_versioned()?.0)
    }

    /// Change the platform commission rate.
    ///
    /// Rejects rates outside `0..=100` with [`LedgerError::InvalidRate`] and
    /// leaves the stored configuration unchanged. Existing stats keep their
    /// creation-time rate snapshot; only future splits use the new rate.
    pub fn set_commission_rate(&self, rate: Decimal) -> LedgerResult<CommissionConfig> {
        if !rate_in_range(rate) {
            return Err(LedgerError::InvalidRate { rate });
        }
        loop {
            let (mut config, version) = self.config_versioned()?;
            let previous = config.commission_rate;
            config.commission_rate = rate;
            let data = encode_record(CONFIG_KEY, &config)?;
            match self.store.put(CONFIG_KEY, data, Expected::Version(version)) {
                Ok(_) => {
                    info!(%previous, %rate, "commission rate changed");
                    return Ok(config);
                }
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Get the aggregate stats.
    ///
    /// Creates and persists a zeroed aggregate stamped with the current
    /// config's commission rate on first read. The stamp freezes at creation
    /// time; later rate changes do not rewrite it.
    pub fn stats(&self) -> LedgerResult<MarketplaceStats> {
        loop {
            if let Some(record) = self.store.get(STATS_KEY)? {
                return Ok(decode_record(STATS_KEY, &record.data)?);
            }
            let config = self.config()?;
            let stats = MarketplaceStats::zeroed(config.commission_rate);
            let data = encode_record(STATS_KEY, &stats)?;
            match self.store.put(STATS_KEY, data, Expected::Absent) {
                Ok(_) => {
                    debug!(rate = %stats.commission_rate, "bootstrapped marketplace stats");
                    return Ok(stats);
                }
                // Lost the bootstrap race; read what the winner wrote.
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Record one completed sale and return its split.
    ///
    /// Commission is `amount * rate / 100` rounded half-up to 2 decimal
    /// places; vendor net is `amount - commission`, never rounded on its
    /// own. The three aggregates grow by the split's parts in one atomic
    /// record write.
    ///
    /// Fails with [`LedgerError::InvalidAmount`] for `amount <= 0` before
    /// touching storage, and for amounts too large to split or fold into
    /// the aggregates. Conflicts with concurrent sales retry internally
    /// and never escape.
    pub fn record_sale(&self, amount: Decimal) -> LedgerResult<SaleBreakdown> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }
        loop {
            // Re-read config each attempt: a rate change mid-retry applies
            // to this sale.
            let config = self.config()?;
            let Some(split) = split_sale(amount, config.commission_rate) else {
                return Err(LedgerError::InvalidAmount { amount });
            };

            let (stats, expected) = match self.store.get(STATS_KEY)? {
                Some(record) => {
                    let stats: MarketplaceStats = decode_record(STATS_KEY, &record.data)?;
                    (stats, Expected::Version(record.version))
                }
                None => (
                    MarketplaceStats::zeroed(config.commission_rate),
                    Expected::Absent,
                ),
            };
            let Some(stats) = stats.apply(&split) else {
                return Err(LedgerError::InvalidAmount { amount });
            };

            let data = encode_record(STATS_KEY, &stats)?;
            match self.store.put(STATS_KEY, data, expected) {
                Ok(_) => {
                    debug!(
                        total = %split.total,
                        commission = %split.commission,
                        vendor_net = %split.vendor_net,
                        "sale recorded"
                    );
                    return Ok(split);
                }
                Err(e) if e.is_conflict() => {
                    debug!(key = STATS_KEY, "stats write conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the config with its record version, bootstrapping the default
    /// on first touch.
    fn config_versioned(&self) -> LedgerResult<(CommissionConfig, u64)> {
        loop {
            if let Some(record) = self.store.get(CONFIG_KEY)? {
                let config = decode_record(CONFIG_KEY, &record.data)?;
                return Ok((config, record.version));
            }
            let config = CommissionConfig::default();
            let data = encode_record(CONFIG_KEY, &config)?;
            match self.store.put(CONFIG_KEY, data, Expected::Absent) {
                Ok(version) => {
                    info!(rate = %config.commission_rate, "bootstrapped commission config");
                    return Ok((config, version));
                }
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl std::fmt::Debug for CommissionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommissionLedger").finish_non_exhaustive()
    }
}
