//! Tallybook - an embedded commission ledger for multi-vendor marketplaces
//!
//! Tallybook tracks one commission rate and the running financial aggregates
//! of a marketplace: total volume, platform revenue, and vendor payouts.
//! Recording a sale splits it between platform and vendor and folds the
//! split into the aggregates atomically, so
//! `total_volume == platform_revenue + vendor_payouts` holds exactly, even
//! with concurrent writers.
//!
//! # Quick start
//!
//! ```ignore
//! use tallybook::Tallybook;
//! use rust_decimal_macros::dec;
//!
//! let book = Tallybook::open("marketplace.json")?;
//! let ledger = book.ledger();
//!
//! ledger.set_commission_rate(dec!(12.5))?;
//! let split = ledger.record_sale(dec!(100))?;
//! assert_eq!(split.commission + split.vendor_net, split.total);
//!
//! let stats = ledger.stats()?;
//! println!("volume so far: {}", stats.total_volume);
//! # Ok::<(), tallybook::LedgerError>(())
//! ```
//!
//! # Architecture
//!
//! - `tally-core`: money arithmetic, record types, errors, the storage trait
//! - `tally-storage`: in-memory and file-backed versioned stores
//! - `tally-marketplace`: the ledger, checkout, payment, and theme facades
//! - `tallybook` (this crate): the facade tying them together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;

use std::path::Path;
use std::sync::Arc;

pub use types::*;

/// Handle to a commission ledger and its storage backend.
///
/// Cheap to clone; all clones share the same backend. Facades created from
/// the same handle see the same records.
#[derive(Clone)]
pub struct Tallybook {
    /// Shared storage backend
    store: Arc<dyn Storage>,
}

impl Tallybook {
    /// Open a file-backed ledger at `path`, creating it on first use.
    ///
    /// Fails if an existing snapshot at `path` cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let store = FileStore::open(path.as_ref())?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    /// Open a ledger that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Open a ledger over a caller-provided storage backend.
    pub fn with_store(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Commission ledger facade over this handle's backend.
    pub fn ledger(&self) -> CommissionLedger {
        CommissionLedger::new(self.store.clone())
    }

    /// Checkout facade wiring the ledger to the mock payment gateway.
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.ledger(), MockGateway::new())
    }
}

impl std::fmt::Debug for Tallybook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tallybook").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_memory_handles_share_state() {
        let book = Tallybook::in_memory();
        let clone = book.clone();

        book.ledger().record_sale(dec!(40)).unwrap();
        let stats = clone.ledger().stats().unwrap();
        assert_eq!(stats.total_volume, dec!(40));
    }

    #[test]
    fn test_with_store_injection() {
        let store = Arc::new(MemoryStore::new());
        let book = Tallybook::with_store(store.clone());

        book.ledger().record_sale(dec!(10)).unwrap();
        assert!(store.get(STATS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_checkout_uses_same_backend() {
        let book = Tallybook::in_memory();
        let card = CardDetails::new("4242424242424242", 12, 2099);

        book.checkout().settle(dec!(25), &card).unwrap();
        assert_eq!(book.ledger().stats().unwrap().total_volume, dec!(25));
    }
}
