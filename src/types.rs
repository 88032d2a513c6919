//! Public types for the tallybook unified API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Public API types - these are what users should use
// ============================================================================

// Money and record types
pub use tally_core::Decimal;
pub use tally_core::{CommissionConfig, MarketplaceStats, SaleBreakdown};

// Error taxonomy
pub use tally_core::{LedgerError, LedgerResult, StorageError, StorageResult};

// Storage protocol and backends
pub use tally_core::{Expected, Storage, VersionedRecord};
pub use tally_storage::{FileStore, MemoryStore};

// Domain facades
pub use tally_marketplace::{
    CardDetails, Checkout, CheckoutError, CommissionLedger, Layout, MockGateway, PaymentError,
    PaymentReceipt, SettledOrder, ThemeSettings, ALWAYS_DECLINE_CARD,
};

// Storage key layout (advanced use: direct backend access)
pub use tally_marketplace::{CONFIG_KEY, STATS_KEY};
