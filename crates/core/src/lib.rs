//! Core layer for tallybook
//!
//! This crate holds everything the ledger and its storage backends agree on:
//! - Money arithmetic: banker-free half-up rounding and sale splitting
//! - Records: the persisted configuration and aggregate types
//! - Storage protocol: versioned records with compare-and-swap writes
//! - Errors: the storage and ledger failure taxonomy
//!
//! Higher layers depend on this crate only; backends and the ledger never
//! depend on each other directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod error;
pub mod money;
pub mod records;
pub mod traits;

// Re-exports
pub use error::{LedgerError, LedgerResult, StorageError, StorageResult};
pub use money::{rate_in_range, round_money, split_sale, SaleBreakdown, MONEY_DP};
pub use records::{decode_record, encode_record, CommissionConfig, MarketplaceStats};
pub use traits::{Expected, Storage, VersionedRecord};

// The money type used throughout the ledger.
pub use rust_decimal::Decimal;
