//! Marketplace layer for tallybook
//!
//! This crate implements the domain facades:
//! - Commission Ledger: rate configuration, aggregate stats, sale splitting
//! - Mock Gateway: in-process payment authorization
//! - Checkout: authorize-then-record settlement flow
//! - Theme Settings: lenient storefront display configuration
//!
//! All facades are stateless over a shared storage handle.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod checkout;
pub mod ledger;
pub mod payment;
pub mod theme;

// Re-exports
pub use checkout::{Checkout, CheckoutError, SettledOrder};
pub use ledger::{CommissionLedger, CONFIG_KEY, STATS_KEY};
pub use payment::{CardDetails, MockGateway, PaymentError, PaymentReceipt, ALWAYS_DECLINE_CARD};
pub use theme::{Layout, ThemeSettings};
