//! Checkout settlement flow
//!
//! The one caller allowed to record sales: authorize payment first, record
//! the sale second. Payment failures abort before the ledger is touched, so
//! the aggregates only ever reflect paid orders.

use rust_decimal::Decimal;
use tally_core::{LedgerError, SaleBreakdown};
use thiserror::Error;
use tracing::info;

use crate::ledger::CommissionLedger;
use crate::payment::{CardDetails, MockGateway, PaymentError, PaymentReceipt};

/// Why a settlement failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The charge was refused; nothing was recorded.
    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),
    /// Payment succeeded but the sale could not be recorded.
    #[error("sale recording failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// A fully settled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledOrder {
    /// Receipt from the payment gateway.
    pub receipt: PaymentReceipt,
    /// Commission split recorded in the ledger.
    pub breakdown: SaleBreakdown,
}

/// Order settlement facade
///
/// Cheap to clone; all clones share the underlying ledger state.
#[derive(Debug, Clone)]
pub struct Checkout {
    /// Ledger receiving recorded sales
    ledger: CommissionLedger,
    /// Payment processor
    gateway: MockGateway,
}

impl Checkout {
    /// Build a checkout over a ledger and a gateway.
    pub fn new(ledger: CommissionLedger, gateway: MockGateway) -> Self {
        Self { ledger, gateway }
    }

    /// Charge the card, then record the sale.
    ///
    /// Calls `record_sale` exactly once per authorized charge and never for
    /// refused ones.
    pub fn settle(
        &self,
        amount: Decimal,
        card: &CardDetails,
    ) -> Result<SettledOrder, CheckoutError> {
        let receipt = self.gateway.authorize(amount, card)?;
        let breakdown = self.ledger.record_sale(amount)?;
        info!(
            reference = %receipt.reference,
            total = %breakdown.total,
            commission = %breakdown.commission,
            "order settled"
        );
        Ok(SettledOrder { receipt, breakdown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::STATS_KEY;
    use crate::payment::ALWAYS_DECLINE_CARD;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tally_core::{Expected, Storage};
    use tally_storage::MemoryStore;

    fn setup_checkout() -> (Arc<MemoryStore>, Checkout) {
        let store = Arc::new(MemoryStore::new());
        let ledger = CommissionLedger::new(store.clone());
        (store, Checkout::new(ledger, MockGateway::new()))
    }

    fn good_card() -> CardDetails {
        CardDetails::new("4242424242424242", 12, 2099)
    }

    #[test]
    fn test_settle_records_exactly_once() {
        let (store, checkout) = setup_checkout();
        let order = checkout.settle(dec!(100), &good_card()).unwrap();

        assert_eq!(order.breakdown.total, dec!(100));
        assert_eq!(order.breakdown.commission, dec!(10));
        assert_eq!(order.receipt.amount, dec!(100));

        let ledger = CommissionLedger::new(store);
        let stats = ledger.stats().unwrap();
        assert_eq!(stats.total_volume, dec!(100));
    }

    #[test]
    fn test_declined_payment_never_reaches_ledger() {
        let (store, checkout) = setup_checkout();
        let card = CardDetails::new(ALWAYS_DECLINE_CARD, 12, 2099);

        let err = checkout.settle(dec!(100), &card).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Payment(PaymentError::Declined)
        ));

        // No stats record was ever created.
        assert!(store.get(STATS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_invalid_amount_fails_at_payment() {
        let (store, checkout) = setup_checkout();
        let err = checkout.settle(dec!(0), &good_card()).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Payment(PaymentError::InvalidAmount { .. })
        ));
        assert!(store.get(STATS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_ledger_failure_after_payment_propagates() {
        let (store, checkout) = setup_checkout();
        store
            .put(STATS_KEY, b"corrupted".to_vec(), Expected::Any)
            .unwrap();

        let err = checkout.settle(dec!(100), &good_card()).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Ledger(LedgerError::Persistence { .. })
        ));
    }
}
