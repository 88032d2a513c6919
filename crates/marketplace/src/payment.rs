//! Mock payment gateway
//!
//! In-process stand-in for a card processor. Checkout authorizes a charge
//! here before any sale reaches the ledger, so failed payments never touch
//! the aggregates. Validation covers amount, card number shape plus Luhn
//! checksum, and expiry; one designated test card always declines.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Card number that always declines, for exercising the failure path.
pub const ALWAYS_DECLINE_CARD: &str = "4000000000000002";

/// Card details presented at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    /// Card number; spaces and hyphens are tolerated.
    pub number: String,
    /// Expiry month, `1..=12`.
    pub expiry_month: u8,
    /// Four-digit expiry year.
    pub expiry_year: u16,
}

impl CardDetails {
    /// Build card details from their parts.
    pub fn new(number: impl Into<String>, expiry_month: u8, expiry_year: u16) -> Self {
        Self {
            number: number.into(),
            expiry_month,
            expiry_year,
        }
    }
}

/// Proof of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Gateway reference for this charge.
    pub reference: Uuid,
    /// Amount captured.
    pub amount: Decimal,
    /// When the charge was captured.
    pub captured_at: chrono::DateTime<Utc>,
}

/// Reasons a charge is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Charge amount was zero or negative.
    #[error("charge amount must be positive, got {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
    },
    /// Card number is malformed or fails its checksum.
    #[error("card number failed validation")]
    InvalidCard,
    /// Card expiry lies in the past or is not a real month.
    #[error("card expired {month:02}/{year}")]
    Expired {
        /// Expiry month as presented.
        month: u8,
        /// Expiry year as presented.
        year: u16,
    },
    /// Issuer declined the charge.
    #[error("card was declined by the issuer")]
    Declined,
}

/// Mock card processor
///
/// Stateless; every call validates the charge from scratch. Clone is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGateway;

impl MockGateway {
    /// Create a gateway.
    pub fn new() -> Self {
        Self
    }

    /// Authorize a charge against a card.
    ///
    /// Returns a receipt with a fresh reference on success. Declines are
    /// final; nothing is retried here.
    pub fn authorize(
        &self,
        amount: Decimal,
        card: &CardDetails,
    ) -> Result<PaymentReceipt, PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount { amount });
        }

        let digits = card_digits(&card.number).ok_or(PaymentError::InvalidCard)?;
        if !luhn_valid(&digits) {
            return Err(PaymentError::InvalidCard);
        }

        let now = Utc::now();
        let month_valid = (1..=12).contains(&card.expiry_month);
        let in_past = (i32::from(card.expiry_year), u32::from(card.expiry_month))
            < (now.year(), now.month());
        if !month_valid || in_past {
            return Err(PaymentError::Expired {
                month: card.expiry_month,
                year: card.expiry_year,
            });
        }

        if digits == ALWAYS_DECLINE_CARD {
            return Err(PaymentError::Declined);
        }

        let receipt = PaymentReceipt {
            reference: Uuid::new_v4(),
            amount,
            captured_at: now,
        };
        debug!(reference = %receipt.reference, %amount, "payment authorized");
        Ok(receipt)
    }
}

/// Strip separators and accept only 12-19 digit numbers.
fn card_digits(number: &str) -> Option<String> {
    let cleaned: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if (12..=19).contains(&cleaned.len()) && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        Some(cleaned)
    } else {
        None
    }
}

/// Luhn checksum over an all-digit string.
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, ch) in digits.chars().rev().enumerate() {
        let Some(d) = ch.to_digit(10) else {
            return false;
        };
        let d = if i % 2 == 1 {
            let doubled = d * 2;
            if doubled > 9 {
                doubled - 9
            } else {
                doubled
            }
        } else {
            d
        };
        sum += d;
    }
    sum % 10 == 0
}
