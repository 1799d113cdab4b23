/// Payment processor collaborator — card token in, confirmation out.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Cards issued today expire at most this many years out.
const MAX_EXPIRY_YEARS: u16 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Bad card input; blocks the checkout step.
    #[error("card validation failed: {0}")]
    Validation(String),
    /// Declined or network failure; shown to the user, never auto-retried.
    #[error("payment processor error: {0}")]
    Processor(String),
}

/// Raw card fields as entered in the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
    pub postal_code: String,
}

impl CardDetails {
    /// Client-side checks run before tokenization. A card is good
    /// through the end of its expiry month.
    pub fn validate(&self, today_year: u16, today_month: u8) -> Result<(), PaymentError> {
        let digits: String = self
            .number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if !(12..=19).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::Validation(
                "card number must be 12-19 digits".to_string(),
            ));
        }
        if !luhn_valid(&digits) {
            return Err(PaymentError::Validation("card number failed checksum".to_string()));
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err(PaymentError::Validation("expiry month must be 1-12".to_string()));
        }
        if (self.exp_year, self.exp_month) < (today_year, today_month) {
            return Err(PaymentError::Validation("card has expired".to_string()));
        }
        if self.exp_year > today_year.saturating_add(MAX_EXPIRY_YEARS) {
            return Err(PaymentError::Validation("expiry year is not plausible".to_string()));
        }
        if !(3..=4).contains(&self.cvc.len()) || !self.cvc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::Validation("CVC must be 3 or 4 digits".to_string()));
        }
        if self.postal_code.trim().is_empty() {
            return Err(PaymentError::Validation("postal code is required".to_string()));
        }
        Ok(())
    }
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        let mut d = u32::from(b - b'0');
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// Opaque single-use token issued by the processor's client SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardToken(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub payment_id: String,
    pub status: ChargeStatus,
    pub amount_cents: u64,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub refund_id: String,
    pub payment_id: String,
    pub amount_cents: u64,
}

pub trait PaymentProcessor {
    fn tokenize_card(&mut self, card: &CardDetails) -> Result<CardToken, PaymentError>;
    fn charge(&mut self, token: &CardToken, amount_cents: u64) -> Result<Charge, PaymentError>;
    fn refund(&mut self, payment_id: &str, amount_cents: u64) -> Result<Refund, PaymentError>;
}

/// In-process processor for tests and local demos. Tokens are single
/// use; refunds are capped at the amount charged.
#[derive(Debug)]
pub struct InMemoryProcessor {
    today: (u16, u8),
    tokens: BTreeSet<String>,
    charges: BTreeMap<String, Charge>,
    refunded: BTreeMap<String, u64>,
    next_id: u64,
    declining: bool,
}

impl InMemoryProcessor {
    /// A processor whose calendar reads `year`/`month` for expiry checks.
    pub fn new(year: u16, month: u8) -> Self {
        Self {
            today: (year, month),
            tokens: BTreeSet::new(),
            charges: BTreeMap::new(),
            refunded: BTreeMap::new(),
            next_id: 0,
            declining: false,
        }
    }

    /// Decline every charge until switched back.
    pub fn set_declining(&mut self, declining: bool) {
        self.declining = declining;
    }

    pub fn charges(&self) -> impl Iterator<Item = &Charge> {
        self.charges.values()
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

impl PaymentProcessor for InMemoryProcessor {
    fn tokenize_card(&mut self, card: &CardDetails) -> Result<CardToken, PaymentError> {
        card.validate(self.today.0, self.today.1)?;
        let token = self.next_id("tok");
        self.tokens.insert(token.clone());
        Ok(CardToken(token))
    }

    fn charge(&mut self, token: &CardToken, amount_cents: u64) -> Result<Charge, PaymentError> {
        if amount_cents == 0 {
            return Err(PaymentError::Validation("charge amount must be positive".to_string()));
        }
        if !self.tokens.remove(&token.0) {
            return Err(PaymentError::Processor("unknown or used card token".to_string()));
        }
        if self.declining {
            debug!(amount_cents, "charge declined");
            return Err(PaymentError::Processor("card declined".to_string()));
        }
        let payment_id = self.next_id("pay");
        let charge = Charge {
            receipt_url: Some(format!("https://receipts.example.com/{payment_id}")),
            payment_id: payment_id.clone(),
            status: ChargeStatus::Completed,
            amount_cents,
        };
        self.charges.insert(payment_id, charge.clone());
        debug!(payment_id = %charge.payment_id, amount_cents, "charge completed");
        Ok(charge)
    }

    fn refund(&mut self, payment_id: &str, amount_cents: u64) -> Result<Refund, PaymentError> {
        let charged = self
            .charges
            .get(payment_id)
            .map(|c| c.amount_cents)
            .ok_or_else(|| PaymentError::Processor(format!("unknown payment: {payment_id}")))?;
        let already = self.refunded.get(payment_id).copied().unwrap_or(0);
        if amount_cents == 0 || already.saturating_add(amount_cents) > charged {
            return Err(PaymentError::Processor(format!(
                "refund of {amount_cents} exceeds refundable balance of {}",
                charged - already
            )));
        }
        self.refunded
            .insert(payment_id.to_string(), already + amount_cents);
        Ok(Refund {
            refund_id: self.next_id("ref"),
            payment_id: payment_id.to_string(),
            amount_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardDetails {
        CardDetails {
            number: "4111 1111 1111 1111".to_string(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".to_string(),
            postal_code: "78701".to_string(),
        }
    }

    #[test]
    fn valid_card_passes() {
        assert_eq!(card().validate(2026, 10), Ok(()));
    }

    #[test]
    fn checksum_failure() {
        let bad = CardDetails {
            number: "4111 1111 1111 1112".to_string(),
            ..card()
        };
        assert!(matches!(
            bad.validate(2026, 10),
            Err(PaymentError::Validation(m)) if m.contains("checksum")
        ));
    }

    #[test]
    fn rejects_bad_month_cvc_and_postal() {
        assert!(CardDetails { exp_month: 13, ..card() }.validate(2026, 10).is_err());
        assert!(CardDetails { cvc: "12a".to_string(), ..card() }.validate(2026, 10).is_err());
        assert!(CardDetails { postal_code: " ".to_string(), ..card() }.validate(2026, 10).is_err());
        assert!(CardDetails { number: "4111".to_string(), ..card() }.validate(2026, 10).is_err());
    }

    #[test]
    fn expired_card_is_rejected() {
        let expired = CardDetails { exp_month: 1, exp_year: 2001, ..card() };
        assert!(matches!(
            expired.validate(2026, 10),
            Err(PaymentError::Validation(m)) if m.contains("expired")
        ));
        let last_month = CardDetails { exp_month: 9, exp_year: 2026, ..card() };
        assert!(last_month.validate(2026, 10).is_err());
        assert!(CardDetails { exp_year: 0, ..card() }.validate(2026, 10).is_err());
    }

    #[test]
    fn card_expiring_this_month_is_accepted() {
        let this_month = CardDetails { exp_month: 10, exp_year: 2026, ..card() };
        assert_eq!(this_month.validate(2026, 10), Ok(()));
    }

    #[test]
    fn far_future_expiry_is_rejected() {
        let far = CardDetails { exp_year: 2099, ..card() };
        assert!(matches!(
            far.validate(2026, 10),
            Err(PaymentError::Validation(m)) if m.contains("plausible")
        ));
        assert_eq!(CardDetails { exp_year: 2046, ..card() }.validate(2026, 10), Ok(()));
    }

    #[test]
    fn tokenize_charge_and_refund() {
        let mut processor = InMemoryProcessor::new(2026, 10);
        let token = processor.tokenize_card(&card()).unwrap();
        let charge = processor.charge(&token, 28_500).unwrap();
        assert_eq!(charge.status, ChargeStatus::Completed);
        assert_eq!(charge.amount_cents, 28_500);
        assert!(charge.receipt_url.is_some());

        let refund = processor.refund(&charge.payment_id, 10_000).unwrap();
        assert_eq!(refund.payment_id, charge.payment_id);
        assert_eq!(refund.amount_cents, 10_000);
        assert_eq!(processor.charges().count(), 1);
    }

    #[test]
    fn tokenize_rejects_invalid_card() {
        let mut processor = InMemoryProcessor::new(2026, 10);
        let expired = CardDetails { exp_year: 2020, ..card() };
        assert!(matches!(
            processor.tokenize_card(&expired),
            Err(PaymentError::Validation(_))
        ));
    }

    #[test]
    fn declined_charge_is_processor_error() {
        let mut processor = InMemoryProcessor::new(2026, 10);
        let token = processor.tokenize_card(&card()).unwrap();
        processor.set_declining(true);
        assert_eq!(
            processor.charge(&token, 5_000),
            Err(PaymentError::Processor("card declined".to_string()))
        );
        assert_eq!(processor.charges().count(), 0);
    }

    #[test]
    fn token_is_single_use() {
        let mut processor = InMemoryProcessor::new(2026, 10);
        let token = processor.tokenize_card(&card()).unwrap();
        processor.charge(&token, 5_000).unwrap();
        assert!(matches!(
            processor.charge(&token, 5_000),
            Err(PaymentError::Processor(_))
        ));
        assert!(matches!(
            processor.charge(&CardToken("tok_forged".to_string()), 5_000),
            Err(PaymentError::Processor(_))
        ));
    }

    #[test]
    fn refund_cannot_exceed_charge() {
        let mut processor = InMemoryProcessor::new(2026, 10);
        let token = processor.tokenize_card(&card()).unwrap();
        let charge = processor.charge(&token, 5_000).unwrap();
        processor.refund(&charge.payment_id, 3_000).unwrap();
        assert!(matches!(
            processor.refund(&charge.payment_id, 3_000),
            Err(PaymentError::Processor(_))
        ));
        assert!(processor.refund(&charge.payment_id, 2_000).is_ok());
        assert!(matches!(
            processor.refund("pay_missing", 100),
            Err(PaymentError::Processor(_))
        ));
    }
}
