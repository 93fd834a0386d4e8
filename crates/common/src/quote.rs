//! Quote and invoice business rules.
//!
//! The plan-type dropdown has no stable ids, so the create flow selects an
//! option by pressing ArrowDown a fixed number of times. The tables below are
//! the only mapping from [`QuoteType`] to that position; if the CRM reorders
//! the dropdown these tables (and their tests) must change with it.

use chrono::{Local, NaiveDate};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::round_money;
use crate::generators::{lorem_sentence, random_date_with, DEFAULT_DAYS_RANGE};
use crate::types::{DateDirection, Discount, QuoteData, QuoteType};

/// VAT rate applied by the CRM to every quote and invoice
pub const VAT_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Largest amount the quote form accepts, in pence
const MAX_AMOUNT_PENCE: i64 = 8_333_333;

/// Number of ArrowDown presses selecting `plan` in the plan-type dropdown.
///
/// With `create_exists` the dropdown offers all four plans; without it the
/// "Create" option is absent and the remaining plans shift up.
pub fn plan_option_steps(plan: QuoteType, create_exists: bool) -> Result<u32> {
    let steps = if create_exists {
        match plan {
            QuoteType::Activate => Some(1),
            QuoteType::Renew => Some(2),
            QuoteType::Expand => Some(3),
            QuoteType::Create => Some(4),
        }
    } else {
        match plan {
            QuoteType::Renew => Some(1),
            QuoteType::Expand => Some(2),
            QuoteType::Activate => Some(3),
            QuoteType::Create => None,
        }
    };

    steps.ok_or(Error::InvalidQuoteOption {
        plan,
        create_exists,
    })
}

/// VAT and total the CRM must display for an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub amount: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
}

impl QuoteTotals {
    /// `vat = round(amount * 0.2, 2)`, `total = round(amount * 1.2, 2)`
    pub fn for_amount(amount: Decimal) -> Self {
        Self {
            amount: round_money(amount),
            vat: round_money(amount * VAT_RATE),
            total: round_money(amount * (Decimal::ONE + VAT_RATE)),
        }
    }
}

impl QuoteData {
    pub fn totals(&self) -> QuoteTotals {
        QuoteTotals::for_amount(self.amount)
    }
}

/// Terms for a new quote or invoice dated relative to today
pub fn generate_quote_data() -> QuoteData {
    generate_quote_data_with(&mut rand::thread_rng(), Local::now().date_naive())
}

pub fn generate_quote_data_with<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> QuoteData {
    let amount_pence = rng.gen_range(100..=MAX_AMOUNT_PENCE);
    let amount = Decimal::new(amount_pence, 2);

    let start = random_date_with(rng, today, DateDirection::Past, DEFAULT_DAYS_RANGE);
    let mut end = random_date_with(rng, today, DateDirection::Future, DEFAULT_DAYS_RANGE);
    // Both offsets may be zero; the period must still span at least a day.
    if end <= start {
        end = start + chrono::Duration::days(1);
    }

    let discount = if rng.gen_bool(0.5) {
        Some(Discount {
            amount: Decimal::new(rng.gen_range(100..=amount_pence), 2),
            note: lorem_sentence(rng, 3),
        })
    } else {
        None
    };

    QuoteData {
        date: random_date_with(rng, today, DateDirection::Past, 7),
        start,
        end,
        employees: rng.gen_range(10..=99_999),
        amount,
        discount,
    }
}

/// Validate quote terms typed in by hand (CLI, fixtures)
pub fn validate_quote_data(data: &QuoteData) -> Result<()> {
    if data.amount <= Decimal::ZERO || data.amount.scale() > 2 {
        return Err(Error::InvalidAmount(format!(
            "amount must be positive with at most 2 decimals, got {}",
            data.amount
        )));
    }
    if data.start >= data.end {
        return Err(Error::InvalidPeriod {
            start: data.start,
            end: data.end,
        });
    }
    if let Some(discount) = &data.discount {
        if discount.amount <= Decimal::ZERO || discount.amount > data.amount {
            return Err(Error::InvalidAmount(format!(
                "discount {} must be within (0, {}]",
                discount.amount, data.amount
            )));
        }
    }
    Ok(())
}

/// Position of a quote/invoice in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStage {
    Draft,
    Saved,
    Sent,
    Accepted,
    Invoiced,
    InvoiceSent,
    Paid,
    MarkedPaid,
}

impl QuoteStage {
    /// Move to `next`, rejecting anything off the
    /// `Draft → Saved → (Sent →) Accepted → Invoiced → (InvoiceSent →) Paid|MarkedPaid` path
    pub fn advance(self, next: QuoteStage) -> Result<QuoteStage> {
        use QuoteStage::*;

        let allowed = matches!(
            (self, next),
            (Draft, Saved)
                | (Saved, Sent)
                | (Saved, Accepted)
                | (Sent, Accepted)
                | (Accepted, Invoiced)
                | (Invoiced, InvoiceSent)
                | (Invoiced, Paid)
                | (Invoiced, MarkedPaid)
                | (InvoiceSent, Paid)
                | (InvoiceSent, MarkedPaid)
        );

        if allowed {
            Ok(next)
        } else {
            Err(Error::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, QuoteStage::Paid | QuoteStage::MarkedPaid)
    }
}

impl std::fmt::Display for QuoteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteStage::Draft => write!(f, "draft"),
            QuoteStage::Saved => write!(f, "saved"),
            QuoteStage::Sent => write!(f, "sent"),
            QuoteStage::Accepted => write!(f, "accepted"),
            QuoteStage::Invoiced => write!(f, "invoiced"),
            QuoteStage::InvoiceSent => write!(f, "invoice_sent"),
            QuoteStage::Paid => write!(f, "paid"),
            QuoteStage::MarkedPaid => write!(f, "marked_paid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_currency_gbp;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(QuoteType::Activate, 1)]
    #[test_case(QuoteType::Renew, 2)]
    #[test_case(QuoteType::Expand, 3)]
    #[test_case(QuoteType::Create, 4)]
    fn test_steps_with_existing_create(plan: QuoteType, steps: u32) {
        assert_eq!(plan_option_steps(plan, true).unwrap(), steps);
    }

    #[test_case(QuoteType::Renew, 1)]
    #[test_case(QuoteType::Expand, 2)]
    #[test_case(QuoteType::Activate, 3)]
    fn test_steps_without_create(plan: QuoteType, steps: u32) {
        assert_eq!(plan_option_steps(plan, false).unwrap(), steps);
    }

    #[test]
    fn test_create_unavailable_without_create_option() {
        let err = plan_option_steps(QuoteType::Create, false).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidQuoteOption {
                plan: QuoteType::Create,
                create_exists: false
            }
        ));
        let message = err.to_string();
        assert!(message.contains("Create"));
        assert!(message.contains("create_exists=false"));
    }

    #[test]
    fn test_totals() {
        let totals = QuoteTotals::for_amount(Decimal::from_str("1234.56").unwrap());
        assert_eq!(totals.vat, Decimal::from_str("246.91").unwrap());
        assert_eq!(totals.total, Decimal::from_str("1481.47").unwrap());
        assert_eq!(format_currency_gbp(totals.total), "£ 1,481.47");
    }

    #[test]
    fn test_totals_round_half_away_from_zero() {
        // 0.125 * 0.2 = 0.025 sits exactly on the midpoint
        let totals = QuoteTotals::for_amount(Decimal::from_str("0.125").unwrap());
        assert_eq!(totals.vat, Decimal::from_str("0.03").unwrap());
        assert_eq!(totals.total, Decimal::from_str("0.15").unwrap());
    }

    #[test]
    fn test_generated_quote_invariants() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut saw_discount = false;
        let mut saw_plain = false;
        for _ in 0..500 {
            let data = generate_quote_data_with(&mut rng, today);
            validate_quote_data(&data).unwrap();
            assert!(data.start < data.end);
            assert!(data.date <= today);
            assert!((10..=99_999).contains(&data.employees));
            assert!(data.amount >= Decimal::ONE);
            assert!(data.amount <= Decimal::from_str("83333.33").unwrap());
            match &data.discount {
                Some(d) => {
                    saw_discount = true;
                    assert!(d.amount <= data.amount);
                    assert!(!d.note.is_empty());
                }
                None => saw_plain = true,
            }
        }
        assert!(saw_discount && saw_plain);
    }

    #[test]
    fn test_validate_rejects_large_discount() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut data = generate_quote_data_with(&mut StdRng::seed_from_u64(1), today);
        data.discount = Some(Discount {
            amount: data.amount + Decimal::ONE,
            note: "too much".to_string(),
        });
        assert!(matches!(
            validate_quote_data(&data),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_period() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut data = generate_quote_data_with(&mut StdRng::seed_from_u64(2), today);
        data.end = data.start;
        assert!(matches!(
            validate_quote_data(&data),
            Err(Error::InvalidPeriod { start, end }) if start == end
        ));

        data.start = data.end + chrono::Days::new(3);
        assert!(matches!(
            validate_quote_data(&data),
            Err(Error::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_lifecycle_quote_path() {
        let stage = QuoteStage::Draft
            .advance(QuoteStage::Saved)
            .and_then(|s| s.advance(QuoteStage::Sent))
            .and_then(|s| s.advance(QuoteStage::Accepted))
            .and_then(|s| s.advance(QuoteStage::Invoiced))
            .and_then(|s| s.advance(QuoteStage::InvoiceSent))
            .and_then(|s| s.advance(QuoteStage::Paid))
            .unwrap();
        assert!(stage.is_settled());
    }

    #[test]
    fn test_lifecycle_marked_paid_without_sending() {
        let stage = QuoteStage::Invoiced.advance(QuoteStage::MarkedPaid).unwrap();
        assert_eq!(stage, QuoteStage::MarkedPaid);
    }

    #[test_case(QuoteStage::Draft, QuoteStage::Accepted)]
    #[test_case(QuoteStage::Saved, QuoteStage::Paid)]
    #[test_case(QuoteStage::Paid, QuoteStage::MarkedPaid)]
    #[test_case(QuoteStage::Accepted, QuoteStage::Saved)]
    fn test_lifecycle_rejects(from: QuoteStage, to: QuoteStage) {
        assert!(matches!(
            from.advance(to),
            Err(Error::InvalidStateTransition { .. })
        ));
    }
}
