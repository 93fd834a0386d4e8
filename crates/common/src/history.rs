//! Expected audit entries in a business's payment history

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::format_currency_gbp;
use crate::types::{DocumentKind, QuoteType};

/// Event that produced a payment history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    Create,
    Accept,
    Stripe,
    Marked,
}

impl std::fmt::Display for HistoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryMode::Create => write!(f, "create"),
            HistoryMode::Accept => write!(f, "accept"),
            HistoryMode::Stripe => write!(f, "stripe"),
            HistoryMode::Marked => write!(f, "marked"),
        }
    }
}

/// One payment history entry keyed by `(document, mode, plan)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub document: DocumentKind,
    pub mode: HistoryMode,
    pub plan: QuoteType,
    pub amount: Decimal,
    #[serde(default)]
    pub employees: Option<u32>,
}

impl PaymentHistory {
    pub fn new(document: DocumentKind, mode: HistoryMode, plan: QuoteType, amount: Decimal) -> Self {
        Self {
            document,
            mode,
            plan,
            amount,
            employees: None,
        }
    }

    pub fn with_employees(mut self, employees: u32) -> Self {
        self.employees = Some(employees);
        self
    }

    /// Heading of the entry. Quotes can only be created or accepted; invoices
    /// can be created, paid through Stripe, or marked as paid.
    pub fn header(&self) -> Result<&'static str> {
        match (self.document, self.mode) {
            (DocumentKind::Quote, HistoryMode::Create) => Ok("Quote Created"),
            (DocumentKind::Quote, HistoryMode::Accept) => Ok("Quote Accepted"),
            (DocumentKind::Invoice, HistoryMode::Create) => Ok("Invoice Created"),
            (DocumentKind::Invoice, HistoryMode::Stripe) => Ok("Payment Received"),
            (DocumentKind::Invoice, HistoryMode::Marked) => Ok("Marked As Paid"),
            (DocumentKind::Quote, HistoryMode::Stripe | HistoryMode::Marked)
            | (DocumentKind::Invoice, HistoryMode::Accept) => {
                Err(Error::InvalidHistoryCombination {
                    document: self.document.to_string(),
                    mode: self.mode.to_string(),
                })
            }
        }
    }

    /// Every line the History tab must show for this entry
    pub fn expected_lines(&self) -> Result<Vec<String>> {
        let mut lines = vec![
            self.header()?.to_string(),
            format!("- Plan Type: {}", self.plan.plan_label()),
            format!("- Amount: {}", format_currency_gbp(self.amount)),
        ];

        if matches!(self.mode, HistoryMode::Stripe | HistoryMode::Marked) {
            if let Some(employees) = self.employees {
                lines.push(format!("- Employees: {employees}"));
            }
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    fn amount() -> Decimal {
        Decimal::from_str("1234.5").unwrap()
    }

    #[test_case(DocumentKind::Quote, HistoryMode::Create, "Quote Created")]
    #[test_case(DocumentKind::Quote, HistoryMode::Accept, "Quote Accepted")]
    #[test_case(DocumentKind::Invoice, HistoryMode::Create, "Invoice Created")]
    #[test_case(DocumentKind::Invoice, HistoryMode::Stripe, "Payment Received")]
    #[test_case(DocumentKind::Invoice, HistoryMode::Marked, "Marked As Paid")]
    fn test_headers(document: DocumentKind, mode: HistoryMode, expected: &str) {
        let entry = PaymentHistory::new(document, mode, QuoteType::Create, amount());
        assert_eq!(entry.header().unwrap(), expected);
    }

    #[test_case(DocumentKind::Quote, HistoryMode::Stripe)]
    #[test_case(DocumentKind::Quote, HistoryMode::Marked)]
    #[test_case(DocumentKind::Invoice, HistoryMode::Accept)]
    fn test_invalid_combinations(document: DocumentKind, mode: HistoryMode) {
        let entry = PaymentHistory::new(document, mode, QuoteType::Renew, amount());
        assert!(matches!(
            entry.expected_lines(),
            Err(Error::InvalidHistoryCombination { .. })
        ));
    }

    #[test]
    fn test_quote_created_lines() {
        let lines = PaymentHistory::new(DocumentKind::Quote, HistoryMode::Create, QuoteType::Expand, amount())
            .expected_lines()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "Quote Created".to_string(),
                "- Plan Type: Expand Team".to_string(),
                "- Amount: £ 1,234.50".to_string(),
            ]
        );
    }

    #[test]
    fn test_payment_lines_include_employees() {
        let lines = PaymentHistory::new(DocumentKind::Invoice, HistoryMode::Stripe, QuoteType::Create, amount())
            .with_employees(42)
            .expected_lines()
            .unwrap();
        assert_eq!(lines.last().unwrap(), "- Employees: 42");

        let lines = PaymentHistory::new(DocumentKind::Invoice, HistoryMode::Create, QuoteType::Create, amount())
            .with_employees(42)
            .expected_lines()
            .unwrap();
        assert_eq!(lines.len(), 3);
    }
}
