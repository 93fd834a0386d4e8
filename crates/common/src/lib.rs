//! CRM E2E Common Library
//!
//! Data model, synthetic data, formatting and business rules shared by the
//! browser flows and the CLI. Nothing in here touches a browser.

pub mod config;
pub mod error;
pub mod format;
pub mod generators;
pub mod history;
pub mod quote;
pub mod retry;
pub mod types;

// Re-export commonly used types
pub use config::SuiteConfig;
pub use error::{Error, Result};
pub use history::{HistoryMode, PaymentHistory};
pub use quote::{plan_option_steps, QuoteStage, QuoteTotals};
pub use retry::{pick_unique, Claim};
pub use types::*;

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
