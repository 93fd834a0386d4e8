//! Error types for the CRM end-to-end suite

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::QuoteType;

/// Result type alias using the suite's common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pure logic layer (data, tables, config, retries)
#[derive(Error, Debug)]
pub enum Error {
    #[error("Quote option \"{plan}\" not available when create_exists={create_exists}")]
    InvalidQuoteOption { plan: QuoteType, create_exists: bool },

    #[error("No payment history entry for {document} with mode {mode}")]
    InvalidHistoryCombination { document: String, mode: String },

    #[error("Exhausted {attempts} attempts while picking a unique {what}")]
    ExhaustedRetries { what: String, attempts: u32 },

    #[error("Subscription text does not contain a start and end date: {0:?}")]
    SubscriptionFormat(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Subscription start {start} must be before end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not read config file `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse config file `{path}`: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
