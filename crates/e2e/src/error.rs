//! Error types for browser flows and the scenario runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Expected a new window after: {0}")]
    PopupNotOpened(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] crm_e2e_common::Error),
}

impl E2eError {
    pub fn step(step: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        E2eError::StepFailed {
            step: step.into(),
            reason: reason.to_string(),
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
