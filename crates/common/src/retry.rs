//! Bounded generate-and-check loop for identifiers that may already exist

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::Error;

/// Outcome of offering one candidate to the system under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Candidate was accepted
    Accepted,
    /// Candidate was submitted but already belongs to someone else
    Taken,
    /// Candidate could not be submitted at all (e.g. no matching option)
    Unavailable,
}

/// Generate candidates until one is accepted, giving up after `max_attempts`.
///
/// `generate` produces a fresh candidate; `claim` submits it and reports the
/// outcome. Errors from `claim` abort immediately.
pub async fn pick_unique<T, G, C, Fut, E>(
    what: &str,
    max_attempts: u32,
    mut generate: G,
    mut claim: C,
) -> std::result::Result<T, E>
where
    T: Clone + Display,
    G: FnMut() -> T,
    C: FnMut(T) -> Fut,
    Fut: Future<Output = std::result::Result<Claim, E>>,
    E: From<Error>,
{
    for attempt in 1..=max_attempts {
        let candidate = generate();
        match claim(candidate.clone()).await? {
            Claim::Accepted => {
                debug!(%candidate, attempt, "picked unique {}", what);
                return Ok(candidate);
            }
            Claim::Taken => {
                warn!(%candidate, attempt, "{} already exists, retrying", what);
            }
            Claim::Unavailable => {
                debug!(%candidate, attempt, "{} not offered, retrying", what);
            }
        }
    }

    Err(Error::ExhaustedRetries {
        what: what.to_string(),
        attempts: max_attempts,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    #[tokio::test]
    async fn test_first_candidate_accepted() {
        let picked: Result<String> = pick_unique(
            "company number",
            3,
            || "01234567".to_string(),
            |_| async { Ok(Claim::Accepted) },
        )
        .await;
        assert_eq!(picked.unwrap(), "01234567");
    }

    #[tokio::test]
    async fn test_retries_past_collisions() {
        let mut next = 0u32;
        let mut offered = Vec::new();
        let picked: Result<u32> = pick_unique(
            "company number",
            10,
            || {
                next += 1;
                next
            },
            |candidate| {
                offered.push(candidate);
                async move {
                    Ok(match candidate {
                        1 => Claim::Taken,
                        2 => Claim::Unavailable,
                        _ => Claim::Accepted,
                    })
                }
            },
        )
        .await;
        assert_eq!(picked.unwrap(), 3);
        assert_eq!(offered, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_exhausts_after_bound() {
        let mut calls = 0;
        let picked: Result<String> = pick_unique(
            "company number",
            4,
            || "00000000".to_string(),
            |_| {
                calls += 1;
                async { Ok(Claim::Taken) }
            },
        )
        .await;
        assert_eq!(calls, 4);
        match picked {
            Err(Error::ExhaustedRetries { what, attempts }) => {
                assert_eq!(what, "company number");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_claim_error_aborts() {
        let picked: Result<String> = pick_unique(
            "company number",
            5,
            || "1".to_string(),
            |_| async { Err(Error::InvalidConfig("boom".to_string())) },
        )
        .await;
        assert!(matches!(picked, Err(Error::InvalidConfig(_))));
    }
}
