//! Scenario runner: isolated browser context per scenario, per-scenario
//! timeout, summary and JSON results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crm_e2e_common::SuiteConfig;

use crate::driver::Browser;
use crate::error::{E2eError, E2eResult};
use crate::scenarios::{Scenario, ScenarioContext};
use crate::scope::ScopedBrowser;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub suite: String,
    pub success: bool,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Which scenarios to run. Empty lists select everything.
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    pub names: Vec<String>,
    pub tags: Vec<String>,
}

impl ScenarioFilter {
    /// A scenario is selected when it matches one of the names (substring)
    /// and carries one of the tags
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let by_name = self.names.is_empty()
            || self.names.iter().any(|n| scenario.name.contains(n.as_str()));
        let by_tag = self.tags.is_empty() || self.tags.iter().any(|t| scenario.has_tag(t));
        by_name && by_tag
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub filter: ScenarioFilter,
    pub output_dir: PathBuf,
    /// Stop after the first failing scenario
    pub fail_fast: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            filter: ScenarioFilter::default(),
            output_dir: PathBuf::from("test-results"),
            fail_fast: false,
        }
    }
}

/// Main scenario runner
pub struct TestRunner {
    browser: Arc<dyn Browser>,
    suite: Arc<SuiteConfig>,
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(browser: Arc<dyn Browser>, suite: Arc<SuiteConfig>) -> Self {
        Self::with_config(browser, suite, RunnerConfig::default())
    }

    pub fn with_config(browser: Arc<dyn Browser>, suite: Arc<SuiteConfig>, config: RunnerConfig) -> Self {
        Self {
            browser,
            suite,
            config,
        }
    }

    /// Run every scenario selected by the filter; the rest count as skipped
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        let selected: Vec<&Scenario> = scenarios
            .iter()
            .filter(|s| self.config.filter.matches(s))
            .collect();

        info!(%run_id, "Running {} scenario(s)...", selected.len());

        for (i, scenario) in selected.iter().enumerate() {
            let result = self.run_scenario(scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);

            if failed > 0 && self.config.fail_fast {
                skipped += selected.len() - i - 1;
                warn!("Stopping after first failure");
                break;
            }
        }
        skipped += scenarios.len() - selected.len();

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            run_id,
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run one scenario in a fresh browser context. The context is closed
    /// whether the scenario passes, fails or times out.
    pub async fn run_scenario(&self, scenario: &Scenario) -> TestResult {
        let start = Instant::now();
        let timeout = scenario.timeout_or(self.suite.timeouts.scenario());
        let span = info_span!("scenario", name = scenario.name);

        let (outcome, timed_out) = self
            .execute(scenario, timeout)
            .instrument(span)
            .await;

        TestResult {
            name: scenario.name.to_string(),
            suite: scenario.suite.to_string(),
            success: outcome.is_ok(),
            timed_out,
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    async fn execute(&self, scenario: &Scenario, timeout: Duration) -> (E2eResult<()>, bool) {
        debug!("Running scenario: {}", scenario.name);

        let scope = Arc::new(ScopedBrowser::new(Arc::clone(&self.browser)));
        let browser: Arc<dyn Browser> = scope.clone();

        let run = async {
            let context = browser.new_context().await?;
            let page = context.new_page().await?;
            let ctx = ScenarioContext::new(
                Arc::clone(&browser),
                context,
                page,
                Arc::clone(&self.suite),
            );
            (scenario.run)(&ctx).await
        };

        let (outcome, timed_out) = match tokio::time::timeout(timeout, run).await {
            Ok(outcome) => (outcome, false),
            Err(_) => (
                Err(E2eError::Timeout(format!(
                    "scenario {} after {} ms",
                    scenario.name,
                    timeout.as_millis()
                ))),
                true,
            ),
        };

        // Covers the scenario's own context and any the flows left open
        scope.close_all().await;
        (outcome, timed_out)
    }

    /// Write results to `<output_dir>/scenario-results.json`
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::catalogue;

    fn filter(names: &[&str], tags: &[&str]) -> ScenarioFilter {
        ScenarioFilter {
            names: names.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_filter_selects_all() {
        let all = catalogue();
        assert!(all.iter().all(|s| ScenarioFilter::default().matches(s)));
    }

    #[test]
    fn test_filter_by_name_and_tag() {
        let selected: Vec<_> = catalogue()
            .into_iter()
            .filter(|s| filter(&["lead"], &["website"]).matches(s))
            .map(|s| s.name)
            .collect();
        assert_eq!(selected, vec!["contact-lead", "pricing-lead", "compliance-lead"]);
    }

    #[test]
    fn test_filter_by_tag_only() {
        let selected: Vec<_> = catalogue()
            .into_iter()
            .filter(|s| filter(&[], &["client"]).matches(s))
            .map(|s| s.name)
            .collect();
        assert_eq!(selected, vec!["portal-business", "subscription-status"]);
    }
}
