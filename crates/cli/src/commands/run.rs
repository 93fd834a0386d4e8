//! Run Command

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Color;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crm_e2e::playwright::BrowserKind;
use crm_e2e::runner::TestResult;
use crm_e2e::{catalogue, PlaywrightBrowser, PlaywrightConfig, RunnerConfig, ScenarioFilter, TestRunner};
use crm_e2e_common::SuiteConfig;

use crate::output::{print_list, print_run_summary, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Run only scenarios whose name contains this text (repeatable)
    #[arg(short, long)]
    pub name: Vec<String>,

    /// Run only scenarios carrying this tag (repeatable)
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    pub browser: BrowserKind,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    pub viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    pub viewport_height: u32,

    /// Directory whose node_modules provides playwright
    #[arg(long, env = "PLAYWRIGHT_PROJECT_DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    pub output: PathBuf,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Scenario result row
#[derive(Serialize)]
pub struct ResultDisplay {
    pub name: String,
    pub suite: String,
    pub status: String,
    pub duration_ms: u64,
    pub error: String,
}

impl From<&TestResult> for ResultDisplay {
    fn from(result: &TestResult) -> Self {
        let status = match (result.success, result.timed_out) {
            (true, _) => "passed",
            (false, true) => "timed out",
            (false, false) => "failed",
        };
        Self {
            name: result.name.clone(),
            suite: result.suite.clone(),
            status: status.to_string(),
            duration_ms: result.duration_ms,
            error: result.error.clone().unwrap_or_default(),
        }
    }
}

impl TableDisplay for ResultDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Suite", "Status", "Duration (ms)", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.suite.clone(),
            self.status.clone(),
            self.duration_ms.to_string(),
            self.error.clone(),
        ]
    }

    fn highlight(&self) -> Option<Color> {
        match self.status.as_str() {
            "passed" => None,
            "timed out" => Some(Color::Yellow),
            _ => Some(Color::Red),
        }
    }
}

pub async fn execute(args: RunArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let suite = SuiteConfig::load(config_path).context("loading suite configuration")?;
    suite.validate().context("invalid suite configuration")?;

    let browser = Arc::new(
        PlaywrightBrowser::launch(PlaywrightConfig {
            browser: args.browser,
            headless: !args.headed,
            viewport_width: args.viewport_width,
            viewport_height: args.viewport_height,
            project_dir: args.project_dir,
            ..Default::default()
        })
        .await
        .context("launching Playwright")?,
    );

    let runner = TestRunner::with_config(
        browser.clone(),
        Arc::new(suite),
        RunnerConfig {
            filter: ScenarioFilter {
                names: args.name,
                tags: args.tag,
            },
            output_dir: args.output,
            fail_fast: args.fail_fast,
        },
    );

    let summary = runner.run_scenarios(&catalogue()).await;
    if let Err(e) = browser.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }
    let summary = summary?;
    let path = runner.write_results(&summary)?;

    let rows: Vec<ResultDisplay> = summary.results.iter().map(ResultDisplay::from).collect();
    print_list(&rows, format);

    print_run_summary(&summary, &path);
    if !summary.success() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool, timed_out: bool) -> TestResult {
        TestResult {
            name: "create-lead".to_string(),
            suite: "CRM Panel".to_string(),
            success,
            timed_out,
            duration_ms: 1200,
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_result_rows_are_coloured_by_status() {
        let passed = ResultDisplay::from(&result(true, false));
        let timed_out = ResultDisplay::from(&result(false, true));
        let failed = ResultDisplay::from(&result(false, false));

        assert_eq!(passed.status, "passed");
        assert_eq!(passed.highlight(), None);
        assert_eq!(timed_out.status, "timed out");
        assert_eq!(timed_out.highlight(), Some(Color::Yellow));
        assert_eq!(failed.row()[4], "boom");
        assert_eq!(failed.highlight(), Some(Color::Red));
    }
}
