//! List Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crm_e2e::{catalogue, Scenario};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ListArgs {
    /// Show only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Scenario display wrapper for serialization
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub name: String,
    pub suite: String,
    pub tags: Vec<String>,
    pub timeout_s: Option<u64>,
}

impl From<&Scenario> for ScenarioDisplay {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.to_string(),
            suite: scenario.suite.to_string(),
            tags: scenario.tags.iter().map(|t| t.to_string()).collect(),
            timeout_s: scenario.timeout.map(|t| t.as_secs()),
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Suite", "Tags", "Timeout"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.suite.clone(),
            self.tags.join(", "),
            self.timeout_s
                .map(|s| format!("{s} s"))
                .unwrap_or_else(|| "default".to_string()),
        ]
    }
}

pub fn execute(args: ListArgs, format: OutputFormat) -> Result<()> {
    let scenarios: Vec<ScenarioDisplay> = catalogue()
        .iter()
        .filter(|s| args.tag.as_deref().map_or(true, |tag| s.has_tag(tag)))
        .map(ScenarioDisplay::from)
        .collect();

    print_list(&scenarios, format);
    Ok(())
}
