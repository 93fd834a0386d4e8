//! Config Commands

use anyhow::{Context, Result};
use clap::Subcommand;
use secrecy::ExposeSecret;
use serde::Serialize;
use std::path::Path;

use crm_e2e_common::SuiteConfig;

use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (passwords redacted)
    Show,

    /// Check that the configuration is complete enough for a live run
    Validate,
}

/// One configuration key
#[derive(Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl TableDisplay for Setting {
    fn headers() -> Vec<&'static str> {
        vec!["Key", "Value"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.key.clone(), self.value.clone()]
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        "(unset)".to_string()
    } else {
        "[REDACTED]".to_string()
    }
}

fn settings(config: &SuiteConfig) -> Vec<Setting> {
    let t = &config.timeouts;
    [
        ("urls.crm", config.urls.crm.clone()),
        ("urls.website", config.urls.website.clone()),
        ("urls.portal", config.urls.portal.clone()),
        ("admin.username", config.admin.username.clone()),
        ("admin.password", redact(config.admin.password.expose_secret())),
        ("client.password", redact(config.client.password.expose_secret())),
        ("mail.inbox_url", config.mail.inbox_url.clone()),
        ("mail.domain", config.mail.domain.clone()),
        ("mail.otp_length", config.mail.otp_length.to_string()),
        (
            "retry.company_number_attempts",
            config.retry.company_number_attempts.to_string(),
        ),
        (
            "retry.dropdown_scroll_attempts",
            config.retry.dropdown_scroll_attempts.to_string(),
        ),
        ("timeouts.assertion_ms", t.assertion_ms.to_string()),
        ("timeouts.notification_ms", t.notification_ms.to_string()),
        ("timeouts.popup_ms", t.popup_ms.to_string()),
        ("timeouts.settle_ms", t.settle_ms.to_string()),
        ("timeouts.option_probe_ms", t.option_probe_ms.to_string()),
        ("timeouts.scenario_ms", t.scenario_ms.to_string()),
        ("data.first_responders", config.data.first_responders.join(", ")),
        (
            "data.compliance_campaigns",
            config.data.compliance_campaigns.len().to_string(),
        ),
    ]
    .into_iter()
    .map(|(key, value)| Setting {
        key: key.to_string(),
        value,
    })
    .collect()
}

pub fn execute(cmd: ConfigCommands, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = SuiteConfig::load(config_path).context("loading suite configuration")?;

    match cmd {
        ConfigCommands::Show => {
            print_list(&settings(&config), format);
        }

        ConfigCommands::Validate => {
            config.validate().context("invalid suite configuration")?;
            print_success("Configuration is valid");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_passwords_are_redacted() {
        let mut config = SuiteConfig::default();
        config.admin.password = SecretString::from("hunter2".to_string());

        let rows = settings(&config);
        assert!(rows.iter().all(|s| !s.value.contains("hunter2")));
        let admin = rows.iter().find(|s| s.key == "admin.password").unwrap();
        assert_eq!(admin.value, "[REDACTED]");
    }

    #[test]
    fn test_unset_password_shown_as_unset() {
        let rows = settings(&SuiteConfig::default());
        let admin = rows.iter().find(|s| s.key == "admin.password").unwrap();
        assert_eq!(admin.value, "(unset)");
    }
}
