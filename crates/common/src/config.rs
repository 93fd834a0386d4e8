//! Suite configuration.
//!
//! Built once before any scenario starts (defaults, then an optional TOML
//! file, then environment overrides) and handed to every flow constructor.
//! Flows never read the environment themselves.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generators::DEFAULT_MAIL_DOMAIN;

/// Complete configuration for one suite run
#[derive(Debug, Clone, Default)]
pub struct SuiteConfig {
    pub urls: UrlConfig,
    pub admin: AdminCredentials,
    pub mail: MailConfig,
    pub retry: RetryConfig,
    pub timeouts: TimeoutConfig,
    pub client: ClientConfig,
    pub data: DataConfig,
}

/// Base URLs of the systems under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    /// Admin CRM; `/login`, `/lead` and `/business` are resolved against it
    pub crm: String,
    /// Public marketing website with the contact and pricing forms
    pub website: String,
    /// Customer portal (compliance test, client login)
    pub portal: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            crm: "http://localhost:3000".to_string(),
            website: "http://localhost:4000".to_string(),
            portal: "http://localhost:5000".to_string(),
        }
    }
}

/// CRM administrator login
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: SecretString,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: SecretString::from(String::new()),
        }
    }
}

/// External inbox used for OTPs, quote acceptance and payment links
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub inbox_url: String,
    pub domain: String,
    pub otp_length: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            inbox_url: "https://tempmail.plus/en/#!".to_string(),
            domain: DEFAULT_MAIL_DOMAIN.to_string(),
            otp_length: 4,
        }
    }
}

/// Bounds for generate-and-check loops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub company_number_attempts: u32,
    pub dropdown_scroll_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            company_number_attempts: 25,
            dropdown_scroll_attempts: 50,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long an expected element may take to become visible
    pub assertion_ms: u64,
    /// How long to watch for a "Business already exists" notification
    pub notification_ms: u64,
    /// How long to wait for a popup window after a click
    pub popup_ms: u64,
    /// Pause letting the quote form recompute after the date is entered
    pub settle_ms: u64,
    /// Pause letting the company number search populate its options
    pub option_probe_ms: u64,
    /// Default budget for one scenario
    pub scenario_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            assertion_ms: 10_000,
            notification_ms: 3_000,
            popup_ms: 10_000,
            settle_ms: 2_000,
            option_probe_ms: 300,
            scenario_ms: 60_000,
        }
    }
}

impl TimeoutConfig {
    pub fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn popup(&self) -> Duration {
        Duration::from_millis(self.popup_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn option_probe(&self) -> Duration {
        Duration::from_millis(self.option_probe_ms)
    }

    pub fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }
}

/// Credentials a newly activated client logs in with
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub password: SecretString,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            password: SecretString::from("welcome".to_string()),
        }
    }
}

/// Reference data that depends on the target deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Names offered in the CRM "First Response" dropdown
    pub first_responders: Vec<String>,
    /// Compliance-test campaign ids published on the portal
    pub compliance_campaigns: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            first_responders: [
                "Anoushka Mishra",
                "Avik Sain",
                "Debanik Saha",
                "Himanshu Sharma",
                "Lead Manager",
                "Natasha Romanoff",
                "Sreejan Naru",
                "Subhajit Kar",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            compliance_campaigns: [
                "69038bea19584533a7499102",
                "69048af7f445421540ffe980",
                "690492b4f445421540ffe9b3",
                "690496b9f445421540ffe9c5",
                "69049785f445421540ffe9cb",
                "69049a23f445421540ffe9dd",
                "69049e0df445421540ffe9f2",
                "6904a3645d38f9752e68fc97",
                "6904a4075d38f9752e68fc9b",
                "6904a50a5d38f9752e68fc9e",
                "690839069c16834787b27b4f",
                "6926b281071a64e32132ecaf",
                "6926f37e127b69b41dd809c2",
                "6926f396127b69b41dd809c9",
                "6926f44e127b69b41dd809eb",
                "69280c8898233e759a78f7d5",
                "694141061e55626212850e07",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SecretsFile {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    urls: Option<UrlConfig>,
    admin: Option<SecretsFile>,
    mail: Option<MailConfig>,
    retry: Option<RetryConfig>,
    timeouts: Option<TimeoutConfig>,
    client: Option<SecretsFile>,
    data: Option<DataConfig>,
}

impl SuiteConfig {
    /// Load configuration: defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            config.apply_file(path)?;
        }
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.apply(file);
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply(file);
        Ok(())
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(urls) = file.urls {
            self.urls = urls;
        }
        if let Some(admin) = file.admin {
            if let Some(username) = admin.username {
                self.admin.username = username;
            }
            if let Some(password) = admin.password {
                self.admin.password = SecretString::from(password);
            }
        }
        if let Some(mail) = file.mail {
            self.mail = mail;
        }
        if let Some(retry) = file.retry {
            self.retry = retry;
        }
        if let Some(timeouts) = file.timeouts {
            self.timeouts = timeouts;
        }
        if let Some(client) = file.client {
            if let Some(password) = client.password {
                self.client.password = SecretString::from(password);
            }
        }
        if let Some(data) = file.data {
            self.data = data;
        }
    }

    /// Apply `CRM_URL`/`BASE_URL`, `WEBSITE_URL`, `PORTAL_URL`, `ADMIN_USERNAME`,
    /// `ADMIN_PASSWORD`, `CLIENT_PASSWORD`, `MAIL_INBOX_URL`, `MAIL_DOMAIN` and
    /// `MAIL_OTP_LENGTH` from `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = read("CRM_URL").or_else(|| read("BASE_URL")) {
            self.urls.crm = value;
        }
        if let Some(value) = read("WEBSITE_URL") {
            self.urls.website = value;
        }
        if let Some(value) = read("PORTAL_URL") {
            self.urls.portal = value;
        }
        if let Some(value) = read("ADMIN_USERNAME") {
            self.admin.username = value;
        }
        if let Some(value) = read("ADMIN_PASSWORD") {
            self.admin.password = SecretString::from(value);
        }
        if let Some(value) = read("CLIENT_PASSWORD") {
            self.client.password = SecretString::from(value);
        }
        if let Some(value) = read("MAIL_INBOX_URL") {
            self.mail.inbox_url = value;
        }
        if let Some(value) = read("MAIL_DOMAIN") {
            self.mail.domain = value;
        }
        if let Some(value) = read("MAIL_OTP_LENGTH") {
            self.mail.otp_length = value.parse().map_err(|_| {
                Error::InvalidConfig(format!("MAIL_OTP_LENGTH must be a number, got `{value}`"))
            })?;
        }

        Ok(())
    }

    /// Check everything a live run needs
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("urls.crm", &self.urls.crm),
            ("urls.website", &self.urls.website),
            ("urls.portal", &self.urls.portal),
            ("mail.inbox_url", &self.mail.inbox_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be an http(s) URL, got `{url}`"
                )));
            }
        }
        if self.admin.username.is_empty() || self.admin.password.expose_secret().is_empty() {
            return Err(Error::InvalidConfig(
                "admin credentials missing (set ADMIN_USERNAME and ADMIN_PASSWORD)".to_string(),
            ));
        }
        if self.mail.domain.is_empty() {
            return Err(Error::InvalidConfig("mail.domain must not be empty".to_string()));
        }
        if !(1..=12).contains(&self.mail.otp_length) {
            return Err(Error::InvalidConfig(format!(
                "mail.otp_length must be within 1..=12, got {}",
                self.mail.otp_length
            )));
        }
        if self.retry.company_number_attempts == 0 || self.retry.dropdown_scroll_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry attempt bounds must be at least 1".to_string(),
            ));
        }
        if self.data.first_responders.is_empty() {
            return Err(Error::InvalidConfig(
                "data.first_responders must list at least one name".to_string(),
            ));
        }
        Ok(())
    }

    /// `crm` base joined with an absolute path such as `/business`
    pub fn crm_url(&self, path: &str) -> String {
        join_url(&self.urls.crm, path)
    }

    pub fn website_url(&self, path: &str) -> String {
        join_url(&self.urls.website, path)
    }

    pub fn portal_url(&self, path: &str) -> String {
        join_url(&self.urls.portal, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) if !path.is_empty() => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.mail.domain, "chitthi.in");
        assert_eq!(config.mail.otp_length, 4);
        assert_eq!(config.timeouts.notification(), Duration::from_secs(3));
        assert_eq!(config.client.password.expose_secret(), "welcome");
        assert_eq!(config.data.compliance_campaigns.len(), 17);
        // Admin credentials have no default
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("BASE_URL", "https://crm.example.test"),
            ("WEBSITE_URL", "https://www.example.test"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("MAIL_OTP_LENGTH", "6"),
        ]);
        let mut config = SuiteConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).cloned())
            .unwrap();

        assert_eq!(config.urls.crm, "https://crm.example.test");
        assert_eq!(config.urls.website, "https://www.example.test");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password.expose_secret(), "s3cret");
        assert_eq!(config.mail.otp_length, 6);
        config.validate().unwrap();
    }

    #[test]
    fn test_crm_url_takes_precedence_over_base_url() {
        let vars = env(&[("BASE_URL", "https://a.test"), ("CRM_URL", "https://b.test")]);
        let mut config = SuiteConfig::default();
        config.apply_env_overrides(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.urls.crm, "https://b.test");
    }

    #[test]
    fn test_bad_otp_length() {
        let vars = env(&[("MAIL_OTP_LENGTH", "four")]);
        let mut config = SuiteConfig::default();
        let err = config
            .apply_env_overrides(|key| vars.get(key).cloned())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_from_toml_partial_sections() {
        let config = SuiteConfig::from_toml(
            r#"
[urls]
crm = "https://crm.example.test"

[admin]
username = "ops"
password = "pw"

[retry]
company_number_attempts = 5

[timeouts]
scenario_ms = 100000
"#,
        )
        .unwrap();

        assert_eq!(config.urls.crm, "https://crm.example.test");
        // Unset fields inside a present section keep their defaults
        assert_eq!(config.urls.website, "http://localhost:4000");
        assert_eq!(config.retry.company_number_attempts, 5);
        assert_eq!(config.retry.dropdown_scroll_attempts, 50);
        assert_eq!(config.timeouts.scenario(), Duration::from_secs(100));
        assert_eq!(config.admin.username, "ops");
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.toml");
        std::fs::write(&path, "[mail]\ndomain = \"fexbox.org\"\n").unwrap();
        let config = SuiteConfig::load(Some(&path)).unwrap();
        assert_eq!(config.mail.domain, "fexbox.org");

        let missing = SuiteConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(missing, Err(Error::ConfigRead { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = SuiteConfig::default();
        config.admin.username = "admin".to_string();
        config.admin.password = SecretString::from("pw".to_string());
        config.validate().unwrap();
        config.retry.company_number_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_join_url() {
        let mut config = SuiteConfig::default();
        config.urls.crm = "https://crm.test/".to_string();
        assert_eq!(config.crm_url("/business"), "https://crm.test/business");
        config.urls.crm = "https://crm.test".to_string();
        assert_eq!(config.crm_url("/business"), "https://crm.test/business");
        assert_eq!(config.crm_url("lead"), "https://crm.test/lead");
        assert_eq!(config.crm_url(""), "https://crm.test");
    }
}
