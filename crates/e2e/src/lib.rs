//! CRM E2E browser layer
//!
//! This crate drives the CRM, the public website, the client portal and an
//! external temp-mail inbox through a browser:
//! - Controls Playwright through a long-running node bridge speaking JSON lines
//! - Encodes CRM business processes as flows over the [`driver::Page`] seam
//! - Composes flows into scenarios and runs them with per-scenario isolation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  TestRunner (per scenario)                  │
//! │    ├── browser.new_context() -> isolated cookies            │
//! │    ├── ScenarioContext { page, config, mail }               │
//! │    └── timeout(scenario.run(ctx)) -> TestResult             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Flows                                                      │
//! │    ├── WebsiteFlow   contact / pricing / compliance leads   │
//! │    ├── LeadFlow      create, open, activity, status         │
//! │    ├── BusinessFlow  quotes, invoices, payments             │
//! │    └── ClientFlow    client page, subscription, login       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  driver::{Browser, BrowserContext, Page}                    │
//! │    └── playwright::PlaywrightBrowser (node bridge)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod error;
pub mod expect;
pub mod flows;
pub mod mail;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod scope;
pub mod window;

pub use driver::{Browser, BrowserContext, Locator, Page};
pub use error::{E2eError, E2eResult};
pub use playwright::{PlaywrightBrowser, PlaywrightConfig};
pub use runner::{RunnerConfig, ScenarioFilter, TestRunner, TestSuiteResult};
pub use scenarios::{catalogue, Scenario};
