//! CRM business processes as ordered UI interactions.
//!
//! Each flow struct wraps a [`FlowContext`]: the page it drives and the
//! suite configuration it was constructed with.

pub mod business;
pub mod client;
pub mod lead;
pub mod website;

use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crm_e2e_common::generators::generate_uk_company_number;
use crm_e2e_common::retry::{pick_unique, Claim};
use crm_e2e_common::{Error, SuiteConfig};

use crate::driver::{Locator, Page};
use crate::error::E2eResult;
use crate::expect::{appears_within, expect, Expect};

pub use business::{BusinessFlow, ChosenBusiness, PaymentMethod, PortalBusiness, QuoteRecord};
pub use client::{ClientFlow, SubscriptionStatus};
pub use lead::LeadFlow;
pub use website::{PricingLead, WebsiteFlow};

const NOTIFICATION_CLOSE: &str = "a.ant-notification-notice-close";
const OPTION_CONTENT: &str = ".ant-select-item-option-content";

/// Scrolls a virtual list holder by `step` pixels; true if it moved
const SCROLL_LIST_SCRIPT: &str = "(el, step) => {
  const holder = el.querySelector('.rc-virtual-list-holder') || el;
  const before = holder.scrollTop;
  holder.scrollTop += step;
  return holder.scrollTop !== before;
}";

/// Page plus configuration shared by every flow
#[derive(Clone)]
pub struct FlowContext {
    pub page: Arc<dyn Page>,
    pub config: Arc<SuiteConfig>,
}

impl FlowContext {
    pub fn new(page: Arc<dyn Page>, config: Arc<SuiteConfig>) -> Self {
        Self { page, config }
    }

    pub fn expect(&self) -> Expect<'_> {
        expect(self.page.as_ref(), self.config.timeouts.assertion())
    }

    /// Log into the CRM as the configured administrator
    pub async fn login_admin(&self) -> E2eResult<()> {
        let page = &self.page;
        page.goto(&self.config.crm_url("/login")).await?;
        page.fill(&Locator::label("Username"), &self.config.admin.username)
            .await?;
        page.fill(
            &Locator::label("Password"),
            self.config.admin.password.expose_secret(),
        )
        .await?;

        let login = Locator::css("//span[normalize-space()='Login']");
        let (landed, clicked) = tokio::join!(
            page.wait_for_url("**/dashboard", self.config.timeouts.assertion()),
            page.click(&login),
        );
        clicked?;
        landed?;

        info!("Logged in as {}", self.config.admin.username);
        Ok(())
    }

    pub async fn close_notification(&self) -> E2eResult<()> {
        self.page
            .click(&Locator::css(NOTIFICATION_CLOSE).first())
            .await
    }

    /// Whether the "Business already exists" notification shows up after a save
    pub async fn business_already_exists(&self) -> E2eResult<bool> {
        appears_within(
            self.page.as_ref(),
            &Locator::css(".ant-notification-notice-description")
                .has_text("Business already exists"),
            self.config.timeouts.notification(),
        )
        .await
    }

    /// Type a date range into an open range picker
    pub async fn fill_date_range(&self, field: &Locator, start: &str, end: &str) -> E2eResult<()> {
        self.page.click(field).await?;
        self.page.fill(field, start).await?;
        self.page.keyboard_press("Enter").await?;
        self.page.keyboard_type(end).await?;
        self.page.keyboard_press("Enter").await
    }

    /// Pick `name` from the open "First Response" dropdown.
    ///
    /// The dropdown is a virtualised list that only renders visible options,
    /// so it is scrolled until the option is rendered, the list stops moving,
    /// or the configured number of scrolls is used up.
    pub async fn select_first_response(&self, name: &str) -> E2eResult<()> {
        let option = Locator::css(OPTION_CONTENT).has_text(name);
        let list = Locator::css(".rc-virtual-list").has_not_text("Web").last();
        let attempts = self.config.retry.dropdown_scroll_attempts;

        // One look per scroll plus one after the last
        for scroll in 0..=attempts {
            if self.page.count(&option).await? > 0 {
                debug!(scroll, "first response {} rendered", name);
                return self.page.click(&option.clone().first()).await;
            }
            if scroll == attempts {
                break;
            }
            let moved = self
                .page
                .evaluate(&list, SCROLL_LIST_SCRIPT, json!(200))
                .await?;
            if moved.as_bool() != Some(true) {
                break;
            }
        }

        Err(Error::ExhaustedRetries {
            what: format!("first response option `{name}`"),
            attempts,
        }
        .into())
    }

    /// Enter a fresh company number into `field` and save, retrying with a new
    /// number while the search offers none or the CRM reports it already taken
    pub async fn pick_company_number(&self, field: &Locator) -> E2eResult<String> {
        let number = pick_unique(
            "company number",
            self.config.retry.company_number_attempts,
            generate_uk_company_number,
            |number: String| async move { self.claim_company_number(field, &number).await },
        )
        .await?;

        info!("Registered company number {}", number);
        Ok(number)
    }

    async fn claim_company_number(&self, field: &Locator, number: &str) -> E2eResult<Claim> {
        let page = &self.page;

        page.click(field).await?;
        // AntD keeps the previous search text
        page.keyboard_press("Control+A").await?;
        page.keyboard_press("Backspace").await?;
        page.keyboard_type(number).await?;

        page.wait_for_timeout(self.config.timeouts.option_probe())
            .await?;
        if page.count(&Locator::role("option", number)).await? == 0 {
            page.keyboard_press("Escape").await?;
            return Ok(Claim::Unavailable);
        }

        page.keyboard_press("ArrowDown").await?;
        page.keyboard_press("Enter").await?;
        page.click(&Locator::button("Save")).await?;

        if self.business_already_exists().await? {
            self.close_notification().await?;
            return Ok(Claim::Taken);
        }
        Ok(Claim::Accepted)
    }
}
