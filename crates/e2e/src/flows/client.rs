//! Client records and the client portal

use chrono::{Days, NaiveDate};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crm_e2e_common::format::{format_date_ddmmyyyy, parse_subscription_period};
use crm_e2e_common::generators::{random_date, DEFAULT_DAYS_RANGE};
use crm_e2e_common::DateDirection;

use super::business::BusinessFlow;
use super::FlowContext;
use crate::driver::{Browser, Locator, Page};
use crate::error::{E2eError, E2eResult};
use crate::expect::{appears_within, expect};
use crate::mail::MailReader;
use crate::window::open_in_new_tab;

const CLIENT_LINK: &str = r#"a[title="Click for client details"]"#;
const SUBSCRIPTION_FIELD: &str = "#update-subscription-form_subscriptionPeriod";
const SUBSCRIPTION_TEXT: &str = "span.subscription-period";

/// Status tag shown on the client's Subscription tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Overdue,
}

impl SubscriptionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Overdue => "Overdue",
        }
    }

    fn tag(&self) -> Locator {
        let class = match self {
            SubscriptionStatus::Active => "span.ant-tag-success",
            SubscriptionStatus::Overdue => "span.ant-tag-error",
        };
        Locator::css(class).has_text(self.label())
    }
}

/// Subscription period written by [`ClientFlow::edit_client_subscription`]
pub fn subscription_period(set_overdue: bool) -> (NaiveDate, NaiveDate) {
    if set_overdue {
        (
            NaiveDate::from_ymd_opt(1999, 1, 1).unwrap_or_default(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
        )
    } else {
        // Shifted a day outward so today is always strictly inside
        (
            random_date(DateDirection::Past, DEFAULT_DAYS_RANGE) - Days::new(1),
            random_date(DateDirection::Future, DEFAULT_DAYS_RANGE) + Days::new(1),
        )
    }
}

pub struct ClientFlow {
    ctx: FlowContext,
    browser: Arc<dyn Browser>,
    business: BusinessFlow,
}

impl ClientFlow {
    pub fn new(ctx: FlowContext, browser: Arc<dyn Browser>, mail: Arc<MailReader>) -> Self {
        let business = BusinessFlow::new(ctx.clone(), mail);
        Self {
            ctx,
            browser,
            business,
        }
    }

    /// Open the business, follow its client link into a new tab and check the
    /// subscription is active
    pub async fn verify_client_creation(&self, company_number: &str) -> E2eResult<Arc<dyn Page>> {
        let client_page = self.open_client_page(company_number).await?;
        self.verify_client_status(client_page.as_ref(), SubscriptionStatus::Active)
            .await?;
        info!("Client for {} is active", company_number);
        Ok(client_page)
    }

    /// Open the client record of a business in a new tab
    pub async fn open_client_page(&self, company_number: &str) -> E2eResult<Arc<dyn Page>> {
        self.business.enter_business_page(company_number).await?;

        let link = Locator::css(CLIENT_LINK).first();
        self.ctx.expect().visible(&link).await?;
        let client_page =
            open_in_new_tab(&self.ctx.page, &link, self.ctx.config.timeouts.popup()).await?;

        client_page.click(&Locator::tab("Subscription")).await?;
        debug!("Opened client page for {}", company_number);
        Ok(client_page)
    }

    pub async fn verify_client_status(
        &self,
        client_page: &dyn Page,
        status: SubscriptionStatus,
    ) -> E2eResult<()> {
        expect(client_page, self.ctx.config.timeouts.assertion())
            .visible(&status.tag())
            .await
    }

    /// Log into the client portal in a fresh context. With `expect_success`
    /// the dashboard must load; otherwise the login must be refused.
    pub async fn login_client(
        &self,
        email: &str,
        password: &SecretString,
        expect_success: bool,
    ) -> E2eResult<()> {
        let context = self.browser.new_context().await?;
        let outcome = async {
            let page = context.new_page().await?;
            self.attempt_login(page.as_ref(), email, password, expect_success)
                .await
        }
        .await;
        let closed = context.close().await;
        outcome?;
        closed?;

        info!(expect_success, "Client login checked for {}", email);
        Ok(())
    }

    async fn attempt_login(
        &self,
        page: &dyn Page,
        email: &str,
        password: &SecretString,
        expect_success: bool,
    ) -> E2eResult<()> {
        let timeout = self.ctx.config.timeouts.assertion();

        page.goto(&self.ctx.config.portal_url("/login")).await?;
        page.fill(&Locator::css("#login_email"), email).await?;
        page.fill(&Locator::css("#login_password"), password.expose_secret())
            .await?;
        page.click(&Locator::button("Login")).await?;

        let dashboard = Locator::text("Dashboard").first();
        if expect_success {
            return expect(page, timeout).visible(&dashboard).await;
        }

        expect(page, timeout)
            .visible(&Locator::css(".ant-notification-notice-description"))
            .await?;
        if appears_within(page, &dashboard, self.ctx.config.timeouts.notification()).await? {
            return Err(E2eError::AssertionFailed(format!(
                "client {email} reached the dashboard with an overdue subscription"
            )));
        }
        Ok(())
    }

    /// Rewrite the subscription period on the open client page, check the
    /// status tag and whether the client can still log in
    pub async fn edit_client_subscription(
        &self,
        client_page: &dyn Page,
        email: &str,
        set_overdue: bool,
    ) -> E2eResult<()> {
        let period = subscription_period(set_overdue);
        self.edit_client_subscription_to(client_page, email, period, set_overdue)
            .await
    }

    /// Write `period` as the subscription; `overdue` is the status it must produce
    pub async fn edit_client_subscription_to(
        &self,
        client_page: &dyn Page,
        email: &str,
        (start, end): (NaiveDate, NaiveDate),
        overdue: bool,
    ) -> E2eResult<()> {
        let (start_text, end_text) = (format_date_ddmmyyyy(start), format_date_ddmmyyyy(end));
        let field = Locator::css(SUBSCRIPTION_FIELD);

        client_page
            .click(&Locator::css(r#"button[title="Edit Subscription"]"#))
            .await?;
        client_page.click(&field).await?;
        client_page.fill(&field, &start_text).await?;
        client_page.keyboard_press("Enter").await?;
        client_page.keyboard_type(&end_text).await?;
        client_page.keyboard_press("Enter").await?;
        client_page.click(&Locator::button("Save")).await?;

        let status = if overdue {
            SubscriptionStatus::Overdue
        } else {
            SubscriptionStatus::Active
        };
        self.verify_client_status(client_page, status).await?;

        let shown = client_page
            .inner_text(&Locator::css(SUBSCRIPTION_TEXT).first())
            .await?;
        let period = parse_subscription_period(&shown)?;
        if period != (start, end) {
            return Err(E2eError::AssertionFailed(format!(
                "subscription shows {shown:?}, expected {start_text} - {end_text}"
            )));
        }

        info!(status = status.label(), "Subscription set to {} - {}", start_text, end_text);
        self.login_client(email, &self.ctx.config.client.password, !overdue)
            .await
    }
}
