//! Reader for the external temp-mail inbox.
//!
//! Every inbox is opened in its own browser context so it never shares
//! cookies with the CRM session, and that context is closed on every exit
//! path.

use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crm_e2e_common::config::{MailConfig, TimeoutConfig};
use crm_e2e_common::SuiteConfig;

use crate::driver::{Browser, BrowserContext, Locator, Page};
use crate::error::{E2eError, E2eResult};
use crate::expect::expect;
use crate::window::follow_link;

/// Subject of the OTP email
const OTP_SUBJECT: &str = "Verification Code";
/// Subject of the quotation email and its call to action
const QUOTE_SUBJECT: &str = "Your Quotation";
const QUOTE_LINK: &str = "View Quote";
const QUOTE_ACCEPTED: &str = "Quote accepted successfully";

/// An inbox page open in a dedicated context
pub struct Inbox {
    pub context: Arc<dyn BrowserContext>,
    pub page: Arc<dyn Page>,
}

impl Inbox {
    pub async fn close(self) -> E2eResult<()> {
        self.context.close().await
    }
}

pub struct MailReader {
    browser: Arc<dyn Browser>,
    mail: MailConfig,
    timeouts: TimeoutConfig,
}

impl MailReader {
    pub fn new(browser: Arc<dyn Browser>, config: &SuiteConfig) -> Self {
        Self {
            browser,
            mail: config.mail.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Open the inbox of `username` on the configured domain
    pub async fn open_inbox(&self, username: &str) -> E2eResult<Inbox> {
        let context = self.browser.new_context().await?;
        match self.select_mailbox(&context, username).await {
            Ok(page) => Ok(Inbox { context, page }),
            Err(e) => {
                if let Err(close_err) = context.close().await {
                    warn!("Failed to close inbox context for {}: {}", username, close_err);
                }
                Err(e)
            }
        }
    }

    async fn select_mailbox(
        &self,
        context: &Arc<dyn BrowserContext>,
        username: &str,
    ) -> E2eResult<Arc<dyn Page>> {
        let page = context.new_page().await?;
        debug!("Opening inbox {}@{}", username, self.mail.domain);

        page.goto(&self.mail.inbox_url).await?;
        page.fill(&Locator::css("#pre_button"), username).await?;
        page.click(&Locator::css("#domain")).await?;
        page.click(&Locator::button(self.mail.domain.as_str())).await?;
        page.click(&Locator::css("#pre_copy")).await?;

        Ok(page)
    }

    /// Run `f` against an open inbox, closing it afterwards whatever `f` returns
    pub async fn with_inbox<T, F, Fut>(&self, username: &str, f: F) -> E2eResult<T>
    where
        F: FnOnce(Arc<dyn Page>) -> Fut,
        Fut: Future<Output = E2eResult<T>>,
    {
        let inbox = self.open_inbox(username).await?;
        let outcome = f(Arc::clone(&inbox.page)).await;
        let closed = inbox.close().await;
        let value = outcome?;
        closed?;
        Ok(value)
    }

    /// Read the latest verification code sent to `username`
    pub async fn read_otp(&self, username: &str) -> E2eResult<String> {
        let length = self.mail.otp_length;
        let pattern = format!(r"^\d{{{length}}}$");
        let check = Regex::new(&pattern).map_err(|e| E2eError::step("read otp", e))?;

        let otp = self
            .with_inbox(username, |page| async move {
                page.click(&Locator::text(OTP_SUBJECT).first()).await?;
                let text = page
                    .inner_text(&Locator::css("p").has_text_matching(pattern.as_str()).first())
                    .await?;
                Ok(text.trim().to_string())
            })
            .await?;

        if !check.is_match(&otp) {
            return Err(E2eError::step(
                "read otp",
                format!("expected {length} digits, got {otp:?}"),
            ));
        }
        info!("Read OTP for {}", username);
        Ok(otp)
    }

    /// Open the quotation email, check the quote page shows `expected` and accept it
    pub async fn accept_quote<S: AsRef<str> + Sync>(
        &self,
        username: &str,
        expected: &[S],
    ) -> E2eResult<()> {
        let popup_timeout = self.timeouts.popup();
        let assertion_timeout = self.timeouts.assertion();

        self.with_inbox(username, |page| async move {
            page.click(&Locator::text(QUOTE_SUBJECT).first()).await?;
            let quote_page = follow_link(&page, &Locator::text(QUOTE_LINK).first(), popup_timeout).await?;

            let check = expect(quote_page.as_ref(), assertion_timeout);
            check.all_texts(expected).await?;

            quote_page.click(&Locator::button("Accept")).await?;
            check.text(QUOTE_ACCEPTED).await
        })
        .await?;

        info!("Quote accepted from {}'s inbox", username);
        Ok(())
    }
}
