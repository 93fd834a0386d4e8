//! Assertions on page state

use std::time::Duration;
use tracing::debug;

use crate::driver::{Locator, Page, WaitState};
use crate::error::{E2eError, E2eResult};

/// Assertion helper bound to a page and a timeout
pub struct Expect<'a> {
    page: &'a dyn Page,
    timeout: Duration,
}

pub fn expect(page: &dyn Page, timeout: Duration) -> Expect<'_> {
    Expect { page, timeout }
}

impl Expect<'_> {
    /// The first element matching `locator` becomes visible
    pub async fn visible(&self, locator: &Locator) -> E2eResult<()> {
        self.state(locator, WaitState::Visible).await
    }

    pub async fn hidden(&self, locator: &Locator) -> E2eResult<()> {
        self.state(locator, WaitState::Hidden).await
    }

    /// Some element showing `text` becomes visible
    pub async fn text(&self, text: &str) -> E2eResult<()> {
        self.visible(&Locator::text(text)).await
    }

    /// An element matching `locator` and containing `text` becomes visible
    pub async fn contains_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.visible(&locator.clone().has_text(text)).await
    }

    /// Every line in `lines` becomes visible, checked in order
    pub async fn all_texts<S: AsRef<str>>(&self, lines: &[S]) -> E2eResult<()> {
        for line in lines {
            self.text(line.as_ref()).await?;
        }
        Ok(())
    }

    async fn state(&self, locator: &Locator, state: WaitState) -> E2eResult<()> {
        let target = locator.clone().first();
        debug!("expect {} to be {:?}", locator, state);
        if self.page.wait_for(&target, state, self.timeout).await? {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed(format!(
                "{} not {} within {} ms",
                locator,
                match state {
                    WaitState::Visible => "visible",
                    WaitState::Hidden => "hidden",
                    WaitState::Attached => "attached",
                    WaitState::Detached => "detached",
                },
                self.timeout.as_millis()
            )))
        }
    }
}

/// Whether `locator` shows up within `timeout`, without failing when it doesn't
pub async fn appears_within(page: &dyn Page, locator: &Locator, timeout: Duration) -> E2eResult<bool> {
    page.wait_for(&locator.clone().first(), WaitState::Visible, timeout)
        .await
}
