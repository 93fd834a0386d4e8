//! Clicks that open new windows

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::driver::{ClickOptions, LoadState, Locator, Page};
use crate::error::{E2eError, E2eResult};

/// Click `locator` while listening for a popup, and return the popup if one
/// opened within `timeout`.
///
/// The listener is registered before the click is sent, so a window opened
/// immediately by the click is not missed.
pub async fn click_maybe_popup(
    page: &Arc<dyn Page>,
    locator: &Locator,
    options: ClickOptions,
    timeout: Duration,
) -> E2eResult<Option<Arc<dyn Page>>> {
    let (popup, clicked) = tokio::join!(
        page.wait_for_popup(timeout),
        page.click_with(locator, options),
    );
    clicked?;

    match popup {
        Ok(Some(popup)) => {
            popup.wait_for_load_state(LoadState::DomContentLoaded).await?;
            Ok(Some(popup))
        }
        Ok(None) => Ok(None),
        Err(e) => {
            warn!("Popup wait after {} failed: {}", locator, e);
            Ok(None)
        }
    }
}

/// Click a link that may open in a new window and return whichever page now
/// shows its target: the popup if one opened, `page` otherwise.
pub async fn follow_link(
    page: &Arc<dyn Page>,
    locator: &Locator,
    timeout: Duration,
) -> E2eResult<Arc<dyn Page>> {
    match click_maybe_popup(page, locator, ClickOptions::forced(), timeout).await? {
        Some(popup) => Ok(popup),
        None => {
            debug!("{} opened in the same window", locator);
            page.wait_for_load_state(LoadState::DomContentLoaded).await?;
            Ok(Arc::clone(page))
        }
    }
}

/// Click a link that must open a new tab
pub async fn open_in_new_tab(
    page: &Arc<dyn Page>,
    locator: &Locator,
    timeout: Duration,
) -> E2eResult<Arc<dyn Page>> {
    click_maybe_popup(page, locator, ClickOptions::default(), timeout)
        .await?
        .ok_or_else(|| E2eError::PopupNotOpened(locator.to_string()))
}
