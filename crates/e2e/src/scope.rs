//! Browser contexts owned by one scenario.
//!
//! A scenario may open extra contexts (inbox, client login) besides its
//! own. When the runner's timeout drops the scenario future, the closes
//! those flows would have run never happen, so every context is opened
//! through a [`ScopedBrowser`] and whatever is still open is closed by
//! [`ScopedBrowser::close_all`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::driver::{Browser, BrowserContext, Page};
use crate::error::E2eResult;

struct TrackedContext {
    inner: Arc<dyn BrowserContext>,
    closed: AtomicBool,
}

impl TrackedContext {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl BrowserContext for TrackedContext {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>> {
        self.inner.new_page().await
    }

    async fn close(&self) -> E2eResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        let result = self.inner.close().await;
        self.closed.store(true, Ordering::Release);
        result
    }
}

/// Wraps the suite browser for the lifetime of one scenario
pub struct ScopedBrowser {
    inner: Arc<dyn Browser>,
    contexts: Mutex<Vec<Arc<TrackedContext>>>,
}

impl ScopedBrowser {
    pub fn new(inner: Arc<dyn Browser>) -> Self {
        Self {
            inner,
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Contexts opened through this scope that are not closed yet
    pub fn open_contexts(&self) -> usize {
        self.contexts.lock().iter().filter(|c| !c.is_closed()).count()
    }

    /// Close every context still open. Failures are logged, not returned.
    pub async fn close_all(&self) {
        let pending: Vec<Arc<TrackedContext>> = self
            .contexts
            .lock()
            .drain(..)
            .filter(|c| !c.is_closed())
            .collect();

        if !pending.is_empty() {
            debug!("Closing {} context(s) left open", pending.len());
        }
        for context in pending {
            if let Err(e) = context.close().await {
                warn!("Failed to close browser context: {}", e);
            }
        }
    }
}

#[async_trait]
impl Browser for ScopedBrowser {
    async fn new_context(&self) -> E2eResult<Arc<dyn BrowserContext>> {
        let context = Arc::new(TrackedContext {
            inner: self.inner.new_context().await?,
            closed: AtomicBool::new(false),
        });
        self.contexts.lock().push(Arc::clone(&context));
        Ok(context)
    }

    /// Scenarios never shut down the shared browser; this only releases
    /// their own contexts
    async fn close(&self) -> E2eResult<()> {
        self.close_all().await;
        Ok(())
    }
}
