//! Browser driver seam.
//!
//! Flows talk to the browser only through [`Browser`], [`BrowserContext`] and
//! [`Page`]. The Playwright bridge implements them for real runs; the
//! integration tests implement them with a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::E2eResult;

/// How to find an element on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// CSS or XPath selector
    Css { selector: String },
    /// Element by its visible text
    Text { text: String, exact: bool },
    /// Element by ARIA role and accessible name
    Role {
        role: String,
        name: Option<String>,
        exact: bool,
    },
    /// Input by placeholder
    Placeholder { text: String },
    /// Input by associated label
    Label { text: String },
    /// `inner` narrowed to elements containing (or not containing) `text`
    Filter {
        inner: Box<Locator>,
        text: String,
        regex: bool,
        negate: bool,
    },
    /// One match of `inner`; negative indexes count from the end
    Nth { inner: Box<Locator>, index: i32 },
    /// `child` resolved inside `parent`
    Within {
        parent: Box<Locator>,
        child: Box<Locator>,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            exact: false,
        }
    }

    pub fn exact_text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            exact: true,
        }
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: true,
        }
    }

    pub fn any_role(role: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: None,
            exact: false,
        }
    }

    pub fn button(name: impl Into<String>) -> Self {
        Self::role("button", name)
    }

    pub fn tab(name: impl Into<String>) -> Self {
        Self::role("tab", name)
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Locator::Placeholder { text: text.into() }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Locator::Label { text: text.into() }
    }

    pub fn has_text(self, text: impl Into<String>) -> Self {
        Locator::Filter {
            inner: Box::new(self),
            text: text.into(),
            regex: false,
            negate: false,
        }
    }

    /// Narrow to elements whose text matches a JavaScript regular expression
    pub fn has_text_matching(self, pattern: impl Into<String>) -> Self {
        Locator::Filter {
            inner: Box::new(self),
            text: pattern.into(),
            regex: true,
            negate: false,
        }
    }

    pub fn has_not_text(self, text: impl Into<String>) -> Self {
        Locator::Filter {
            inner: Box::new(self),
            text: text.into(),
            regex: false,
            negate: true,
        }
    }

    pub fn nth(self, index: i32) -> Self {
        Locator::Nth {
            inner: Box::new(self),
            index,
        }
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn last(self) -> Self {
        self.nth(-1)
    }

    /// Resolve `child` inside this locator
    pub fn locate(self, child: Locator) -> Self {
        Locator::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => write!(f, "{selector}"),
            Locator::Text { text, exact: true } => write!(f, "text=\"{text}\""),
            Locator::Text { text, exact: false } => write!(f, "text={text}"),
            Locator::Role { role, name: None, .. } => write!(f, "role={role}"),
            Locator::Role {
                role,
                name: Some(name),
                ..
            } => write!(f, "role={role}[name=\"{name}\"]"),
            Locator::Placeholder { text } => write!(f, "placeholder=\"{text}\""),
            Locator::Label { text } => write!(f, "label=\"{text}\""),
            Locator::Filter {
                inner,
                text,
                regex,
                negate,
            } => {
                let op = if *negate { "has-not-text" } else { "has-text" };
                if *regex {
                    write!(f, "{inner} >> {op}=/{text}/")
                } else {
                    write!(f, "{inner} >> {op}=\"{text}\"")
                }
            }
            Locator::Nth { inner, index } => write!(f, "{inner} >> nth={index}"),
            Locator::Within { parent, child } => write!(f, "{parent} >> {child}"),
        }
    }
}

/// Element state to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// Document load milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    DomContentLoaded,
    Load,
    NetworkIdle,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClickOptions {
    /// Skip actionability checks (overlays, animations)
    pub force: bool,
}

impl ClickOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// A browser able to open isolated contexts
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_context(&self) -> E2eResult<Arc<dyn BrowserContext>>;
    async fn close(&self) -> E2eResult<()>;
}

/// An isolated cookie/storage jar holding pages
#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>>;
    async fn close(&self) -> E2eResult<()>;
}

/// One tab
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;
    async fn url(&self) -> E2eResult<String>;

    async fn click_with(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.click_with(locator, ClickOptions::default()).await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()>;

    /// Press a key with `locator` focused
    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()>;

    /// Press a key on whatever currently has focus
    async fn keyboard_press(&self, key: &str) -> E2eResult<()>;

    async fn keyboard_type(&self, text: &str) -> E2eResult<()>;

    async fn hover(&self, locator: &Locator) -> E2eResult<()>;

    /// Wait until `locator` reaches `state`; `Ok(false)` when the timeout elapses first
    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<bool>;

    async fn count(&self, locator: &Locator) -> E2eResult<usize>;

    async fn inner_text(&self, locator: &Locator) -> E2eResult<String>;

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>>;

    /// Run `script` (a JS function taking the element and `arg`) against `locator`
    async fn evaluate(
        &self,
        locator: &Locator,
        script: &str,
        arg: serde_json::Value,
    ) -> E2eResult<serde_json::Value>;

    /// Wait until the URL matches a glob such as `**/dashboard`
    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> E2eResult<()>;

    async fn wait_for_load_state(&self, state: LoadState) -> E2eResult<()>;

    async fn wait_for_timeout(&self, duration: Duration) -> E2eResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Next window opened by this page, or `None` if none opens within `timeout`
    async fn wait_for_popup(&self, timeout: Duration) -> E2eResult<Option<Arc<dyn Page>>>;

    async fn close(&self) -> E2eResult<()>;
}
