//! Scripted in-memory browser for exercising flows without Playwright.
//!
//! Every page created from a [`Fake`] shares one action log and one rule set.
//! Rules match on a substring of the locator's display form; the first rule
//! added wins. Without a rule, elements are visible, counts are 1, texts are
//! empty and lists scroll.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crm_e2e::driver::{Browser, BrowserContext, ClickOptions, LoadState, Locator, Page, WaitState};
use crm_e2e::{E2eError, E2eResult};
use crm_e2e_common::SuiteConfig;

/// Answers handed out in order; the last one repeats
struct Answers<T>(VecDeque<T>);

impl<T: Clone> Answers<T> {
    fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self(values.into_iter().collect())
    }

    fn next(&mut self) -> Option<T> {
        if self.0.len() > 1 {
            self.0.pop_front()
        } else {
            self.0.front().cloned()
        }
    }
}

struct Rule<T> {
    pattern: String,
    answers: Answers<T>,
}

fn answer<T: Clone>(rules: &mut [Rule<T>], locator: &Locator) -> Option<T> {
    let shown = locator.to_string();
    rules
        .iter_mut()
        .find(|r| shown.contains(&r.pattern))
        .and_then(|r| r.answers.next())
}

#[derive(Default)]
struct State {
    log: Vec<String>,
    visible: Vec<Rule<bool>>,
    counts: Vec<Rule<usize>>,
    texts: Vec<Rule<String>>,
    attributes: Vec<(String, String, String)>,
    evaluations: Vec<Rule<Value>>,
    failures: Vec<String>,
    popups: VecDeque<bool>,
    contexts_opened: usize,
    contexts_closed: usize,
    pages_opened: usize,
}

/// Test handle: configures rules and inspects what the flows did
#[derive(Clone, Default)]
pub struct Fake {
    state: Arc<Mutex<State>>,
}

impl Fake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn browser(&self) -> Arc<dyn Browser> {
        Arc::new(FakeBrowser { fake: self.clone() })
    }

    /// A page outside any context, as a scenario's main page
    pub fn page(&self) -> Arc<dyn Page> {
        self.new_page()
    }

    fn new_page(&self) -> Arc<dyn Page> {
        let id = {
            let mut state = self.state.lock();
            state.pages_opened += 1;
            state.pages_opened
        };
        Arc::new(FakePage {
            id,
            fake: self.clone(),
        })
    }

    pub fn visible(&self, pattern: &str, answers: impl IntoIterator<Item = bool>) -> &Self {
        self.state.lock().visible.push(Rule {
            pattern: pattern.to_string(),
            answers: Answers::new(answers),
        });
        self
    }

    pub fn hidden(&self, pattern: &str) -> &Self {
        self.visible(pattern, [false])
    }

    pub fn count(&self, pattern: &str, answers: impl IntoIterator<Item = usize>) -> &Self {
        self.state.lock().counts.push(Rule {
            pattern: pattern.to_string(),
            answers: Answers::new(answers),
        });
        self
    }

    pub fn text(&self, pattern: &str, text: &str) -> &Self {
        self.state.lock().texts.push(Rule {
            pattern: pattern.to_string(),
            answers: Answers::new([text.to_string()]),
        });
        self
    }

    pub fn attribute(&self, pattern: &str, name: &str, value: &str) -> &Self {
        self.state
            .lock()
            .attributes
            .push((pattern.to_string(), name.to_string(), value.to_string()));
        self
    }

    pub fn evaluate(&self, pattern: &str, answers: impl IntoIterator<Item = Value>) -> &Self {
        self.state.lock().evaluations.push(Rule {
            pattern: pattern.to_string(),
            answers: Answers::new(answers),
        });
        self
    }

    /// Any action whose log line contains `pattern` fails
    pub fn fail_on(&self, pattern: &str) -> &Self {
        self.state.lock().failures.push(pattern.to_string());
        self
    }

    /// The next popup wait sees a new page
    pub fn popup_opens(&self) -> &Self {
        self.state.lock().popups.push_back(true);
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Number of log lines equal to `line`
    pub fn occurrences(&self, line: &str) -> usize {
        self.state.lock().log.iter().filter(|l| *l == line).count()
    }

    /// Whether some log line contains `fragment`
    pub fn logged(&self, fragment: &str) -> bool {
        self.state.lock().log.iter().any(|l| l.contains(fragment))
    }

    /// (opened, closed) browser contexts
    pub fn contexts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.contexts_opened, state.contexts_closed)
    }

    fn record(&self, line: String) -> E2eResult<()> {
        let mut state = self.state.lock();
        let failed = state.failures.iter().any(|f| line.contains(f.as_str()));
        state.log.push(line.clone());
        if failed {
            Err(E2eError::step("fake", line))
        } else {
            Ok(())
        }
    }
}

/// Configuration with short timeouts for fake runs
pub fn config() -> Arc<SuiteConfig> {
    Arc::new(config_with(|_| {}))
}

pub fn config_with(edit: impl FnOnce(&mut SuiteConfig)) -> SuiteConfig {
    let mut config = SuiteConfig::default();
    config.timeouts.assertion_ms = 10;
    config.timeouts.notification_ms = 10;
    config.timeouts.popup_ms = 10;
    config.timeouts.scenario_ms = 1_000;
    edit(&mut config);
    config
}

struct FakeBrowser {
    fake: Fake,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_context(&self) -> E2eResult<Arc<dyn BrowserContext>> {
        self.fake.state.lock().contexts_opened += 1;
        self.fake.record("context+".to_string())?;
        Ok(Arc::new(FakeContext {
            fake: self.fake.clone(),
        }))
    }

    async fn close(&self) -> E2eResult<()> {
        self.fake.record("browser-".to_string())
    }
}

struct FakeContext {
    fake: Fake,
}

#[async_trait]
impl BrowserContext for FakeContext {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>> {
        self.fake.record("page+".to_string())?;
        Ok(self.fake.new_page())
    }

    async fn close(&self) -> E2eResult<()> {
        self.fake.state.lock().contexts_closed += 1;
        self.fake.record("context-".to_string())
    }
}

pub struct FakePage {
    pub id: usize,
    fake: Fake,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.fake.record(format!("goto {url}"))
    }

    async fn url(&self) -> E2eResult<String> {
        Ok(format!("fake://page/{}", self.id))
    }

    async fn click_with(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()> {
        let verb = if options.force { "click!" } else { "click" };
        self.fake.record(format!("{verb} {locator}"))
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.fake.record(format!("fill {locator} = {value}"))
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.fake.record(format!("press {locator} {key}"))
    }

    async fn keyboard_press(&self, key: &str) -> E2eResult<()> {
        self.fake.record(format!("key {key}"))
    }

    async fn keyboard_type(&self, text: &str) -> E2eResult<()> {
        self.fake.record(format!("type {text}"))
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.fake.record(format!("hover {locator}"))
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, _timeout: Duration) -> E2eResult<bool> {
        self.fake.record(format!("wait {locator}"))?;
        let visible = answer(&mut self.fake.state.lock().visible, locator).unwrap_or(true);
        Ok(match state {
            WaitState::Visible | WaitState::Attached => visible,
            WaitState::Hidden | WaitState::Detached => !visible,
        })
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        self.fake.record(format!("count {locator}"))?;
        Ok(answer(&mut self.fake.state.lock().counts, locator).unwrap_or(1))
    }

    async fn inner_text(&self, locator: &Locator) -> E2eResult<String> {
        self.fake.record(format!("read {locator}"))?;
        Ok(answer(&mut self.fake.state.lock().texts, locator).unwrap_or_default())
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        self.fake.record(format!("attr {locator} {name}"))?;
        let shown = locator.to_string();
        let state = self.fake.state.lock();
        Ok(state
            .attributes
            .iter()
            .find(|(pattern, attr, _)| shown.contains(pattern.as_str()) && attr == name)
            .map(|(_, _, value)| value.clone()))
    }

    async fn evaluate(&self, locator: &Locator, _script: &str, _arg: Value) -> E2eResult<Value> {
        self.fake.record(format!("evaluate {locator}"))?;
        Ok(answer(&mut self.fake.state.lock().evaluations, locator).unwrap_or(Value::Bool(true)))
    }

    async fn wait_for_url(&self, pattern: &str, _timeout: Duration) -> E2eResult<()> {
        self.fake.record(format!("wait_url {pattern}"))
    }

    async fn wait_for_load_state(&self, _state: LoadState) -> E2eResult<()> {
        Ok(())
    }

    async fn wait_for_timeout(&self, _duration: Duration) -> E2eResult<()> {
        Ok(())
    }

    async fn wait_for_popup(&self, _timeout: Duration) -> E2eResult<Option<Arc<dyn Page>>> {
        let opens = self.fake.state.lock().popups.pop_front().unwrap_or(false);
        if opens {
            self.fake.record("popup+".to_string())?;
            Ok(Some(self.fake.new_page()))
        } else {
            Ok(None)
        }
    }

    async fn close(&self) -> E2eResult<()> {
        self.fake.record(format!("page- {}", self.id))
    }
}
