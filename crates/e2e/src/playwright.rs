//! Playwright browser automation
//!
//! A single `node` process runs the bridge script below and keeps the browser
//! alive for the whole suite. Requests and responses are JSON lines tagged
//! with an id, so several requests can be in flight at once (a popup wait
//! racing the click that opens it).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command as TokioCommand};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::driver::{Browser, BrowserContext, ClickOptions, LoadState, Locator, Page, WaitState};
use crate::error::{E2eError, E2eResult};

/// How long the bridge gets to exit after SIGTERM
const BRIDGE_EXIT_GRACE: Duration = Duration::from_millis(500);

const BRIDGE_SCRIPT: &str = r#"
const playwright = require(process.env.PLAYWRIGHT_MODULE || 'playwright');
const readline = require('readline');

const contexts = new Map();
const pages = new Map();
let browser = null;
let nextHandle = 1;

function register(page) {
  const id = nextHandle++;
  pages.set(id, page);
  page.on('close', () => pages.delete(id));
  return id;
}

function pageOf(msg) {
  const page = pages.get(msg.page);
  if (!page) throw new Error(`unknown page ${msg.page}`);
  return page;
}

function resolve(root, loc) {
  switch (loc.by) {
    case 'css': return root.locator(loc.selector);
    case 'text': return root.getByText(loc.text, { exact: loc.exact });
    case 'role':
      return loc.name == null
        ? root.getByRole(loc.role)
        : root.getByRole(loc.role, { name: loc.name, exact: loc.exact });
    case 'placeholder': return root.getByPlaceholder(loc.text);
    case 'label': return root.getByLabel(loc.text);
    case 'filter': {
      const text = loc.regex ? new RegExp(loc.text) : loc.text;
      return resolve(root, loc.inner).filter(loc.negate ? { hasNotText: text } : { hasText: text });
    }
    case 'nth': return resolve(root, loc.inner).nth(loc.index);
    case 'within': return resolve(resolve(root, loc.parent), loc.child);
    default: throw new Error(`unknown locator kind ${loc.by}`);
  }
}

const target = (msg) => resolve(pageOf(msg), msg.locator);
const isTimeout = (e) => e instanceof playwright.errors.TimeoutError;

async function handle(msg) {
  switch (msg.op) {
    case 'launch':
      browser = await playwright[msg.browser].launch({ headless: msg.headless });
      return null;
    case 'closeBrowser':
      if (browser) await browser.close();
      browser = null;
      return null;
    case 'newContext': {
      const context = await browser.newContext({ viewport: msg.viewport });
      context.setDefaultTimeout(msg.timeout);
      const id = nextHandle++;
      contexts.set(id, context);
      return id;
    }
    case 'closeContext': {
      const context = contexts.get(msg.context);
      contexts.delete(msg.context);
      if (context) await context.close();
      return null;
    }
    case 'newPage': {
      const context = contexts.get(msg.context);
      if (!context) throw new Error(`unknown context ${msg.context}`);
      return register(await context.newPage());
    }
    case 'closePage': await pageOf(msg).close(); return null;
    case 'goto': await pageOf(msg).goto(msg.url); return null;
    case 'url': return pageOf(msg).url();
    case 'click': await target(msg).click({ force: msg.force }); return null;
    case 'fill': await target(msg).fill(msg.value); return null;
    case 'press': await target(msg).press(msg.key); return null;
    case 'keyboardPress': await pageOf(msg).keyboard.press(msg.key); return null;
    case 'keyboardType': await pageOf(msg).keyboard.type(msg.text); return null;
    case 'hover': await target(msg).hover(); return null;
    case 'waitFor':
      try {
        await target(msg).waitFor({ state: msg.state, timeout: msg.timeout });
        return true;
      } catch (e) {
        if (isTimeout(e)) return false;
        throw e;
      }
    case 'count': return await target(msg).count();
    case 'innerText': return await target(msg).innerText();
    case 'getAttribute': return await target(msg).getAttribute(msg.name);
    case 'evaluate': return await target(msg).evaluate(msg.script, msg.arg);
    case 'waitForUrl': await pageOf(msg).waitForURL(msg.pattern, { timeout: msg.timeout }); return null;
    case 'waitForLoadState': await pageOf(msg).waitForLoadState(msg.state); return null;
    case 'waitForPopup':
      try {
        return register(await pageOf(msg).waitForEvent('popup', { timeout: msg.timeout }));
      } catch (e) {
        if (isTimeout(e)) return null;
        throw e;
      }
    default: throw new Error(`unknown op ${msg.op}`);
  }
}

const reply = (obj) => process.stdout.write(JSON.stringify(obj) + '\n');

readline.createInterface({ input: process.stdin })
  .on('line', (line) => {
    let msg;
    try {
      msg = JSON.parse(line);
    } catch (e) {
      console.error(`bad request: ${line}`);
      return;
    }
    handle(msg).then(
      (value) => reply({ id: msg.id, ok: true, value: value ?? null }),
      (error) => reply({ id: msg.id, ok: false, error: String(error && error.message || error) }),
    );
  })
  .on('close', async () => {
    if (browser) await browser.close();
    process.exit(0);
  });
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" | "safari" => Ok(BrowserKind::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser `{other}`"))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Default timeout for every action (click, fill, ...)
    pub action_timeout: Duration,
    /// Directory whose `node_modules` provides `playwright`
    pub project_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout: Duration::from_secs(15),
            project_dir: PathBuf::from("."),
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    op: &'a str,
    #[serde(flatten)]
    params: Value,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, String>>>>>;

/// The running bridge process
struct Bridge {
    stdin: tokio::sync::Mutex<ChildStdin>,
    pending: Pending,
    next_id: AtomicU64,
    child: Mutex<Option<Child>>,
    _script_dir: tempfile::TempDir,
}

impl Bridge {
    async fn spawn(config: &PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        debug!("Starting Playwright bridge: {}", script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&config.project_dir)
            .env("NODE_PATH", config.project_dir.join("node_modules"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "playwright", "{}", line);
                }
            });
        }

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match serde_json::from_str::<Response>(&line) {
                        Ok(response) => {
                            if let Some(tx) = reader_pending.lock().remove(&response.id) {
                                let outcome = if response.ok {
                                    Ok(response.value)
                                } else {
                                    Err(response
                                        .error
                                        .unwrap_or_else(|| "unknown error".to_string()))
                                };
                                let _ = tx.send(outcome);
                            }
                        }
                        Err(_) => debug!(target: "playwright", "{}", line),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Bridge stdout read failed: {}", e);
                        break;
                    }
                }
            }
            // Dropping the senders wakes every waiter with a closed channel
            reader_pending.lock().clear();
        });

        Ok(Self {
            stdin: tokio::sync::Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
            child: Mutex::new(Some(child)),
            _script_dir: script_dir,
        })
    }

    async fn call(&self, op: &str, params: Value) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = serde_json::to_vec(&Request { id, op, params })?;
        line.push(b'\n');

        let written = {
            let mut stdin = self.stdin.lock().await;
            match stdin.write_all(&line).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = written {
            self.pending.lock().remove(&id);
            return Err(E2eError::Bridge(format!("failed to send {op}: {e}")));
        }

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(E2eError::Playwright(format!("{op}: {message}"))),
            Err(_) => Err(E2eError::Bridge(format!(
                "bridge exited before answering {op}"
            ))),
        }
    }

    async fn stop(&self) -> E2eResult<()> {
        let Some(child) = self.child.lock().take() else {
            return Ok(());
        };
        terminate(child).await
    }
}

/// SIGTERM `child` and give it [`BRIDGE_EXIT_GRACE`] to exit before killing it
async fn terminate(mut child: Child) -> E2eResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            info!("Stopping Playwright bridge (pid: {})", pid);
            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && tokio::time::timeout(BRIDGE_EXIT_GRACE, child.wait())
                    .await
                    .is_ok()
            {
                return Ok(());
            }
        }
    }

    if let Ok(None) = child.try_wait() {
        child.start_kill()?;
    }
    Ok(())
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // kill_on_drop reaps the child if stop() never ran
        if let Some(mut child) = self.child.lock().take() {
            if let Err(e) = child.start_kill() {
                debug!("Bridge already gone: {}", e);
            }
        }
    }
}

/// Check if Playwright is installed
fn check_playwright_installed() -> E2eResult<()> {
    let status = Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

fn as_handle(value: Value, op: &str) -> E2eResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| E2eError::Bridge(format!("{op} returned {value} instead of a handle")))
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Real browser driven through the bridge
pub struct PlaywrightBrowser {
    bridge: Arc<Bridge>,
    config: PlaywrightConfig,
}

impl PlaywrightBrowser {
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        let bridge = Arc::new(Bridge::spawn(&config).await?);
        bridge
            .call(
                "launch",
                json!({ "browser": config.browser.as_str(), "headless": config.headless }),
            )
            .await?;
        info!(
            "Launched {} (headless: {})",
            config.browser.as_str(),
            config.headless
        );
        Ok(Self { bridge, config })
    }

    /// Close the browser and stop the bridge process
    pub async fn shutdown(&self) -> E2eResult<()> {
        self.bridge.call("closeBrowser", json!({})).await?;
        self.bridge.stop().await
    }
}

#[async_trait]
impl Browser for PlaywrightBrowser {
    async fn new_context(&self) -> E2eResult<Arc<dyn BrowserContext>> {
        let value = self
            .bridge
            .call(
                "newContext",
                json!({
                    "viewport": {
                        "width": self.config.viewport_width,
                        "height": self.config.viewport_height,
                    },
                    "timeout": millis(self.config.action_timeout),
                }),
            )
            .await?;
        Ok(Arc::new(PlaywrightContext {
            bridge: Arc::clone(&self.bridge),
            id: as_handle(value, "newContext")?,
        }))
    }

    async fn close(&self) -> E2eResult<()> {
        self.shutdown().await
    }
}

struct PlaywrightContext {
    bridge: Arc<Bridge>,
    id: u64,
}

#[async_trait]
impl BrowserContext for PlaywrightContext {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>> {
        let value = self
            .bridge
            .call("newPage", json!({ "context": self.id }))
            .await?;
        Ok(Arc::new(PlaywrightPage {
            bridge: Arc::clone(&self.bridge),
            id: as_handle(value, "newPage")?,
        }))
    }

    async fn close(&self) -> E2eResult<()> {
        self.bridge
            .call("closeContext", json!({ "context": self.id }))
            .await
            .map(|_| ())
    }
}

struct PlaywrightPage {
    bridge: Arc<Bridge>,
    id: u64,
}

impl PlaywrightPage {
    async fn on(&self, op: &str, locator: &Locator, mut params: Value) -> E2eResult<Value> {
        params["page"] = json!(self.id);
        params["locator"] = serde_json::to_value(locator)?;
        self.bridge.call(op, params).await
    }

    async fn page_op(&self, op: &str, mut params: Value) -> E2eResult<Value> {
        params["page"] = json!(self.id);
        self.bridge.call(op, params).await
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        self.page_op("goto", json!({ "url": url })).await.map(|_| ())
    }

    async fn url(&self) -> E2eResult<String> {
        let value = self.page_op("url", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click_with(&self, locator: &Locator, options: ClickOptions) -> E2eResult<()> {
        debug!("click {}", locator);
        self.on("click", locator, json!({ "force": options.force }))
            .await
            .map(|_| ())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        debug!("fill {}", locator);
        self.on("fill", locator, json!({ "value": value }))
            .await
            .map(|_| ())
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.on("press", locator, json!({ "key": key }))
            .await
            .map(|_| ())
    }

    async fn keyboard_press(&self, key: &str) -> E2eResult<()> {
        self.page_op("keyboardPress", json!({ "key": key }))
            .await
            .map(|_| ())
    }

    async fn keyboard_type(&self, text: &str) -> E2eResult<()> {
        self.page_op("keyboardType", json!({ "text": text }))
            .await
            .map(|_| ())
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.on("hover", locator, json!({})).await.map(|_| ())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<bool> {
        let value = self
            .on(
                "waitFor",
                locator,
                json!({ "state": state, "timeout": millis(timeout) }),
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self.on("count", locator, json!({})).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn inner_text(&self, locator: &Locator) -> E2eResult<String> {
        let value = self.on("innerText", locator, json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .on("getAttribute", locator, json!({ "name": name }))
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn evaluate(&self, locator: &Locator, script: &str, arg: Value) -> E2eResult<Value> {
        self.on("evaluate", locator, json!({ "script": script, "arg": arg }))
            .await
    }

    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> E2eResult<()> {
        self.page_op(
            "waitForUrl",
            json!({ "pattern": pattern, "timeout": millis(timeout) }),
        )
        .await
        .map(|_| ())
        .map_err(|e| E2eError::Timeout(format!("URL {pattern}: {e}")))
    }

    async fn wait_for_load_state(&self, state: LoadState) -> E2eResult<()> {
        self.page_op("waitForLoadState", json!({ "state": state }))
            .await
            .map(|_| ())
    }

    async fn wait_for_popup(&self, timeout: Duration) -> E2eResult<Option<Arc<dyn Page>>> {
        let value = self
            .page_op("waitForPopup", json!({ "timeout": millis(timeout) }))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(Arc::new(PlaywrightPage {
            bridge: Arc::clone(&self.bridge),
            id: as_handle(value, "waitForPopup")?,
        })))
    }

    async fn close(&self) -> E2eResult<()> {
        self.page_op("closePage", json!({})).await.map(|_| ())
    }
}
