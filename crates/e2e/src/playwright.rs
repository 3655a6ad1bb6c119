//! Playwright browser automation
//!
//! A generated Node script keeps one browser page open and speaks JSON lines
//! over stdin/stdout: requests carry an `id` and get exactly one `reply`;
//! `response` events are pushed unprompted and fanned out to subscribers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command as TokioCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{
    LoadState, Locator, NetworkResponse, Page, PageFactory, ResponseSubscription, SubscriptionId,
    WaitState,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser: {}", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Directory whose `node_modules` provides `playwright`
    pub project_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    pub launch_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            launch_timeout: Duration::from_secs(30),
        }
    }
}

/// Messages printed by the bridge script
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BridgeMessage {
    Ready,
    Reply {
        id: u64,
        ok: bool,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Response {
        url: String,
        status: u16,
    },
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, String>>>>>;
type Subscribers = Arc<Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<NetworkResponse>>>>;

/// A live Playwright page behind the bridge process
pub struct PlaywrightPage {
    stdin: tokio::sync::Mutex<ChildStdin>,
    child: tokio::sync::Mutex<Child>,
    pending: Pending,
    subscribers: Subscribers,
    next_request: AtomicU64,
    next_subscription: AtomicU64,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightPage {
    /// Spawn the bridge and wait until the page is open
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, build_bridge_script(config))?;
        debug!("Bridge script at {}", script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&config.project_dir)
            .env("NODE_PATH", config.project_dir.join("node_modules"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
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

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let subscribers: Subscribers = Arc::new(Mutex::new(HashMap::new()));
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(read_bridge(
            BufReader::new(stdout),
            pending.clone(),
            subscribers.clone(),
            ready_tx,
        ));

        match tokio::time::timeout(config.launch_timeout, ready_rx).await {
            Ok(Ok(())) => info!("Playwright {} page ready", config.browser.as_str()),
            Ok(Err(_)) => {
                return Err(E2eError::Playwright(
                    "bridge exited before the browser was ready".to_string(),
                ))
            }
            Err(_) => {
                return Err(E2eError::Timeout(format!(
                    "browser launch ({} s)",
                    config.launch_timeout.as_secs()
                )))
            }
        }

        Ok(Self {
            stdin: tokio::sync::Mutex::new(stdin),
            child: tokio::sync::Mutex::new(child),
            pending,
            subscribers,
            next_request: AtomicU64::new(1),
            next_subscription: AtomicU64::new(1),
            _script_dir: script_dir,
        })
    }

    async fn call(&self, op: &str, mut args: Value) -> E2eResult<Value> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        if let Some(fields) = args.as_object_mut() {
            fields.insert("id".to_string(), json!(id));
            fields.insert("op".to_string(), json!(op));
        }

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = serde_json::to_string(&args)?;
        line.push('\n');
        {
            let mut stdin = self.stdin.lock().await;
            if let Err(e) = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.flush().await
            }
            .await
            {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) if message.contains("Timeout") => Err(E2eError::Timeout(message)),
            Ok(Err(message)) => Err(E2eError::Playwright(message)),
            Err(_) => Err(E2eError::Bridge(format!("bridge exited during '{}'", op))),
        }
    }

    async fn call_locator(&self, op: &str, locator: &Locator, mut extra: Value) -> E2eResult<Value> {
        if let Some(fields) = extra.as_object_mut() {
            fields.insert("chain".to_string(), serde_json::to_value(&locator.chain)?);
        }
        self.call(op, extra).await
    }
}

async fn read_bridge<R>(
    mut reader: BufReader<R>,
    pending: Pending,
    subscribers: Subscribers,
    ready: oneshot::Sender<()>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut ready = Some(ready);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Bridge read failed: {}", e);
                break;
            }
        }

        let message: BridgeMessage = match serde_json::from_str(line.trim()) {
            Ok(m) => m,
            Err(_) => {
                debug!("[bridge] {}", line.trim_end());
                continue;
            }
        };

        match message {
            BridgeMessage::Ready => {
                if let Some(tx) = ready.take() {
                    let _ = tx.send(());
                }
            }
            BridgeMessage::Reply { id, ok, value, error } => {
                if let Some(tx) = pending.lock().remove(&id) {
                    let reply = if ok {
                        Ok(value)
                    } else {
                        Err(error.unwrap_or_else(|| "unknown bridge error".to_string()))
                    };
                    let _ = tx.send(reply);
                }
            }
            BridgeMessage::Response { url, status } => {
                let response = NetworkResponse { url, status };
                subscribers
                    .lock()
                    .retain(|_, tx| tx.send(response.clone()).is_ok());
            }
        }
    }

    // Dropping the senders fails every in-flight call
    pending.lock().clear();
    subscribers.lock().clear();
    debug!("Bridge output closed");
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call("goto", json!({ "url": url })).await?;
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        let value = self.call("title", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn url(&self) -> E2eResult<String> {
        let value = self.call("url", json!({})).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self.call_locator("count", locator, json!({})).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.call_locator("click", locator, json!({})).await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call_locator("fill", locator, json!({ "value": value })).await?;
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.call_locator("press", locator, json!({ "key": key })).await?;
        Ok(())
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self.call_locator("text_content", locator, json!({})).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn all_text_contents(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        let value = self.call_locator("all_text_contents", locator, json!({})).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .call_locator("attribute", locator, json!({ "name": name }))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let value = self.call_locator("is_visible", locator, json!({})).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.call_locator(
            "wait_for",
            locator,
            json!({ "state": state.as_str(), "timeout": timeout.as_millis() as u64 }),
        )
        .await?;
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> E2eResult<()> {
        self.call(
            "wait_for_load_state",
            json!({ "state": state.as_str(), "timeout": timeout.as_millis() as u64 }),
        )
        .await?;
        Ok(())
    }

    fn on_response(&self) -> ResponseSubscription {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(id, tx);
        ResponseSubscription { id, responses: rx }
    }

    fn off_response(&self, id: SubscriptionId) {
        self.subscribers.lock().remove(&id);
    }

    async fn close(&self) -> E2eResult<()> {
        let closed = self.call("close", json!({})).await;
        let mut child = self.child.lock().await;
        match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
            Ok(status) => debug!("Bridge exited: {:?}", status?),
            Err(_) => {
                warn!("Bridge did not exit, killing it");
                child.kill().await?;
            }
        }
        closed.map(|_| ())
    }
}

/// Launches one browser page per scenario
pub struct PlaywrightFactory {
    config: PlaywrightConfig,
}

impl PlaywrightFactory {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageFactory for PlaywrightFactory {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>> {
        Ok(Arc::new(PlaywrightPage::launch(&self.config).await?))
    }
}

/// Check once that `npx playwright` runs. Launching a page does not
/// repeat the check.
pub async fn check_playwright_installed() -> E2eResult<()> {
    check_program_runs("npx", &["playwright", "--version"]).await
}

async fn check_program_runs(program: &str, args: &[&str]) -> E2eResult<()> {
    let status = TokioCommand::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// Build the Node bridge script for `config`
pub fn build_bridge_script(config: &PlaywrightConfig) -> String {
    let mut script = String::new();

    // Header
    script.push_str(&format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const readline = require('readline');

const emit = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
    ));

    script.push_str(BRIDGE_BODY);
    script
}

const BRIDGE_BODY: &str = r#"
  page.on('response', (r) => emit({ type: 'response', url: r.url(), status: r.status() }));

  const resolve = (chain) => {
    let loc = page;
    for (const seg of chain) {
      let next;
      if (seg.by === 'role') {
        const opts = seg.name == null ? {} : { name: seg.name, exact: seg.exact };
        next = loc.getByRole(seg.role, opts);
      } else if (seg.by === 'text') {
        next = loc.getByText(seg.text, { exact: seg.exact });
      } else {
        next = loc.locator(seg.selector);
      }
      if (seg.has_text != null) next = next.filter({ hasText: seg.has_text });
      if (seg.nth != null) next = next.nth(seg.nth);
      loc = next;
    }
    return loc;
  };

  const ops = {
    goto: (m) => page.goto(m.url).then(() => null),
    title: () => page.title(),
    url: async () => page.url(),
    count: (m) => resolve(m.chain).count(),
    click: (m) => resolve(m.chain).click(),
    fill: (m) => resolve(m.chain).fill(m.value),
    press: (m) => resolve(m.chain).press(m.key),
    text_content: (m) => resolve(m.chain).textContent(),
    all_text_contents: (m) => resolve(m.chain).allTextContents(),
    attribute: (m) => resolve(m.chain).getAttribute(m.name),
    is_visible: (m) => resolve(m.chain).isVisible(),
    wait_for: (m) => resolve(m.chain).waitFor({ state: m.state, timeout: m.timeout }),
    wait_for_load_state: (m) => page.waitForLoadState(m.state, { timeout: m.timeout }),
    close: () => browser.close(),
  };

  const rl = readline.createInterface({ input: process.stdin });
  rl.on('line', async (line) => {
    let msg;
    try {
      msg = JSON.parse(line);
    } catch (e) {
      return;
    }
    const op = ops[msg.op];
    if (!op) {
      emit({ type: 'reply', id: msg.id, ok: false, error: 'unknown op: ' + msg.op });
      return;
    }
    try {
      const value = await op(msg);
      emit({ type: 'reply', id: msg.id, ok: true, value: value === undefined ? null : value });
      if (msg.op === 'close') process.exit(0);
    } catch (error) {
      emit({ type: 'reply', id: msg.id, ok: false, error: String(error && error.message || error) });
    }
  });
  rl.on('close', async () => {
    await browser.close().catch(() => {});
    process.exit(0);
  });

  emit({ type: 'ready' });
})().catch((error) => {
  console.error(error);
  process.exit(1);
});
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_reports_playwright_not_found() {
        let err = check_program_runs("wakamiti-no-such-program", &["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::PlaywrightNotFound));
    }

    #[test]
    fn test_script_uses_config() {
        let script = build_bridge_script(&PlaywrightConfig {
            browser: Browser::Firefox,
            headless: false,
            viewport_width: 1920,
            viewport_height: 1080,
            ..Default::default()
        });
        assert!(script.contains("await firefox.launch({ headless: false })"));
        assert!(script.contains("viewport: { width: 1920, height: 1080 }"));
        assert!(script.contains("page.on('response'"));
        assert!(script.contains("emit({ type: 'ready' })"));
    }

    #[test]
    fn test_bridge_messages_parse() {
        let reply: BridgeMessage =
            serde_json::from_str(r#"{"type":"reply","id":4,"ok":true,"value":["A","B"]}"#).unwrap();
        assert!(matches!(reply, BridgeMessage::Reply { id: 4, ok: true, .. }));

        let failure: BridgeMessage =
            serde_json::from_str(r#"{"type":"reply","id":5,"ok":false,"error":"Timeout 5000ms exceeded"}"#)
                .unwrap();
        match failure {
            BridgeMessage::Reply { ok, error, .. } => {
                assert!(!ok);
                assert_eq!(error.as_deref(), Some("Timeout 5000ms exceeded"));
            }
            other => panic!("unexpected message {:?}", other),
        }

        let response: BridgeMessage =
            serde_json::from_str(r#"{"type":"response","url":"https://x/y","status":200}"#).unwrap();
        assert!(matches!(response, BridgeMessage::Response { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_reader_routes_replies_and_responses() {
        let input = concat!(
            r#"{"type":"ready"}"#, "\n",
            "some console noise\n",
            r#"{"type":"response","url":"https://x/export","status":200}"#, "\n",
            r#"{"type":"reply","id":1,"ok":true,"value":3}"#, "\n",
        );
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let subscribers: Subscribers = Arc::new(Mutex::new(HashMap::new()));
        let (reply_tx, reply_rx) = oneshot::channel();
        pending.lock().insert(1, reply_tx);
        let (sub_tx, mut sub_rx) = mpsc::unbounded_channel();
        subscribers.lock().insert(9, sub_tx);
        let (ready_tx, ready_rx) = oneshot::channel();

        read_bridge(
            BufReader::new(input.as_bytes()),
            pending.clone(),
            subscribers.clone(),
            ready_tx,
        )
        .await;

        assert!(ready_rx.await.is_ok());
        assert_eq!(reply_rx.await.unwrap().unwrap(), json!(3));
        assert_eq!(sub_rx.recv().await.unwrap().status, 200);
        assert!(pending.lock().is_empty());
        assert!(subscribers.lock().is_empty());
    }
}
