//! Browser bridge
//!
//! Drives one live Playwright browser context through a persistent node
//! subprocess. Requests and responses are newline-delimited JSON over the
//! child's stdio, strictly one in flight at a time: UI state mutation is
//! inherently sequential per session, so the lockstep protocol is the
//! concurrency model, not a limitation of it.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use qadrive_common::{Error, HarnessConfig, Result};

use crate::session::StorageState;

/// Element state a wait can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

struct BridgeIo {
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

struct Inner {
    io: tokio::sync::Mutex<BridgeIo>,
    child: std::sync::Mutex<Option<Child>>,
    next_id: AtomicU64,
    config: HarnessConfig,
    // Keeps the extracted driver script alive for the child's lifetime.
    _driver_dir: tempfile::TempDir,
}

/// Handle to one live browser session.
///
/// Cloning is cheap and every clone drives the same context; page objects
/// each hold a clone.
#[derive(Clone)]
pub struct BrowserSession {
    inner: Arc<Inner>,
}

const DRIVER_SOURCE: &str = include_str!("driver.js");

impl BrowserSession {
    /// Launch a browser context, optionally seeded from a persisted session
    /// record.
    pub async fn launch(
        config: &HarnessConfig,
        storage_state: Option<&Path>,
    ) -> Result<Self> {
        ensure_node_installed()?;

        let driver_dir = tempfile::tempdir()?;
        let driver_path = driver_dir.path().join("driver.js");
        std::fs::write(&driver_path, DRIVER_SOURCE)?;

        debug!(driver = %driver_path.display(), browser = config.browser.as_str(), "spawning browser driver");

        let mut child = Command::new("node")
            .arg(&driver_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Browser(format!("failed to spawn node: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Browser("driver stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Browser("driver stdout unavailable".into()))?;
        if let Some(stderr) = child.stderr.take() {
            // surface driver diagnostics without interleaving the protocol
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "qadrive::driver", "{line}");
                }
            });
        }

        let session = Self {
            inner: Arc::new(Inner {
                io: tokio::sync::Mutex::new(BridgeIo {
                    stdin,
                    lines: BufReader::new(stdout).lines(),
                }),
                child: std::sync::Mutex::new(Some(child)),
                next_id: AtomicU64::new(1),
                config: config.clone(),
                _driver_dir: driver_dir,
            }),
        };

        let mut launch = json!({
            "op": "launch",
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "width": config.viewport.width,
            "height": config.viewport.height,
            "baseUrl": config.base_url,
        });
        if let Some(path) = storage_state {
            launch["storageStatePath"] = json!(path.to_string_lossy());
        }
        session
            .call(launch, config.navigation_timeout() + Duration::from_secs(30))
            .await?;

        Ok(session)
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.inner.config
    }

    /// Send one request and wait for its response.
    async fn call(&self, mut request: Value, timeout: Duration) -> Result<Value> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        request["id"] = json!(id);
        let op = request["op"].as_str().unwrap_or("?").to_string();

        let mut io = self.inner.io.lock().await;
        let mut line = serde_json::to_string(&request)?;
        line.push('\n');

        let exchange = async {
            io.stdin.write_all(line.as_bytes()).await?;
            io.stdin.flush().await?;
            loop {
                match io.lines.next_line().await? {
                    Some(raw) => {
                        let response: Value = serde_json::from_str(&raw)?;
                        if response["id"].as_u64() == Some(id) {
                            return Ok::<Value, Error>(response);
                        }
                        warn!(op = %op, "discarding out-of-sequence driver response");
                    }
                    None => {
                        return Err(Error::Browser(format!(
                            "driver exited during '{op}'"
                        )))
                    }
                }
            }
        };

        let response = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| Error::Browser(format!("driver unresponsive during '{op}'")))??;

        if response["ok"].as_bool() == Some(true) {
            Ok(response["value"].clone())
        } else {
            let message = response["error"].as_str().unwrap_or("unknown").to_string();
            if response["timeout"].as_bool() == Some(true) {
                Err(Error::AssertionTimeout {
                    condition: format!("{op}: {message}"),
                    timeout_ms: self.inner.config.wait_timeout_ms,
                })
            } else {
                Err(Error::Browser(message))
            }
        }
    }

    fn op_timeout(&self) -> Duration {
        // wait bound plus slack for the protocol round-trip
        self.inner.config.wait_timeout() + Duration::from_secs(5)
    }

    fn wait_ms(&self) -> u64 {
        self.inner.config.wait_timeout_ms
    }

    /// Navigate to a path relative to the configured base URL.
    pub async fn goto(&self, path: &str) -> Result<()> {
        let timeout = self.inner.config.navigation_timeout();
        self.call(
            json!({"op": "goto", "url": path, "timeoutMs": timeout.as_millis() as u64}),
            timeout + Duration::from_secs(5),
        )
        .await?;
        Ok(())
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        self.call(
            json!({"op": "click", "selector": selector, "timeoutMs": self.wait_ms()}),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.call(
            json!({"op": "fill", "selector": selector, "value": value, "timeoutMs": self.wait_ms()}),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    pub async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        self.call(
            json!({"op": "select", "selector": selector, "value": value, "timeoutMs": self.wait_ms()}),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    pub async fn press(&self, selector: &str, key: &str) -> Result<()> {
        self.call(
            json!({"op": "press", "selector": selector, "key": key, "timeoutMs": self.wait_ms()}),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    pub async fn focus(&self, selector: &str) -> Result<()> {
        self.call(
            json!({"op": "focus", "selector": selector, "timeoutMs": self.wait_ms()}),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    pub async fn blur(&self, selector: &str) -> Result<()> {
        self.call(
            json!({"op": "blur", "selector": selector, "timeoutMs": self.wait_ms()}),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    pub async fn text_content(&self, selector: &str) -> Result<String> {
        let value = self
            .call(
                json!({"op": "text", "selector": selector, "timeoutMs": self.wait_ms()}),
                self.op_timeout(),
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn input_value(&self, selector: &str) -> Result<String> {
        let value = self
            .call(
                json!({"op": "value", "selector": selector, "timeoutMs": self.wait_ms()}),
                self.op_timeout(),
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn is_visible(&self, selector: &str) -> Result<bool> {
        let value = self
            .call(json!({"op": "visible", "selector": selector}), self.op_timeout())
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn is_enabled(&self, selector: &str) -> Result<bool> {
        let value = self
            .call(
                json!({"op": "enabled", "selector": selector, "timeoutMs": self.wait_ms()}),
                self.op_timeout(),
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// The element's `class` attribute, empty when absent.
    pub async fn class_attr(&self, selector: &str) -> Result<String> {
        let value = self
            .call(
                json!({"op": "attr", "selector": selector, "name": "class", "timeoutMs": self.wait_ms()}),
                self.op_timeout(),
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Computed CSS property value.
    pub async fn css_value(&self, selector: &str, property: &str) -> Result<String> {
        let value = self
            .call(
                json!({"op": "css", "selector": selector, "prop": property, "timeoutMs": self.wait_ms()}),
                self.op_timeout(),
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().trim().to_string())
    }

    /// Text content of every element matching the selector.
    pub async fn all_text_contents(&self, selector: &str) -> Result<Vec<String>> {
        let value = self
            .call(json!({"op": "texts", "selector": selector}), self.op_timeout())
            .await?;
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn count(&self, selector: &str) -> Result<usize> {
        let value = self
            .call(json!({"op": "count", "selector": selector}), self.op_timeout())
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    /// Wait for an element to reach a state, bounded by `timeout` (or the
    /// configured wait bound). Expiry fails with `AssertionTimeout`.
    pub async fn wait_for(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let bound = timeout.unwrap_or_else(|| self.inner.config.wait_timeout());
        let result = self
            .call(
                json!({
                    "op": "waitFor",
                    "selector": selector,
                    "state": state.as_str(),
                    "timeoutMs": bound.as_millis() as u64,
                }),
                bound + Duration::from_secs(5),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(Error::AssertionTimeout { .. }) => Err(Error::AssertionTimeout {
                condition: format!("'{selector}' {}", state.as_str()),
                timeout_ms: bound.as_millis() as u64,
            }),
            Err(e) => Err(e),
        }
    }

    /// Fulfill requests matching `url` with a canned response instead of
    /// letting them reach the backend.
    pub async fn mock_route(&self, url: &str, status: u16, body: &Value) -> Result<()> {
        self.call(
            json!({
                "op": "mockRoute",
                "url": url,
                "status": status,
                "contentType": "application/json",
                "body": serde_json::to_string(body)?,
            }),
            self.op_timeout(),
        )
        .await?;
        Ok(())
    }

    /// Snapshot the context's storage state (cookies and origin storage).
    pub async fn storage_state(&self) -> Result<StorageState> {
        let value = self
            .call(json!({"op": "storageState"}), self.op_timeout())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Close the browser and stop the driver process.
    pub async fn close(&self) -> Result<()> {
        let _ = self
            .call(json!({"op": "close"}), Duration::from_secs(10))
            .await;

        let child = self.inner.child.lock().unwrap().take();
        if let Some(mut child) = child {
            let exited = tokio::time::timeout(Duration::from_secs(5), child.wait()).await;
            if exited.is_err() {
                // graceful stop first, hard kill as the backstop
                #[cfg(unix)]
                if let Some(pid) = child.id() {
                    use nix::sys::signal::{kill, Signal};
                    use nix::unistd::Pid;
                    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                let _ = child.kill().await;
            }
        }
        Ok(())
    }
}

/// Verify node is available before trying to spawn the driver.
pub fn ensure_node_installed() -> Result<()> {
    let status = std::process::Command::new("node")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(Error::BrowserNotFound),
    }
}
