//! Harness configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Browser engine to drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chromium" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" => Ok(BrowserKind::Webkit),
            other => Err(crate::Error::InvalidConfig(format!(
                "unknown browser '{other}'"
            ))),
        }
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Configuration for one harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Base URL of the application under test
    pub base_url: String,

    /// Directory holding persisted session records
    pub session_dir: PathBuf,

    /// Cookie name identifying an authenticated session
    pub session_marker: String,

    /// Browser engine
    #[serde(default)]
    pub browser: BrowserKind,

    /// Run the browser headless
    pub headless: bool,

    /// Viewport size
    #[serde(default)]
    pub viewport: Viewport,

    /// Bound for condition waits (queries, element state)
    pub wait_timeout_ms: u64,

    /// Interval between condition polls
    pub poll_interval_ms: u64,

    /// Bound for page navigations
    pub navigation_timeout_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://qauto.forstudy.space".to_string(),
            session_dir: crate::default_session_dir(),
            session_marker: crate::DEFAULT_SESSION_MARKER.to_string(),
            browser: BrowserKind::Chromium,
            headless: true,
            viewport: Viewport::default(),
            wait_timeout_ms: 5_000,
            poll_interval_ms: 100,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl HarnessConfig {
    /// Load a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Build a config from defaults overridden by `QADRIVE_*` environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("QADRIVE_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(dir) = std::env::var("QADRIVE_SESSION_DIR") {
            config.session_dir = PathBuf::from(dir);
        }
        if let Ok(marker) = std::env::var("QADRIVE_SESSION_MARKER") {
            config.session_marker = marker;
        }
        if let Ok(browser) = std::env::var("QADRIVE_BROWSER") {
            config.browser = browser.parse()?;
        }
        if let Ok(headless) = std::env::var("QADRIVE_HEADLESS") {
            config.headless = headless != "0" && headless != "false";
        }
        if let Ok(timeout) = std::env::var("QADRIVE_WAIT_TIMEOUT_MS") {
            config.wait_timeout_ms = timeout
                .parse()
                .map_err(|_| crate::Error::InvalidConfig(format!("bad timeout '{timeout}'")))?;
        }

        Ok(config)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Resolve a path relative to the application base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let config = HarnessConfig {
            base_url: "https://example.test/".into(),
            ..HarnessConfig::default()
        };
        assert_eq!(config.url("/panel/garage"), "https://example.test/panel/garage");
    }

    #[test]
    fn browser_kind_round_trips() {
        for kind in [BrowserKind::Chromium, BrowserKind::Firefox, BrowserKind::Webkit] {
            assert_eq!(kind.as_str().parse::<BrowserKind>().unwrap(), kind);
        }
        assert!("opera".parse::<BrowserKind>().is_err());
    }

    #[test]
    fn yaml_config_overrides_defaults() {
        let yaml = r#"
base_url: "http://127.0.0.1:8080"
session_dir: ".auth"
session_marker: "sid"
headless: false
wait_timeout_ms: 2000
poll_interval_ms: 50
navigation_timeout_ms: 10000
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert!(!config.headless);
        assert_eq!(config.browser, BrowserKind::Chromium);
        assert_eq!(config.wait_timeout(), Duration::from_millis(2000));
    }
}
