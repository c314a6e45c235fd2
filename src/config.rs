//! # Supervisor configuration.
//!
//! Provides [`Config`], the centralized settings for one supervised session.
//!
//! Config is used in three ways:
//! 1. **Transport launch**: [`Config::launch_options`] → [`LaunchOptions`]
//! 2. **Registration defaults**: [`Config::delivery`] is the policy used by
//!    [`Supervisor::register`](crate::Supervisor::register)
//! 3. **Reconnect/shutdown behavior**: `reconnect_backoff`, `grace`
//!
//! Config is plain data with public fields and a `Default`, and can be loaded
//! from JSON; missing keys keep their defaults:
//!
//! ```rust
//! use wavisor::{Config, Pairing};
//!
//! let cfg = Config::from_json(r#"{ "session": "bot", "phone_number": "6281234" }"#).unwrap();
//! assert_eq!(cfg.session, "bot");
//! assert_eq!(cfg.pairing(), Pairing::LinkCode { phone: "6281234".into() });
//! assert!(cfg.browser.headless);
//! ```
//!
//! ## Sentinel values
//! - `phone_number = ""` is the same as no phone number (QR pairing)
//! - `browser.args = None` → [`DEFAULT_BROWSER_ARGS`]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, DeliveryPolicy};
use crate::transport::LaunchOptions;

/// Browser flags used when [`BrowserConfig::args`] is not set.
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-cache",
    "--disk-cache-size=0",
    "--disable-application-cache",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
    "--disable-infobars",
    "--disable-extensions",
    "--disable-default-apps",
    "--disable-background-networking",
    "--disable-sync",
    "--disable-translate",
];

/// How a new session is associated with an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pairing {
    /// Scan a QR code (emits `connect` with `qr`/`base64`).
    Qr,
    /// Enter a link code on the phone (emits `connect` with `code`).
    LinkCode { phone: String },
}

/// Browser launch settings (pass-through).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub devtools: bool,
    pub use_chrome: bool,
    pub debug: bool,
    /// Command-line flags; `None` → [`DEFAULT_BROWSER_ARGS`].
    pub args: Option<Vec<String>>,
    /// Browser executable; `None` lets the transport pick.
    pub executable_path: Option<PathBuf>,
    /// Extra options for the browser driver.
    pub options: Map<String, Value>,
}

impl Default for BrowserConfig {
    /// Headless, no devtools, bundled browser, no debug, default flags.
    fn default() -> Self {
        Self {
            headless: true,
            devtools: false,
            use_chrome: false,
            debug: false,
            args: None,
            executable_path: None,
            options: Map::new(),
        }
    }
}

impl BrowserConfig {
    /// Effective browser flags.
    pub fn effective_args(&self) -> Vec<String> {
        match &self.args {
            Some(args) => args.clone(),
            None => DEFAULT_BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Configuration for one supervised session.
///
/// ## Field semantics
/// - `session`: session identifier passed to the transport
/// - `phone_number`: selects link-code pairing when non-empty
/// - `browser`: launch flags (pass-through)
/// - `overrides`: arbitrary transport options, applied last (win over defaults)
/// - `delivery`: default delivery policy for registered handlers
/// - `reconnect_backoff`: pacing of consecutive automatic reconnects
/// - `grace`: how long shutdown waits for the session to close
/// - `logger`: log filter for [`logging::init`](crate::logging) (`"silent"` disables output)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: String,
    pub phone_number: Option<String>,
    pub browser: BrowserConfig,
    pub overrides: Map<String, Value>,
    pub delivery: DeliveryPolicy,
    pub reconnect_backoff: BackoffPolicy,
    pub grace: Duration,
    pub logger: String,
}

impl Config {
    /// Parses a JSON config; missing keys keep their defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Returns the phone number if link-code pairing is configured.
    #[inline]
    pub fn phone(&self) -> Option<&str> {
        self.phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Pairing method selected by this config.
    pub fn pairing(&self) -> Pairing {
        match self.phone() {
            Some(phone) => Pairing::LinkCode {
                phone: phone.to_string(),
            },
            None => Pairing::Qr,
        }
    }

    /// Builds the options handed to the transport.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            session: self.session.clone(),
            phone_number: self.phone().map(str::to_string),
            headless: self.browser.headless,
            devtools: self.browser.devtools,
            use_chrome: self.browser.use_chrome,
            debug: self.browser.debug,
            browser_args: self.browser.effective_args(),
            executable_path: self.browser.executable_path.clone(),
            browser_options: self.browser.options.clone(),
            overrides: self.overrides.clone(),
        }
    }

    /// Log filter for the logging initializer (`"silent"` → `"off"`).
    pub fn log_filter(&self) -> &str {
        match self.logger.trim() {
            "" => "info",
            "silent" => "off",
            other => other,
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `session = "session"`, QR pairing
    /// - headless browser with [`DEFAULT_BROWSER_ARGS`]
    /// - `delivery = DeliveryPolicy::default()` (2 calls, renewing)
    /// - `reconnect_backoff = BackoffPolicy::default()` (immediate)
    /// - `grace = 10s`
    /// - `logger = "info"`
    fn default() -> Self {
        Self {
            session: "session".to_string(),
            phone_number: None,
            browser: BrowserConfig::default(),
            overrides: Map::new(),
            delivery: DeliveryPolicy::default(),
            reconnect_backoff: BackoffPolicy::default(),
            grace: Duration::from_secs(10),
            logger: "info".to_string(),
        }
    }
}
