//! # Pass-through options for the transport.
//!
//! [`LaunchOptions`] is what the supervisor hands to
//! [`Transport::start`](crate::Transport::start). Its contents are not
//! interpreted by the supervisor; they come from [`Config`](crate::Config) via
//! [`Config::launch_options`](crate::Config::launch_options).
//!
//! [`LaunchOptions::to_json`] renders the option map most browser-driven clients
//! accept. Keys in `overrides` are applied last and replace any default.

use std::path::PathBuf;

use serde_json::{Map, Value, json};

/// Options for starting one session.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    /// Session identifier (also the profile/token name on disk for most clients).
    pub session: String,
    /// Phone number for link-code pairing; `None` selects QR pairing.
    pub phone_number: Option<String>,
    pub headless: bool,
    pub devtools: bool,
    pub use_chrome: bool,
    pub debug: bool,
    /// Browser command-line flags.
    pub browser_args: Vec<String>,
    /// Browser executable; `None` lets the transport pick.
    pub executable_path: Option<PathBuf>,
    /// Options for the browser driver itself.
    pub browser_options: Map<String, Value>,
    /// Caller-supplied options; win over everything above.
    pub overrides: Map<String, Value>,
}

impl LaunchOptions {
    /// Renders the merged option map.
    ///
    /// ```rust
    /// use wavisor::Config;
    ///
    /// let mut cfg = Config::default();
    /// cfg.overrides.insert("headless".into(), false.into());
    /// let opts = cfg.launch_options().to_json();
    /// assert_eq!(opts["session"], "session");
    /// assert_eq!(opts["headless"], false);
    /// ```
    pub fn to_json(&self) -> Map<String, Value> {
        let mut browser = self.browser_options.clone();
        if let Some(path) = &self.executable_path {
            browser.insert(
                "executablePath".to_string(),
                Value::String(path.to_string_lossy().into_owned()),
            );
        }

        let mut out = Map::new();
        out.insert("session".into(), json!(self.session));
        if let Some(phone) = &self.phone_number {
            out.insert("phoneNumber".into(), json!(phone));
        }
        out.insert("headless".into(), json!(self.headless));
        out.insert("devtools".into(), json!(self.devtools));
        out.insert("useChrome".into(), json!(self.use_chrome));
        out.insert("debug".into(), json!(self.debug));
        out.insert("browserArgs".into(), json!(self.browser_args));
        out.insert("puppeteerOptions".into(), Value::Object(browser));

        for (key, value) in &self.overrides {
            out.insert(key.clone(), value.clone());
        }
        out
    }
}

/// Options for [`Session::send_text`](crate::Session::send_text).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    /// Message id to quote.
    pub quoted: Option<String>,
    /// Transport-specific extras.
    pub extra: Map<String, Value>,
}

impl SendOptions {
    /// Quotes the message with id `quoted`.
    pub fn quoting(quoted: impl Into<String>) -> Self {
        Self {
            quoted: Some(quoted.into()),
            ..Self::default()
        }
    }
}
