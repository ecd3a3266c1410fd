//! Studio configuration.
//!
//! Everything has a working default, so `StudioConfig::default()` talks to the
//! public Gemini endpoint with the stock models. Individual settings can be
//! overridden through builder methods, a serde document, or `MUSE_*`
//! environment variables.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::poller::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollPolicy};
use crate::providers::HttpClientConfig;
use crate::providers::gemini::GEMINI_API_BASE_URL;

/// Default text-to-image model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
/// Default image editing model.
pub const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image";
/// Default image-to-video model.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
/// Default grounded text model.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Model ids per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSet {
    /// Text-to-image.
    pub image: String,
    /// Image editing.
    pub edit: String,
    /// Image-to-video.
    pub video: String,
    /// Search-grounded inspiration.
    pub text: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE_MODEL.into(),
            edit: DEFAULT_EDIT_MODEL.into(),
            video: DEFAULT_VIDEO_MODEL.into(),
            text: DEFAULT_TEXT_MODEL.into(),
        }
    }
}

/// Configuration for a [`Studio`](crate::gateway::Studio).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// API base URL.
    pub base_url: String,
    /// Model ids.
    pub models: ModelSet,
    /// HTTP client settings.
    pub http: HttpClientConfig,
    /// Seconds between video status checks.
    pub poll_interval_secs: u64,
    /// Status checks before giving up. `None` polls until done.
    pub poll_max_attempts: Option<u32>,
    /// Overall polling deadline in seconds.
    pub poll_deadline_secs: Option<u64>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_API_BASE_URL.into(),
            models: ModelSet::default(),
            http: HttpClientConfig::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            poll_max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            poll_deadline_secs: None,
        }
    }
}

impl StudioConfig {
    /// Defaults overridden by any `MUSE_*` variables that are set.
    ///
    /// | variable                  | field                |
    /// |---------------------------|----------------------|
    /// | `MUSE_BASE_URL`           | `base_url`           |
    /// | `MUSE_IMAGE_MODEL`        | `models.image`       |
    /// | `MUSE_EDIT_MODEL`         | `models.edit`        |
    /// | `MUSE_VIDEO_MODEL`        | `models.video`       |
    /// | `MUSE_TEXT_MODEL`         | `models.text`        |
    /// | `MUSE_POLL_INTERVAL_SECS` | `poll_interval_secs` |
    /// | `MUSE_POLL_MAX_ATTEMPTS`  | `poll_max_attempts`  |
    /// | `MUSE_HTTP_TIMEOUT_SECS`  | `http.timeout_secs`  |
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("MUSE_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = get("MUSE_IMAGE_MODEL") {
            config.models.image = model;
        }
        if let Some(model) = get("MUSE_EDIT_MODEL") {
            config.models.edit = model;
        }
        if let Some(model) = get("MUSE_VIDEO_MODEL") {
            config.models.video = model;
        }
        if let Some(model) = get("MUSE_TEXT_MODEL") {
            config.models.text = model;
        }
        if let Some(secs) = get("MUSE_POLL_INTERVAL_SECS") {
            config.poll_interval_secs = parse_number("MUSE_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(attempts) = get("MUSE_POLL_MAX_ATTEMPTS") {
            let attempts: u32 = parse_number("MUSE_POLL_MAX_ATTEMPTS", &attempts)?;
            config.poll_max_attempts = (attempts > 0).then_some(attempts);
        }
        if let Some(secs) = get("MUSE_HTTP_TIMEOUT_SECS") {
            config.http.timeout_secs = Some(parse_number("MUSE_HTTP_TIMEOUT_SECS", &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unparsable base URL or a zero
    /// poll interval.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::configuration(format!("invalid base URL {}: {e}", self.base_url)))?;
        if self.poll_interval_secs == 0 {
            return Err(Error::configuration("poll interval must be at least 1 second"));
        }
        Ok(())
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model ids.
    #[must_use]
    pub fn with_models(mut self, models: ModelSet) -> Self {
        self.models = models;
        self
    }

    /// Set the HTTP client settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Set the polling policy fields from a [`PollPolicy`].
    #[must_use]
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_interval_secs = policy.interval.as_secs().max(1);
        self.poll_max_attempts = policy.max_attempts;
        self.poll_deadline_secs = policy.deadline.map(|d| d.as_secs());
        self
    }

    /// The polling policy for video jobs.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::unbounded()
            .with_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_attempts(self.poll_max_attempts)
            .with_deadline(self.poll_deadline_secs.map(Duration::from_secs))
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::configuration(format!("{name}={value}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.base_url, GEMINI_API_BASE_URL);
        assert_eq!(config.models.image, "gemini-3-pro-image-preview");
        assert_eq!(config.models.video, "veo-3.1-fast-generate-preview");
        assert_eq!(config.poll_policy(), PollPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("MUSE_BASE_URL", "http://localhost:8080/v1beta"),
            ("MUSE_TEXT_MODEL", "gemini-2.5-pro"),
            ("MUSE_POLL_INTERVAL_SECS", "2"),
            ("MUSE_POLL_MAX_ATTEMPTS", "0"),
            ("MUSE_HTTP_TIMEOUT_SECS", " 45 "),
            ("MUSE_EDIT_MODEL", ""),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1beta");
        assert_eq!(config.models.text, "gemini-2.5-pro");
        assert_eq!(config.models.edit, DEFAULT_EDIT_MODEL);
        assert_eq!(config.http.timeout_secs, Some(45));

        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn test_env_rejects_bad_numbers() {
        let err = StudioConfig::from_lookup(lookup(&[("MUSE_POLL_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("MUSE_POLL_INTERVAL_SECS"));

        let err = StudioConfig::from_lookup(lookup(&[("MUSE_POLL_INTERVAL_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_partial_document() {
        let config: StudioConfig = serde_json::from_str(
            r#"{ "models": { "image": "imagen-4" }, "poll_deadline_secs": 300 }"#,
        )
        .unwrap();
        assert_eq!(config.models.image, "imagen-4");
        assert_eq!(config.models.edit, DEFAULT_EDIT_MODEL);
        assert_eq!(
            config.poll_policy().deadline,
            Some(Duration::from_secs(300))
        );
    }
}
