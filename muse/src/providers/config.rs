//! HTTP client configuration shared by provider connectors.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shared HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Per-request timeout in seconds. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// User agent string.
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: Some(30),
            user_agent: Some(format!("muse/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpClientConfig {
    /// Build a reqwest client with this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the client cannot be built.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }

        if let Some(timeout) = self.connect_timeout_secs {
            builder = builder.connect_timeout(std::time::Duration::from_secs(timeout));
        }

        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_config_default() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.connect_timeout_secs, Some(30));
        assert!(config.user_agent.unwrap().starts_with("muse/"));
    }

    #[test]
    fn test_http_client_config_partial_deserialize() {
        let config: HttpClientConfig =
            serde_json::from_str(r#"{ "timeout_secs": 90 }"#).unwrap_or_default();
        assert_eq!(config.timeout_secs, Some(90));
        assert_eq!(config.connect_timeout_secs, Some(30));
    }

    #[test]
    fn test_build_client() {
        assert!(HttpClientConfig::default().build_client().is_ok());
    }
}
