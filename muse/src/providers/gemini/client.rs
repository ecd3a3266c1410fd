//! Gemini API client implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    GenerateContentRequest, GenerateContentResponse, GenerateVideosRequest, RemoteOperation,
};
use crate::config::StudioConfig;
use crate::credential::{Credential, CredentialToken};
use crate::error::{Error, Result};
use crate::providers::{Artifact, Connector, GenerationService};

/// Default Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client bound to a single credential.
///
/// # Example
///
/// ```rust,ignore
/// use muse::providers::gemini::GeminiClient;
///
/// let client = GeminiClient::builder()
///     .api_key(credential)
///     .base_url("https://my-gemini-proxy.example/v1beta")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: Credential,
    api_key_header: HeaderValue,
    base_url: Arc<str>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::default()
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(API_KEY_HEADER, self.api_key_header.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(url)
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .headers(self.auth_headers())
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::request(
                Some(status.as_u16()),
                api_error_message(&body),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::malformed(format!("unexpected response body: {e}")))
    }
}

/// Pull the message out of a Google API error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "empty error response".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

/// Append the credential to an artifact URI as the `key` query parameter.
fn signed_artifact_url(uri: &str, key: &str) -> Result<Url> {
    let mut url =
        Url::parse(uri).map_err(|e| Error::artifact(format!("invalid URI {uri}: {e}")))?;
    url.query_pairs_mut().append_pair("key", key);
    Ok(url)
}

#[async_trait]
impl GenerationService for GeminiClient {
    #[instrument(skip(self, request), fields(model = %model))]
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(&format!("models/{model}:generateContent"));
        let parts: usize = request.contents.iter().map(|c| c.parts.len()).sum();
        debug!(parts, tools = request.tools.len(), "sending generateContent");
        self.post_json(&url, request).await
    }

    #[instrument(skip(self, request), fields(model = %model))]
    async fn generate_videos(
        &self,
        model: &str,
        request: &GenerateVideosRequest,
    ) -> Result<RemoteOperation> {
        let url = self.endpoint(&format!("models/{model}:predictLongRunning"));
        debug!(aspect_ratio = %request.parameters.aspect_ratio, "submitting video job");
        self.post_json(&url, request).await
    }

    #[instrument(skip(self))]
    async fn get_operation(&self, name: &str) -> Result<RemoteOperation> {
        self.get_json(&self.endpoint(name)).await
    }

    #[instrument(skip(self, uri))]
    async fn fetch_artifact(&self, uri: &str) -> Result<Artifact> {
        let url = signed_artifact_url(uri, self.api_key.expose())?;

        // reqwest errors embed the URL, which now carries the key.
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::artifact(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::artifact(format!("HTTP {status}")));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::artifact(e.without_url().to_string()))?;
        debug!(size = bytes.len(), mime_type = ?mime_type, "artifact downloaded");

        Ok(Artifact { bytes, mime_type })
    }
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<Credential>,
    base_url: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl GeminiClientBuilder {
    /// Set the credential.
    #[must_use]
    pub fn api_key(mut self, api_key: Credential) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set a custom base URL, e.g. for a proxy.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Reuse an existing HTTP client (and its connection pool).
    #[must_use]
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no API key was set, the key cannot
    /// be sent as a header, or the HTTP client fails to build.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::configuration("API key is required"))?;
        let mut api_key_header = HeaderValue::from_str(api_key.expose()).map_err(|_| {
            Error::configuration("API key contains characters not allowed in a header")
        })?;
        api_key_header.set_sensitive(true);
        let base_url = self
            .base_url
            .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string());
        let http_client = match self.http_client {
            Some(client) => client,
            None => crate::providers::HttpClientConfig::default().build_client()?,
        };

        Ok(GeminiClient {
            http_client,
            api_key,
            api_key_header,
            base_url: base_url.into(),
        })
    }
}

/// Client factory for the Gemini API.
///
/// Holds one pooled HTTP client and binds a fresh [`GeminiClient`] to the
/// current credential on every [`connect`](Connector::connect).
#[derive(Debug, Clone)]
pub struct GeminiConnector {
    http_client: reqwest::Client,
    base_url: Arc<str>,
}

impl GeminiConnector {
    /// Create a connector from the studio configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &StudioConfig) -> Result<Self> {
        Ok(Self {
            http_client: config.http.build_client()?,
            base_url: config.base_url.as_str().into(),
        })
    }
}

impl Connector for GeminiConnector {
    type Service = GeminiClient;

    fn connect(&self, token: &CredentialToken) -> Result<GeminiClient> {
        GeminiClient::builder()
            .http_client(self.http_client.clone())
            .base_url(self.base_url.as_ref())
            .api_key(token.credential().clone())
            .build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::builder()
            .api_key(Credential::new("test-key").unwrap())
            .base_url(base_url)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_base_url() {
        let client = GeminiClient::builder()
            .api_key(Credential::new("test-key").unwrap())
            .build()
            .unwrap();
        assert_eq!(client.base_url(), GEMINI_API_BASE_URL);
    }

    #[test]
    fn test_builder_requires_key() {
        let err = GeminiClient::builder().build().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = client("https://proxy.example/v1beta/");
        assert_eq!(
            client.endpoint("models/gemini-2.5-flash:generateContent"),
            "https://proxy.example/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client.endpoint("/models/veo/operations/abc"),
            "https://proxy.example/v1beta/models/veo/operations/abc"
        );
    }

    #[test]
    fn test_auth_headers_are_sensitive() {
        let headers = client(GEMINI_API_BASE_URL).auth_headers();
        let key = headers.get(API_KEY_HEADER).unwrap();
        assert_eq!(key, "test-key");
        assert!(key.is_sensitive());
        assert!(format!("{:?}", client(GEMINI_API_BASE_URL)).contains("[REDACTED]"));
    }

    #[test]
    fn test_signed_artifact_url_appends_key() {
        let url =
            signed_artifact_url("https://files.example/v1/abc:download?alt=media", "k 1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://files.example/v1/abc:download?alt=media&key=k+1"
        );
        assert!(matches!(
            signed_artifact_url("not a uri", "k"),
            Err(Error::ArtifactFetch(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"Image size too large","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "Image size too large");
        assert_eq!(api_error_message("upstream down"), "upstream down");
        assert_eq!(api_error_message(""), "empty error response");
    }

    #[tokio::test]
    async fn test_connector_binds_current_credential() {
        use crate::credential::{CredentialGate, KeyStore, Requirement};

        let connector = GeminiConnector::new(&StudioConfig::default()).unwrap();
        let store = KeyStore::new();
        let gate = CredentialGate::new(store.clone());

        store.set("first");
        let token = gate.authorize(Requirement::Configured).await.unwrap();
        assert_eq!(connector.connect(&token).unwrap().api_key.expose(), "first");

        store.set("second");
        let token = gate.authorize(Requirement::Configured).await.unwrap();
        assert_eq!(connector.connect(&token).unwrap().api_key.expose(), "second");
    }

    #[tokio::test]
    async fn test_connect_rejects_key_unfit_for_header() {
        use crate::credential::{CredentialGate, KeyStore, Requirement};

        let connector = GeminiConnector::new(&StudioConfig::default()).unwrap();
        let store = KeyStore::new();
        store.set("abc\ndef");
        let token = CredentialGate::new(store)
            .authorize(Requirement::Configured)
            .await
            .unwrap();

        let err = connector.connect(&token).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(!err.to_string().contains("abc"));
    }
}
