//! Remote generation service abstraction.
//!
//! The gateway talks to the service through two traits:
//!
//! - [`GenerationService`]: the four remote calls (content generation,
//!   video job submission, job status, artifact download).
//! - [`Connector`]: the client factory. It is invoked once per gateway
//!   operation with a fresh [`CredentialToken`], so a rotated credential takes
//!   effect on the next call.
//!
//! [`gemini`] is the production implementation; [`mock`] provides scripted
//! fakes for tests and offline use.
//!
//! # Example
//!
//! ```rust,ignore
//! use muse::providers::{Connector, GenerationService};
//! use muse::providers::gemini::GeminiConnector;
//!
//! let connector = GeminiConnector::new(&config)?;
//! let token = gate.authorize(Requirement::Configured).await?;
//! let client = connector.connect(&token)?;
//! let response = client.generate_content("gemini-2.5-flash", &request).await?;
//! ```

mod config;

pub mod gemini;
pub mod mock;

pub use config::HttpClientConfig;

use async_trait::async_trait;
use bytes::Bytes;

use crate::credential::CredentialToken;
use crate::error::Result;
use gemini::{GenerateContentRequest, GenerateContentResponse, GenerateVideosRequest, RemoteOperation};

/// A downloaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Raw bytes.
    pub bytes: Bytes,
    /// Media type reported by the server, if any.
    pub mime_type: Option<String>,
}

/// The remote calls a generation backend must support.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Run a synchronous content generation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GenerationRequest`](crate::Error::GenerationRequest) if
    /// the service rejects the request.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;

    /// Submit a video job and return its operation handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GenerationRequest`](crate::Error::GenerationRequest) if
    /// the service rejects the request.
    async fn generate_videos(
        &self,
        model: &str,
        request: &GenerateVideosRequest,
    ) -> Result<RemoteOperation>;

    /// Re-fetch the status of an operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the status request fails.
    async fn get_operation(&self, name: &str) -> Result<RemoteOperation>;

    /// Download a generated artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactFetch`](crate::Error::ArtifactFetch) on any
    /// transport or status failure.
    async fn fetch_artifact(&self, uri: &str) -> Result<Artifact>;
}

/// Builds a [`GenerationService`] bound to a credential.
pub trait Connector: Send + Sync {
    /// The client type produced.
    type Service: GenerationService;

    /// Build a client signed with the token's credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// client cannot be constructed.
    fn connect(&self, token: &CredentialToken) -> Result<Self::Service>;
}
