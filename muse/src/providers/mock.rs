//! Scripted in-memory generation service.
//!
//! [`MockService`] answers each remote call from a queue of scripted results
//! and records every call with its (tokio) timestamp. [`MockConnector`] hands
//! out clones of one service and records the credentials it was asked to bind.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = MockService::new();
//! service.push_content(Ok(MockService::image_response("iVBORw0KGgo=")));
//! let studio = Studio::new(MockConnector::new(service.clone()), gate, config);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

use super::gemini::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerateVideosRequest,
    Part, RemoteOperation,
};
use super::{Artifact, Connector, GenerationService};
use crate::credential::CredentialToken;
use crate::error::{Error, Result};

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `generate_content`.
    GenerateContent {
        /// Model id.
        model: String,
        /// Request body.
        request: GenerateContentRequest,
    },
    /// `generate_videos`.
    GenerateVideos {
        /// Model id.
        model: String,
        /// Request body.
        request: GenerateVideosRequest,
    },
    /// `get_operation`.
    GetOperation {
        /// Operation name.
        name: String,
    },
    /// `fetch_artifact`.
    FetchArtifact {
        /// Artifact URI.
        uri: String,
    },
}

#[derive(Debug, Default)]
struct Script {
    content: VecDeque<Result<GenerateContentResponse>>,
    videos: VecDeque<Result<RemoteOperation>>,
    operations: VecDeque<Result<RemoteOperation>>,
    artifacts: VecDeque<Result<Artifact>>,
    calls: Vec<(Instant, MockCall)>,
}

/// Scripted [`GenerationService`].
#[derive(Debug, Clone, Default)]
pub struct MockService {
    script: Arc<Mutex<Script>>,
}

impl MockService {
    /// Create a service with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Queue a `generate_content` result.
    pub fn push_content(&self, response: Result<GenerateContentResponse>) {
        self.with_script(|s| s.content.push_back(response));
    }

    /// Queue a `generate_videos` result.
    pub fn push_video(&self, operation: Result<RemoteOperation>) {
        self.with_script(|s| s.videos.push_back(operation));
    }

    /// Queue a `get_operation` result.
    pub fn push_operation(&self, operation: Result<RemoteOperation>) {
        self.with_script(|s| s.operations.push_back(operation));
    }

    /// Queue a `fetch_artifact` result.
    pub fn push_artifact(&self, artifact: Result<Artifact>) {
        self.with_script(|s| s.artifacts.push_back(artifact));
    }

    /// All calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.with_script(|s| s.calls.iter().map(|(_, c)| c.clone()).collect())
    }

    /// All calls with the instant each was received.
    #[must_use]
    pub fn timed_calls(&self) -> Vec<(Instant, MockCall)> {
        self.with_script(|s| s.calls.clone())
    }

    /// A response whose first candidate carries the given parts.
    #[must_use]
    pub fn response_with_parts(parts: Vec<Part>) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".into()),
                    parts,
                }),
                finish_reason: Some("STOP".into()),
                grounding_metadata: None,
            }],
            prompt_feedback: None,
        }
    }

    /// A response carrying one PNG image.
    #[must_use]
    pub fn image_response(data: impl Into<String>) -> GenerateContentResponse {
        Self::response_with_parts(vec![Part::inline("image/png", data)])
    }

    fn next<T>(
        &self,
        call: MockCall,
        queue: impl FnOnce(&mut Script) -> &mut VecDeque<Result<T>>,
    ) -> Result<T> {
        self.with_script(|s| {
            let label = format!("{call:?}");
            s.calls.push((Instant::now(), call));
            queue(s).pop_front().unwrap_or_else(|| {
                Err(Error::request(
                    None,
                    format!("mock: nothing scripted for {label}"),
                ))
            })
        })
    }
}

#[async_trait]
impl GenerationService for MockService {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let call = MockCall::GenerateContent {
            model: model.to_string(),
            request: request.clone(),
        };
        self.next(call, |s| &mut s.content)
    }

    async fn generate_videos(
        &self,
        model: &str,
        request: &GenerateVideosRequest,
    ) -> Result<RemoteOperation> {
        let call = MockCall::GenerateVideos {
            model: model.to_string(),
            request: request.clone(),
        };
        self.next(call, |s| &mut s.videos)
    }

    async fn get_operation(&self, name: &str) -> Result<RemoteOperation> {
        let call = MockCall::GetOperation {
            name: name.to_string(),
        };
        self.next(call, |s| &mut s.operations)
    }

    async fn fetch_artifact(&self, uri: &str) -> Result<Artifact> {
        let call = MockCall::FetchArtifact {
            uri: uri.to_string(),
        };
        self.next(call, |s| &mut s.artifacts)
    }
}

/// [`Connector`] that always returns the same [`MockService`].
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    service: MockService,
    bound: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    /// Wrap a service.
    #[must_use]
    pub fn new(service: MockService) -> Self {
        Self {
            service,
            bound: Arc::default(),
        }
    }

    /// The credentials passed to each `connect`, in order.
    #[must_use]
    pub fn bound_credentials(&self) -> Vec<String> {
        self.bound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Connector for MockConnector {
    type Service = MockService;

    fn connect(&self, token: &CredentialToken) -> Result<MockService> {
        self.bound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(token.credential().expose().to_string());
        Ok(self.service.clone())
    }
}

/// Convenience for scripting a downloaded video.
#[must_use]
pub fn video_artifact(bytes: &'static [u8]) -> Artifact {
    Artifact {
        bytes: Bytes::from_static(bytes),
        mime_type: Some("video/mp4".into()),
    }
}
