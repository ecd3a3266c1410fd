//! The generation gateway.
//!
//! [`Studio`] exposes the four studio operations. Every operation follows the
//! same path:
//!
//! 1. run the credential precondition through the [`CredentialGate`]
//! 2. ask the [`Connector`] for a client bound to the resolved credential
//! 3. shape the request and make exactly one remote call (video jobs then
//!    hand over to the [`OperationPoller`](crate::poller::OperationPoller))
//! 4. extract the typed result or fail with a typed error
//!
//! # Example
//!
//! ```rust,ignore
//! use muse::prelude::*;
//!
//! let store = KeyStore::new();
//! let gate = CredentialGate::new(CredentialChain::from_env(store));
//! let studio = Studio::from_config(StudioConfig::from_env()?, gate)?;
//!
//! let data_url = studio.generate_image("a foggy forest, monochrome", ImageSize::TwoK).await?;
//! ```

mod image;
mod inspiration;
mod request;
mod video;

pub use inspiration::{
    INSPIRATION_IDEA_COUNT, Inspiration, InspirationItem, SourceReference,
};
pub use request::{AspectRatio, Generated, GenerationRequest, ImageSize, ModelRole};
pub use video::DEFAULT_VIDEO_PROMPT;

use tracing::debug;

use crate::config::StudioConfig;
use crate::credential::{CredentialGate, Requirement};
use crate::error::Result;
use crate::media::MediaStore;
use crate::providers::Connector;
use crate::providers::gemini::GeminiConnector;

/// Orchestrates generation requests against a remote service.
#[derive(Debug)]
pub struct Studio<C> {
    connector: C,
    gate: CredentialGate,
    config: StudioConfig,
    media: MediaStore,
}

impl Studio<GeminiConnector> {
    /// A studio talking to the Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// configuration is invalid or the HTTP client cannot be built.
    pub fn from_config(config: StudioConfig, gate: CredentialGate) -> Result<Self> {
        config.validate()?;
        let connector = GeminiConnector::new(&config)?;
        Ok(Self::new(connector, gate, config))
    }
}

impl<C: Connector> Studio<C> {
    /// Create a studio over any connector.
    #[must_use]
    pub fn new(connector: C, gate: CredentialGate, config: StudioConfig) -> Self {
        Self {
            connector,
            gate,
            config,
            media: MediaStore::new(),
        }
    }

    /// Register videos in the given store instead of a private one.
    #[must_use]
    pub fn with_media_store(mut self, media: MediaStore) -> Self {
        self.media = media;
        self
    }

    /// The store holding generated videos.
    #[must_use]
    pub const fn media(&self) -> &MediaStore {
        &self.media
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// The model id configured for a role.
    #[must_use]
    pub fn model(&self, role: ModelRole) -> &str {
        let models = &self.config.models;
        match role {
            ModelRole::Image => &models.image,
            ModelRole::Edit => &models.edit,
            ModelRole::Video => &models.video,
            ModelRole::Text => &models.text,
        }
    }

    /// Precondition, then a fresh client bound to the current credential.
    async fn connect(&self, requirement: Requirement) -> Result<C::Service> {
        let token = self.gate.authorize(requirement).await?;
        debug!(?requirement, "connecting");
        self.connector.connect(&token)
    }

    /// Run any request.
    ///
    /// # Errors
    ///
    /// The errors of the operation the request maps to.
    pub async fn execute(&self, request: GenerationRequest) -> Result<Generated> {
        match request {
            GenerationRequest::TextToImage { prompt, size } => {
                let data_url = self.generate_image(&prompt, size).await?;
                Ok(Generated::Image { data_url })
            }
            GenerationRequest::EditImage { image, instruction } => {
                let data_url = self.edit_image(&image, &instruction).await?;
                Ok(Generated::Image { data_url })
            }
            GenerationRequest::ImageToVideo {
                image,
                aspect_ratio,
                prompt,
            } => self
                .generate_video(&image, aspect_ratio, prompt.as_deref())
                .await
                .map(Generated::Video),
            GenerationRequest::Inspiration { query } => self
                .search_inspiration(&query)
                .await
                .map(Generated::Inspiration),
        }
    }
}
