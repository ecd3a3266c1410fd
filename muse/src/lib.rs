//! Muse is the client and orchestration layer of a generative creative studio.
//!
//! It turns four user-facing operations into calls against the Gemini API:
//!
//! - text-to-image and natural-language image editing, returned as data URIs
//! - image-to-video, submitted as a long-running job and polled to completion
//! - search-grounded design inspiration, parsed from structured JSON output
//!
//! Credentials are resolved through a [`credential::CredentialGate`] before
//! every call, a fresh client is built per operation by a
//! [`providers::Connector`], and every failure is a typed [`Error`].
//!
//! # Example
//!
//! ```rust,ignore
//! use muse::prelude::*;
//!
//! let gate = CredentialGate::new(CredentialChain::from_env(KeyStore::new()));
//! let studio = Studio::from_config(StudioConfig::from_env()?, gate)?;
//! let mut state = AppState::with_demo_works();
//!
//! let url = studio.generate_image("a ceramic vase, pastel background", ImageSize::OneK).await?;
//! state.add_work(NewWork::new(WorkKind::Image, url, "a ceramic vase"));
//! ```

pub mod codec;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod media;
pub mod poller;
pub mod prelude;
pub mod providers;
pub mod state;

pub use config::StudioConfig;
pub use error::{Error, ErrorKind, Result};
pub use gateway::Studio;
