//! Credential resolution and the key-selection precondition.
//!
//! Credentials are resolved fresh for every remote call, so a key rotated
//! through a [`KeyStore`] (or an interactive [`KeySelector`]) takes effect on
//! the very next request without rebuilding anything.
//!
//! The precondition step is separate from the generation calls themselves:
//! [`CredentialGate::authorize`] evaluates a [`Requirement`], talks to the
//! optional key selector when needed, and returns a [`CredentialToken`] that a
//! [`Connector`](crate::providers::Connector) needs in order to build a client.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Environment variables consulted by [`CredentialChain::from_env`], in order.
pub const DEFAULT_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// An opaque secret used to authenticate against the generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wrap a key. Returns `None` for blank input.
    #[must_use]
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.into()))
        }
    }

    /// The raw secret, for signing requests.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Something that can produce the currently active credential.
pub trait CredentialSource: Send + Sync {
    /// Resolve the active credential, if any.
    fn resolve(&self) -> Option<Credential>;
}

/// A runtime-injected key slot.
///
/// Clones share the same slot, so a key set through one handle (for example
/// by a key selector) is seen by every gate holding another.
#[derive(Clone, Default)]
pub struct KeyStore {
    slot: Arc<RwLock<Option<Credential>>>,
}

impl KeyStore {
    /// Create an empty key store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key, replacing any previous one. Blank keys clear the slot.
    pub fn set(&self, key: impl AsRef<str>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Credential::new(key);
    }

    /// Remove the stored key.
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a key is currently stored.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("is_set", &self.is_set())
            .finish()
    }
}

impl CredentialSource for KeyStore {
    fn resolve(&self) -> Option<Credential> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Reads a key from an environment variable at resolve time.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    /// Read the key from `var`.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn resolve(&self) -> Option<Credential> {
        std::env::var(&self.var).ok().and_then(Credential::new)
    }
}

/// Tries each source in order; the first one yielding a key wins.
#[derive(Default)]
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    #[must_use]
    pub fn with(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// The key store first, then [`DEFAULT_KEY_VARS`] from the environment.
    #[must_use]
    pub fn from_env(store: KeyStore) -> Self {
        DEFAULT_KEY_VARS
            .iter()
            .fold(Self::new().with(store), |chain, var| {
                chain.with(EnvCredential::new(*var))
            })
    }
}

impl fmt::Debug for CredentialChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialChain")
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl CredentialSource for CredentialChain {
    fn resolve(&self) -> Option<Credential> {
        self.sources.iter().find_map(|s| s.resolve())
    }
}

/// An interactive key-selection flow offered by some host environments.
#[async_trait]
pub trait KeySelector: Send + Sync {
    /// Whether the user has already selected a key.
    async fn has_credential(&self) -> bool;

    /// Ask the user to select a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection flow itself fails.
    async fn request_selection(&self) -> Result<()>;
}

/// How strongly an operation needs an explicitly chosen key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any resolvable credential will do.
    Configured,
    /// The user must have picked a key through the selection flow, when one exists.
    Selected,
}

/// Proof that the precondition step ran and a credential was resolved.
#[derive(Debug, Clone)]
pub struct CredentialToken {
    credential: Credential,
    requirement: Requirement,
}

impl CredentialToken {
    /// The resolved credential.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The requirement that was evaluated.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }
}

/// Evaluates credential preconditions before any remote call.
pub struct CredentialGate {
    source: Box<dyn CredentialSource>,
    selector: Option<Arc<dyn KeySelector>>,
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("has_selector", &self.selector.is_some())
            .finish_non_exhaustive()
    }
}

impl CredentialGate {
    /// Create a gate over the given credential source, with no key selector.
    #[must_use]
    pub fn new(source: impl CredentialSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            selector: None,
        }
    }

    /// Attach the interactive key-selection flow.
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn KeySelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Run the precondition for `requirement` and resolve the credential.
    ///
    /// For [`Requirement::Selected`] the selection flow is requested at most
    /// once, and only when a selector is present and reports no key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no credential can be resolved, or
    /// propagates a failure of the selection flow.
    pub async fn authorize(&self, requirement: Requirement) -> Result<CredentialToken> {
        if requirement == Requirement::Selected
            && let Some(selector) = &self.selector
            && !selector.has_credential().await
        {
            info!("no key selected, requesting key selection");
            selector.request_selection().await?;
        }

        let credential = self.source.resolve().ok_or_else(|| {
            Error::configuration(format!(
                "no API key configured; set {} or select a key",
                DEFAULT_KEY_VARS.join(" or ")
            ))
        })?;
        debug!(?requirement, "credential resolved");

        Ok(CredentialToken {
            credential,
            requirement,
        })
    }
}
