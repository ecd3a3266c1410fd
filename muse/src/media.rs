//! Process-scoped registry of playable media objects.
//!
//! Downloaded artifacts are kept in memory and addressed by an opaque
//! [`ObjectUrl`]. A handle stays valid until it is revoked or the process
//! exits; whoever displays the media is responsible for calling
//! [`MediaStore::revoke`] when done with it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Scheme prefix of every object URL.
pub const OBJECT_URL_PREFIX: &str = "blob:muse/";

/// Opaque, locally addressable handle to an in-memory media object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    fn generate() -> Self {
        Self(format!("{OBJECT_URL_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// The URL as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaObject {
    /// Raw bytes.
    pub bytes: Bytes,
    /// Media type.
    pub mime_type: String,
}

/// A generated video ready for playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableVideo {
    /// Handle to the video bytes in the [`MediaStore`].
    pub url: ObjectUrl,
    /// Media type, usually `video/mp4`.
    pub mime_type: String,
    /// Size in bytes.
    pub size: usize,
}

/// In-memory registry of media objects. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    objects: Arc<RwLock<HashMap<ObjectUrl, MediaObject>>>,
}

impl MediaStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return a fresh handle.
    pub async fn create(&self, bytes: Bytes, mime_type: impl Into<String>) -> ObjectUrl {
        let url = ObjectUrl::generate();
        let object = MediaObject {
            bytes,
            mime_type: mime_type.into(),
        };
        debug!(url = %url, size = object.bytes.len(), "media object created");
        self.objects.write().await.insert(url.clone(), object);
        url
    }

    /// Look up a live handle.
    pub async fn get(&self, url: &ObjectUrl) -> Option<MediaObject> {
        self.objects.read().await.get(url).cloned()
    }

    /// Release a handle. Returns `false` if it was unknown or already revoked.
    pub async fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.objects.write().await.remove(url).is_some();
        debug!(url = %url, removed, "media object revoked");
        removed
    }

    /// Number of live handles.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether no handles are live.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}
