//! Process-lifetime application state: the signed-in user and the work feed.
//!
//! Nothing here is persisted. The state is an ordinary value owned by the
//! caller; wrap it in a lock if several tasks need to share it.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name used when logging in with a blank name.
pub const DEFAULT_USER_NAME: &str = "Designer";

const USER_ID: &str = "u-1";
const USER_ROLE: &str = "Senior Designer";
const AVATAR_SERVICE: &str = "https://ui-avatars.com/api/";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Job title.
    pub role: String,
    /// Avatar image URL.
    pub avatar: String,
}

impl User {
    fn named(name: &str) -> Self {
        let name = match name.trim() {
            "" => DEFAULT_USER_NAME,
            trimmed => trimmed,
        };
        let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        Self {
            id: USER_ID.into(),
            name: name.into(),
            role: USER_ROLE.into(),
            avatar: format!("{AVATAR_SERVICE}?name={encoded}&background=4f46e5&color=fff"),
        }
    }
}

/// Kind of a saved work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkKind {
    /// A still image.
    Image,
    /// A video clip.
    Video,
}

/// A saved generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeWork {
    /// Unique id within the feed.
    pub id: String,
    /// Image or video.
    pub kind: WorkKind,
    /// Data URI, object URL or remote URL.
    pub url: String,
    /// The prompt or instruction that produced it.
    pub prompt: String,
    /// When it was saved.
    pub created_at: DateTime<Utc>,
    /// Frame shape, for videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

/// A work about to be saved; id and timestamp are assigned on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWork {
    /// Image or video.
    pub kind: WorkKind,
    /// Data URI, object URL or remote URL.
    pub url: String,
    /// The prompt or instruction that produced it.
    pub prompt: String,
    /// Frame shape, for videos.
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

impl NewWork {
    /// A work with no aspect ratio.
    #[must_use]
    pub fn new(kind: WorkKind, url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            prompt: prompt.into(),
            aspect_ratio: None,
        }
    }

    /// Attach an aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }
}

/// The single user slot.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// Sign in, replacing any current user.
    pub fn login(&mut self, name: &str) -> &User {
        let user = self.user.insert(User::named(name));
        debug!(name = %user.name, "logged in");
        user
    }

    /// Sign out.
    pub fn logout(&mut self) {
        self.user = None;
    }

    /// The current user, if signed in.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// Saved works, newest first.
#[derive(Debug, Clone, Default)]
pub struct WorkFeed {
    works: Vec<CreativeWork>,
}

impl WorkFeed {
    /// An empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The two showcase works a fresh studio starts with.
    #[must_use]
    pub fn with_demo_works() -> Self {
        let now = Utc::now();
        let demo = |id: &str, url: &str, prompt: &str, age_ms: i64| CreativeWork {
            id: id.into(),
            kind: WorkKind::Image,
            url: url.into(),
            prompt: prompt.into(),
            created_at: now - TimeDelta::milliseconds(age_ms),
            aspect_ratio: None,
        };
        Self {
            works: vec![
                demo(
                    "demo-1",
                    "https://picsum.photos/id/28/800/800",
                    "A minimalist forest landscape with fog, high contrast, monochrome style",
                    1_000_000,
                ),
                demo(
                    "demo-2",
                    "https://picsum.photos/id/56/800/600",
                    "Product photography of a ceramic vase, soft lighting, pastel background",
                    5_000_000,
                ),
            ],
        }
    }

    /// Save a work at the front of the feed.
    pub fn add(&mut self, work: NewWork) -> &CreativeWork {
        let work = CreativeWork {
            id: uuid::Uuid::new_v4().to_string(),
            kind: work.kind,
            url: work.url,
            prompt: work.prompt,
            created_at: Utc::now(),
            aspect_ratio: work.aspect_ratio,
        };
        debug!(id = %work.id, kind = ?work.kind, "work saved");
        self.works.insert(0, work);
        &self.works[0]
    }

    /// Remove the work with `id`. Returns `false` if there was none.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.works.len();
        self.works.retain(|w| w.id != id);
        before != self.works.len()
    }

    /// Look up a work.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CreativeWork> {
        self.works.iter().find(|w| w.id == id)
    }

    /// Works, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &CreativeWork> {
        self.works.iter()
    }

    /// Works as a slice, newest first.
    #[must_use]
    pub fn as_slice(&self) -> &[CreativeWork] {
        &self.works
    }

    /// Number of works.
    #[must_use]
    pub fn len(&self) -> usize {
        self.works.len()
    }

    /// Whether the feed is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}

/// Session plus feed.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// The user slot.
    pub session: Session,
    /// The work feed.
    pub feed: WorkFeed,
}

impl AppState {
    /// Signed out, empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed out, feed seeded with [`WorkFeed::with_demo_works`].
    #[must_use]
    pub fn with_demo_works() -> Self {
        Self {
            session: Session::default(),
            feed: WorkFeed::with_demo_works(),
        }
    }

    /// See [`Session::login`].
    pub fn login(&mut self, name: &str) -> &User {
        self.session.login(name)
    }

    /// See [`Session::logout`].
    pub fn logout(&mut self) {
        self.session.logout();
    }

    /// The current user.
    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    /// See [`WorkFeed::add`].
    pub fn add_work(&mut self, work: NewWork) -> &CreativeWork {
        self.feed.add(work)
    }

    /// See [`WorkFeed::delete`].
    pub fn delete_work(&mut self, id: &str) -> bool {
        self.feed.delete(id)
    }

    /// Works, newest first.
    #[must_use]
    pub fn works(&self) -> &[CreativeWork] {
        self.feed.as_slice()
    }
}
