use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed context tag for generated lists such as the top-tracks chart.
pub const TOP_TRACKS_CONTEXT: &str = "top-tracks";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque tag naming which logical list populated the current queue:
/// a single track, an album, an artist, or a generated chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    pub fn track(id: &TrackId) -> Self {
        Self(id.as_str().to_string())
    }

    pub fn album(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn artist(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn top_tracks() -> Self {
        Self(TOP_TRACKS_CONTEXT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artist: String,
    pub cover_image: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(id),
            name: name.into(),
            artist: artist.into(),
            cover_image: None,
        }
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover_image = Some(cover.into());
        self
    }
}

// Two tracks with the same id are the same track; display fields may be
// enriched lazily and must not affect membership checks.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl std::hash::Hash for Track {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
