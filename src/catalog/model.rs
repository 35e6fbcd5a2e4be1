use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque, stable identity of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TrackId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    /// Location relative to the catalog's storage root.
    pub path: PathBuf,
    /// Length in seconds, measured at import.
    pub duration: f64,
    /// Artwork reference: `http(s)://` or `file://` URL, or a plain path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown track {0}")]
    UnknownTrack(TrackId),
    #[error("resource for {id} is missing at {path:?}")]
    Missing { id: TrackId, path: PathBuf },
    #[error("catalog I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Access to the track catalog as the playback engine sees it.
pub trait Catalog {
    /// All tracks in catalog order.
    fn tracks(&self) -> Vec<Track>;

    /// Absolute location of the playable resource for `track`.
    fn resolve(&self, track: &Track) -> Result<PathBuf, CatalogError>;

    /// Move `track` to the front of the recency list.
    fn record_recent(&mut self, track: &Track);

    /// Recently played ids, most recent first.
    fn recent(&self) -> Vec<TrackId>;

    /// Successor of `track`, wrapping to the first track after the last.
    fn track_after(&self, track: &Track) -> Option<Track>;

    /// Predecessor of `track`, wrapping to the last track before the first.
    fn track_before(&self, track: &Track) -> Option<Track>;

    /// Delete `track` and its resource.
    fn remove(&mut self, track: &Track) -> Result<(), CatalogError>;

    /// Replace the artwork reference of a track and persist it.
    fn set_artwork(&mut self, id: TrackId, artwork: Option<String>) -> Result<Track, CatalogError>;
}
