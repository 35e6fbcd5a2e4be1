//! File-backed catalog: `library.toml` plus managed copies under `media/`.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::model::{Catalog, CatalogError, Track, TrackId};

const LIBRARY_FILE: &str = "library.toml";
const MEDIA_DIR: &str = "media";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    recent: Vec<TrackId>,
    #[serde(default)]
    tracks: Vec<Track>,
}

pub struct Library {
    root: PathBuf,
    tracks: Vec<Track>,
    recent: VecDeque<TrackId>,
    recent_limit: usize,
}

impl Library {
    /// Open (or create) the catalog stored under `root`.
    ///
    /// A `library.toml` that cannot be parsed is moved aside to
    /// `library.toml.bak` and an empty catalog is started.
    pub fn open(root: &Path, recent_limit: usize) -> Result<Self, CatalogError> {
        fs::create_dir_all(root.join(MEDIA_DIR))?;

        let file = root.join(LIBRARY_FILE);
        let persisted = match fs::read_to_string(&file) {
            Ok(text) => match toml::from_str::<Persisted>(&text) {
                Ok(p) => p,
                Err(e) => {
                    warn!("catalog {file:?} is unreadable ({e}); starting empty");
                    fs::rename(&file, root.join(format!("{LIBRARY_FILE}.bak")))?;
                    Persisted::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Persisted::default(),
            Err(e) => return Err(e.into()),
        };

        let mut library = Self {
            root: root.to_path_buf(),
            tracks: persisted.tracks,
            recent: VecDeque::new(),
            recent_limit: recent_limit.max(1),
        };

        // Keep only known ids, once each, within the bound.
        let known: HashSet<TrackId> = library.tracks.iter().map(|t| t.id).collect();
        let mut seen = HashSet::new();
        for id in persisted.recent {
            if known.contains(&id) && seen.insert(id) && library.recent.len() < library.recent_limit
            {
                library.recent.push_back(id);
            }
        }

        debug!(
            "catalog opened at {:?}: {} tracks",
            library.root,
            library.tracks.len()
        );
        Ok(library)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding managed copies of imported files.
    pub fn media_dir(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    /// Tracks in catalog order, borrowed.
    pub fn entries(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Append a track whose resource already lives under the storage root.
    pub fn append(&mut self, track: Track) {
        self.tracks.push(track);
        self.persist();
    }

    fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Write `library.toml` through a temporary file so a crash never leaves it half-written.
    fn save(&self) -> Result<(), CatalogError> {
        let persisted = Persisted {
            recent: self.recent.iter().copied().collect(),
            tracks: self.tracks.clone(),
        };
        let text = toml::to_string_pretty(&persisted)?;
        let tmp = self.root.join(format!("{LIBRARY_FILE}.tmp"));
        fs::write(&tmp, text)?;
        fs::rename(&tmp, self.root.join(LIBRARY_FILE))?;
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!("failed to save catalog: {e}");
        }
    }
}

impl Catalog for Library {
    fn tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    fn resolve(&self, track: &Track) -> Result<PathBuf, CatalogError> {
        let path = self.root.join(&track.path);
        if !path.is_file() {
            return Err(CatalogError::Missing {
                id: track.id,
                path,
            });
        }
        Ok(path)
    }

    fn record_recent(&mut self, track: &Track) {
        self.recent.retain(|id| *id != track.id);
        self.recent.push_front(track.id);
        self.recent.truncate(self.recent_limit);
        self.persist();
    }

    fn recent(&self) -> Vec<TrackId> {
        self.recent.iter().copied().collect()
    }

    fn track_after(&self, track: &Track) -> Option<Track> {
        let next = match self.position(track.id) {
            Some(i) => (i + 1) % self.tracks.len(),
            None => 0,
        };
        self.tracks.get(next).cloned()
    }

    fn track_before(&self, track: &Track) -> Option<Track> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        let prev = match self.position(track.id) {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.tracks.get(prev).cloned()
    }

    fn remove(&mut self, track: &Track) -> Result<(), CatalogError> {
        let idx = self
            .position(track.id)
            .ok_or(CatalogError::UnknownTrack(track.id))?;
        let removed = self.tracks.remove(idx);
        self.recent.retain(|id| *id != removed.id);

        match fs::remove_file(self.root.join(&removed.path)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to delete {:?}: {e}", removed.path),
        }

        self.persist();
        Ok(())
    }

    fn set_artwork(&mut self, id: TrackId, artwork: Option<String>) -> Result<Track, CatalogError> {
        let idx = self.position(id).ok_or(CatalogError::UnknownTrack(id))?;
        self.tracks[idx].artwork = artwork;
        let updated = self.tracks[idx].clone();
        self.save()?;
        Ok(updated)
    }
}
