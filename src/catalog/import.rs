//! Importing files into managed storage.
//!
//! Each accepted file is probed for its title and length, copied under the
//! catalog's `media/` directory with a fresh id and appended to the catalog.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use lofty::prelude::*;
use log::{debug, info, warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Track, TrackId};
use super::store::Library;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to copy {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read metadata of {path:?}: {reason}")]
    Metadata { path: PathBuf, reason: String },
    #[error("{0:?} has no playable length")]
    NoDuration(PathBuf),
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<Track>,
    pub duplicates: usize,
    pub failed: Vec<(PathBuf, ImportError)>,
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Import every audio file under `dir`.
pub fn import_dir(library: &mut Library, dir: &Path, settings: &LibrarySettings) -> ImportReport {
    let mut report = ImportReport::default();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut candidates: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_audio_file(p, settings))
        .collect();
    candidates.sort();

    for path in candidates {
        match import_file(library, &path) {
            Ok(Some(track)) => report.imported.push(track),
            Ok(None) => report.duplicates += 1,
            Err(e) => {
                warn!("import of {path:?} failed: {e}");
                report.failed.push((path, e));
            }
        }
    }

    info!(
        "imported {} tracks from {dir:?} ({} already present, {} failed)",
        report.imported.len(),
        report.duplicates,
        report.failed.len()
    );
    report
}

/// Import a single file. Returns `Ok(None)` when an identical file is
/// already in managed storage.
pub fn import_file(library: &mut Library, path: &Path) -> Result<Option<Track>, ImportError> {
    let tagged = lofty::read_from_path(path).map_err(|e| ImportError::Metadata {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let duration = tagged.properties().duration().as_secs_f64();
    if duration <= 0.0 {
        return Err(ImportError::NoDuration(path.to_path_buf()));
    }

    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.title() {
            if !v.trim().is_empty() {
                title = v.trim().to_string();
            }
        }
    }

    if let Some(existing) = find_duplicate(library, path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })? {
        debug!("{path:?} is already imported as {existing}");
        return Ok(None);
    }

    let id = TrackId::new();
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
        None => id.to_string(),
    };
    let dest = library.media_dir().join(&file_name);
    fs::copy(path, &dest).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let track = Track {
        id,
        title,
        path: PathBuf::from("media").join(file_name),
        duration,
        artwork: None,
    };
    library.append(track.clone());
    Ok(Some(track))
}

/// A managed file with the same length and content as `path`, if any.
fn find_duplicate(library: &Library, path: &Path) -> io::Result<Option<TrackId>> {
    let len = fs::metadata(path)?.len();
    for track in library.entries() {
        let managed = library.root().join(&track.path);
        let Ok(meta) = fs::metadata(&managed) else {
            continue;
        };
        if meta.len() == len && same_contents(path, &managed)? {
            return Ok(Some(track.id));
        }
    }
    Ok(None)
}

fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    let mut fa = io::BufReader::new(fs::File::open(a)?);
    let mut fb = io::BufReader::new(fs::File::open(b)?);
    let mut ba = [0u8; 8192];
    let mut bb = [0u8; 8192];
    loop {
        let na = fa.read(&mut ba)?;
        if na == 0 {
            return Ok(fb.read(&mut bb)? == 0);
        }
        fb.read_exact(&mut bb[..na]).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                io::Error::other("length changed while comparing")
            } else {
                e
            }
        })?;
        if ba[..na] != bb[..na] {
            return Ok(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.wav"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn is_hidden_checks_leading_dot() {
        assert!(is_hidden(Path::new("/music/.cache.mp3")));
        assert!(!is_hidden(Path::new("/music/song.mp3")));
    }
}
