//! Command line: `cadence [IMPORT_DIR]` starts the player; a few
//! subcommands edit the catalog without starting playback.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::catalog::{Catalog, CatalogError, Library, TrackId};

#[derive(Debug, Parser)]
#[command(name = "cadence", version)]
#[command(about = "Local audio player with a persistent library", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory to import before starting
    pub import: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Start the player and play one track
    Play { id: TrackId },
    /// Print the catalog, most recent track marked with `*`
    List,
    /// Delete a track and its managed copy
    Remove { id: TrackId },
    /// Set a track's artwork reference, or clear it when no URL is given
    Artwork { id: TrackId, url: Option<String> },
}

/// Print the catalog, one track per line.
pub fn list<W: Write>(library: &Library, out: &mut W) -> io::Result<()> {
    let recent = library.recent();
    for track in library.entries() {
        let marker = if recent.first() == Some(&track.id) { '*' } else { ' ' };
        write!(
            out,
            "{marker} {}  {:>7.1}s  {}",
            track.id, track.duration, track.title
        )?;
        if let Some(url) = &track.artwork {
            write!(out, "  [{url}]")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn remove(library: &mut Library, id: TrackId) -> Result<String, CatalogError> {
    let track = library
        .get(id)
        .cloned()
        .ok_or(CatalogError::UnknownTrack(id))?;
    library.remove(&track)?;
    Ok(track.title)
}

pub fn set_artwork(
    library: &mut Library,
    id: TrackId,
    url: Option<String>,
) -> Result<String, CatalogError> {
    let track = library.set_artwork(id, url)?;
    Ok(track.title)
}
