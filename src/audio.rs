//! Audio subsystem: the playback graph and its rodio implementation.
//!
//! `PlaybackGraph` is the seam the engine drives; `RodioGraph` renders
//! through rodio's output stream with a single gain stage in between.

mod graph;
mod output;
mod probe;
mod source;
mod types;

pub use graph::PlaybackGraph;
pub use output::RodioGraph;
pub use types::*;
