use std::path::Path;

use super::types::{GraphError, SourceInfo};

/// Decode source -> gain stage -> output sink.
///
/// The engine is the only caller. Implementations own the render side and
/// expose nothing but a frame counter back to the control path.
pub trait PlaybackGraph {
    /// Make `path` the active source and report its format.
    fn open(&mut self, path: &Path) -> Result<SourceInfo, GraphError>;

    /// Activate the output device and realize the scheduled segment on it.
    /// Safe to call while already running.
    fn start(&mut self) -> Result<(), GraphError>;

    /// Drop the output device and the scheduled segment so the next `start`
    /// picks up the current default. The caller reschedules.
    fn reset_output(&mut self);

    /// Replace whatever is scheduled with `frame_count` frames starting at
    /// `from_frame`. The new segment stays silent until `play`.
    fn schedule_segment(&mut self, from_frame: u64, frame_count: u64) -> Result<(), GraphError>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Silence output and discard the scheduled segment.
    fn stop(&mut self);

    /// Frames rendered from the current segment so far.
    fn rendered_frames(&self) -> u64;

    /// The current segment has been rendered to its end.
    fn is_drained(&self) -> bool;

    /// Set the gain of the processing stage; returns the clamped value in dB.
    fn set_gain_db(&mut self, db: f32) -> f32;
}
