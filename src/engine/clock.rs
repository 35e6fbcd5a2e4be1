//! Position clock.
//!
//! The render thread only advances a frame counter. The control path reads
//! it once per tick and turns it into seconds here.

use log::debug;

use super::Engine;
use super::events::PlayerEvent;
use super::session::Phase;

/// Elapsed seconds for a segment that started at `start_frame` and has
/// rendered `rendered` frames, clamped to `[0, duration]`.
pub(super) fn elapsed_secs(start_frame: u64, rendered: u64, sample_rate: u32, duration: f64) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    let secs = start_frame.saturating_add(rendered) as f64 / f64::from(sample_rate);
    secs.clamp(0.0, duration.max(0.0))
}

impl Engine {
    /// One clock tick. Only does anything while playing; fires the finish
    /// transition in the same tick the position reaches the end.
    pub fn tick(&mut self) {
        let rendered = self.graph.rendered_frames();
        let drained = self.graph.is_drained();

        let Some(s) = self.session.active_mut() else {
            return;
        };
        if s.phase != Phase::Playing {
            return;
        }

        let elapsed = elapsed_secs(s.start_frame, rendered, s.sample_rate, s.duration);
        s.position = if drained { s.duration } else { elapsed };
        let finished = s.position >= s.duration;
        let (position, duration) = (s.position, s.duration);

        self.publish();
        self.emit(PlayerEvent::Position {
            elapsed: position,
            duration,
        });

        if finished {
            debug!("track reached its end at {position:.3}s");
            self.finish();
        }
    }

    /// Refresh the position from the frame counter outside of a tick, e.g.
    /// right before pausing. Never triggers the finish transition.
    pub(super) fn sample_position(&mut self) {
        let rendered = self.graph.rendered_frames();
        if let Some(s) = self.session.active_mut() {
            if s.phase == Phase::Playing {
                s.position = elapsed_secs(s.start_frame, rendered, s.sample_rate, s.duration);
            }
        }
    }
}
