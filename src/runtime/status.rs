//! The one-line terminal status, fed by engine notifications.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::audio::{PlaybackState, RepeatMode};
use crate::engine::{Engine, PlayerEvent};

/// Render the key help, incorporating the scrub interval.
pub fn controls_text(scrub_seconds: u64) -> String {
    [
        "[space/p] play/pause".to_string(),
        "[s] stop".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] scrub -/+{scrub_seconds}s"),
        "[-/+] gain".to_string(),
        "[r] repeat".to_string(),
        "[a] auto-advance".to_string(),
        "[D] delete track".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// Format seconds as `MM:SS`.
fn format_mmss(secs: f64) -> String {
    let secs = Duration::from_secs_f64(secs.max(0.0)).as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLine {
    state: PlaybackState,
    title: Option<String>,
    elapsed: f64,
    duration: f64,
    gain_db: f32,
    repeat: RepeatMode,
    auto_advance: bool,
}

impl StatusLine {
    pub fn new(engine: &Engine) -> Self {
        Self {
            state: engine.state(),
            title: engine.current_track().map(|t| t.title.clone()),
            elapsed: engine.position(),
            duration: engine.duration(),
            gain_db: engine.gain_db(),
            repeat: engine.repeat_mode(),
            auto_advance: engine.auto_advance(),
        }
    }

    pub fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::State(state) => self.state = state,
            PlayerEvent::Track(track) => {
                self.title = track.as_ref().map(|t| t.title.clone());
                self.elapsed = 0.0;
                self.duration = track.map_or(0.0, |t| t.duration);
            }
            PlayerEvent::Position { elapsed, duration } => {
                self.elapsed = elapsed;
                self.duration = duration;
            }
            PlayerEvent::Gain(db) => self.gain_db = db,
            PlayerEvent::Repeat { mode, auto_advance } => {
                self.repeat = mode;
                self.auto_advance = auto_advance;
            }
        }
    }

    pub fn render(&self) -> String {
        let state = match self.state {
            PlaybackState::Idle => "idle",
            PlaybackState::Loaded => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        };
        let track = match &self.title {
            Some(title) => format!(
                "{title}  {} / {}",
                format_mmss(self.elapsed),
                format_mmss(self.duration)
            ),
            None => "nothing loaded".to_string(),
        };
        format!(
            "[{state}] {track}  repeat:{} auto:{} gain:{:+.1}dB",
            self.repeat.label(),
            if self.auto_advance { "on" } else { "off" },
            self.gain_db
        )
    }

    pub fn draw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        queue!(
            out,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(self.render())
        )?;
        out.flush()
    }
}
