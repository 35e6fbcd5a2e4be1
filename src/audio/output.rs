//! `PlaybackGraph` on top of `rodio`.
//!
//! Each scheduled segment becomes its own `Sink` fed by
//! `Decoder -> GainStage -> Metered`. The sink is only built while an output
//! stream is open; a segment scheduled without one is remembered and realized
//! by the next successful `start`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};

use super::graph::PlaybackGraph;
use super::probe::{open_decoder, probe};
use super::source::{GainStage, Metered, SharedGain};
use super::types::{GraphError, SourceInfo, clamp_gain_db, db_to_amplitude};

struct OpenSource {
    path: PathBuf,
    info: SourceInfo,
}

#[derive(Debug, Copy, Clone)]
struct Segment {
    from_frame: u64,
    frame_count: u64,
}

pub struct RodioGraph {
    stream: Option<OutputStream>,
    sink: Option<Sink>,
    source: Option<OpenSource>,
    segment: Option<Segment>,
    playing: bool,
    frames: Arc<AtomicU64>,
    gain: SharedGain,
}

impl RodioGraph {
    pub fn new(gain_db: f32) -> Self {
        Self {
            stream: None,
            sink: None,
            source: None,
            segment: None,
            playing: false,
            frames: Arc::new(AtomicU64::new(0)),
            gain: SharedGain::new(db_to_amplitude(gain_db)),
        }
    }

    /// A stopped sink may still render a buffer before rodio notices, so
    /// every segment counts into its own atomic and the old one is let go.
    fn discard_sink(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.frames = Arc::new(AtomicU64::new(0));
    }

    /// Build the sink for the scheduled segment if everything it needs exists.
    fn realize(&mut self) -> Result<(), GraphError> {
        if self.sink.is_some() {
            return Ok(());
        }
        let (Some(stream), Some(source), Some(segment)) =
            (self.stream.as_ref(), self.source.as_ref(), self.segment)
        else {
            return Ok(());
        };

        let sink = build_sink(stream, source, segment, &self.frames, &self.gain)?;
        if self.playing {
            sink.play();
        }
        self.sink = Some(sink);
        Ok(())
    }
}

impl PlaybackGraph for RodioGraph {
    fn open(&mut self, path: &Path) -> Result<SourceInfo, GraphError> {
        let info = probe(path)?;
        self.stop();
        self.source = Some(OpenSource {
            path: path.to_path_buf(),
            info,
        });
        Ok(info)
    }

    fn start(&mut self) -> Result<(), GraphError> {
        if self.stream.is_none() {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| GraphError::Device(e.to_string()))?;
            // rodio logs to stderr when OutputStream is dropped; that would
            // scribble over the terminal on every rebuild.
            stream.log_on_drop(false);
            info!("audio output opened");
            self.stream = Some(stream);
        }
        self.realize()
    }

    fn reset_output(&mut self) {
        self.discard_sink();
        self.segment = None;
        self.playing = false;
        if self.stream.take().is_some() {
            debug!("audio output released");
        }
    }

    fn schedule_segment(&mut self, from_frame: u64, frame_count: u64) -> Result<(), GraphError> {
        if self.source.is_none() {
            return Err(GraphError::NoSource);
        }
        self.discard_sink();
        self.playing = false;
        self.segment = Some(Segment {
            from_frame,
            frame_count,
        });
        self.realize()
    }

    fn play(&mut self) {
        self.playing = true;
        if let Some(s) = self.sink.as_ref() {
            s.play();
        }
    }

    fn pause(&mut self) {
        self.playing = false;
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
    }

    fn stop(&mut self) {
        self.playing = false;
        self.discard_sink();
        self.segment = None;
    }

    fn rendered_frames(&self) -> u64 {
        if self.sink.is_none() {
            return 0;
        }
        self.frames.load(Ordering::Relaxed)
    }

    fn is_drained(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| s.empty())
    }

    fn set_gain_db(&mut self, db: f32) -> f32 {
        let db = clamp_gain_db(db);
        self.gain.set(db_to_amplitude(db));
        db
    }
}

fn build_sink(
    stream: &OutputStream,
    source: &OpenSource,
    segment: Segment,
    frames: &Arc<AtomicU64>,
    gain: &SharedGain,
) -> Result<Sink, GraphError> {
    let at = Duration::from_secs_f64(segment.from_frame as f64 / f64::from(source.info.sample_rate));

    let mut decoder = open_decoder(&source.path)?;
    let decoded: Box<dyn Source + Send> = if at.is_zero() {
        Box::new(decoder)
    } else {
        match decoder.try_seek(at) {
            Ok(()) => Box::new(decoder),
            Err(e) => {
                // Not every format can seek; decode up to the offset instead.
                warn!("seek in {:?} failed ({e}), skipping instead", source.path);
                Box::new(open_decoder(&source.path)?.skip_duration(at))
            }
        }
    };

    let chain = Metered::new(
        GainStage::new(decoded, gain.clone()),
        segment.frame_count,
        frames.clone(),
    );

    let sink = Sink::connect_new(stream.mixer());
    sink.append(chain);
    sink.pause();
    Ok(sink)
}
