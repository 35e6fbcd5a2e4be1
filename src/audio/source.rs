//! Render-side stages wrapped around the decoder.
//!
//! These run on rodio's output thread. They only touch atomics shared with
//! the control path: the gain is read, the frame counter is written.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use rodio::Source;

/// Gain shared between the control path and the render thread, stored as
/// `f32` bits of the linear amplitude.
#[derive(Debug, Clone)]
pub(crate) struct SharedGain(Arc<AtomicU32>);

impl SharedGain {
    pub(crate) fn new(amplitude: f32) -> Self {
        Self(Arc::new(AtomicU32::new(amplitude.to_bits())))
    }

    pub(crate) fn set(&self, amplitude: f32) {
        self.0.store(amplitude.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Applies the shared gain to every sample.
pub(crate) struct GainStage<S> {
    inner: S,
    gain: SharedGain,
}

impl<S: Source> GainStage<S> {
    pub(crate) fn new(inner: S, gain: SharedGain) -> Self {
        Self { inner, gain }
    }
}

impl<S: Source> Iterator for GainStage<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        Some(sample * self.gain.get())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for GainStage<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Ends the stream after `frame_limit` frames and publishes how many frames
/// have been pulled so far.
pub(crate) struct Metered<S> {
    inner: S,
    channels: u64,
    samples: u64,
    sample_limit: u64,
    frames: Arc<AtomicU64>,
}

impl<S: Source> Metered<S> {
    pub(crate) fn new(inner: S, frame_limit: u64, frames: Arc<AtomicU64>) -> Self {
        let channels = u64::from(inner.channels().max(1));
        frames.store(0, Ordering::Relaxed);
        Self {
            inner,
            channels,
            samples: 0,
            sample_limit: frame_limit.saturating_mul(channels),
            frames,
        }
    }
}

impl<S: Source> Iterator for Metered<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.samples >= self.sample_limit {
            return None;
        }
        let sample = self.inner.next()?;
        self.samples += 1;
        if self.samples % self.channels == 0 {
            self.frames
                .store(self.samples / self.channels, Ordering::Relaxed);
        }
        Some(sample)
    }
}

impl<S: Source> Source for Metered<S> {
    fn current_span_len(&self) -> Option<usize> {
        let remaining = usize::try_from(self.sample_limit - self.samples).unwrap_or(usize::MAX);
        self.inner.current_span_len().map(|n| n.min(remaining))
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
