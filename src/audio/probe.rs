//! Header decoding: sample rate, channel layout and length of a resource.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use rodio::{Decoder, Source};

use super::types::{GraphError, SourceInfo};

/// Open `path` with the decoder used for rendering.
pub(crate) fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, GraphError> {
    let file = File::open(path).map_err(|source| GraphError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| GraphError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read the format of `path`.
///
/// The decoder's own length is preferred; container tags (via lofty) fill in
/// when the decoder cannot tell without reading the whole stream.
pub fn probe(path: &Path) -> Result<SourceInfo, GraphError> {
    let decoder = open_decoder(path)?;
    let sample_rate = decoder.sample_rate();
    let channels = decoder.channels();

    let duration = decoder
        .total_duration()
        .or_else(|| tagged_duration(path))
        .filter(|d| !d.is_zero())
        .ok_or_else(|| GraphError::Decode {
            path: path.to_path_buf(),
            reason: "unknown stream length".to_string(),
        })?;

    if sample_rate == 0 || channels == 0 {
        return Err(GraphError::Decode {
            path: path.to_path_buf(),
            reason: "invalid stream format".to_string(),
        });
    }

    Ok(SourceInfo {
        sample_rate,
        channels,
        frame_count: frames_for(duration, sample_rate),
    })
}

fn tagged_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}

/// Number of whole frames in `duration` at `sample_rate`.
pub(crate) fn frames_for(duration: Duration, sample_rate: u32) -> u64 {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as u64
}
