//! Container duration probing with Symphonia
//!
//! Only the container headers are read. No packets are decoded.

use crate::error::{EngineError, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

/// Probe the duration of the default track in seconds.
///
/// Returns `Ok(None)` when the container does not declare a frame count.
///
/// # Errors
/// `ResourceUnavailable` if the file cannot be opened, `Probe` if the format
/// is not recognised or has no playable track.
pub fn probe_duration(path: &Path) -> Result<Option<f64>> {
    let file = File::open(path)
        .map_err(|e| EngineError::ResourceUnavailable(format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Extension hint speeds up format detection
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::Probe(format!("Failed to probe file: {}", e)))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| EngineError::Probe("No playable tracks found".into()))?;

    let params = &track.codec_params;
    let Some(n_frames) = params.n_frames else {
        return Ok(None);
    };

    let time_base = match (params.time_base, params.sample_rate) {
        (Some(tb), _) => tb,
        (None, Some(rate)) if rate > 0 => TimeBase::new(1, rate),
        _ => return Ok(None),
    };

    let time = time_base.calc_time(n_frames);
    Ok(Some(time.seconds as f64 + time.frac))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_wav(path: &Path, sample_rate: u32, seconds: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..sample_rate * seconds {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn probes_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 8000, 2);

        let duration = probe_duration(&path).unwrap().unwrap();
        assert!((duration - 2.0).abs() < 0.01, "got {duration}");
    }

    #[test]
    fn garbage_fails_to_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"definitely not audio").unwrap();

        assert!(matches!(probe_duration(&path), Err(EngineError::Probe(_))));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            probe_duration(&dir.path().join("gone.wav")),
            Err(EngineError::ResourceUnavailable(_))
        ));
    }
}
