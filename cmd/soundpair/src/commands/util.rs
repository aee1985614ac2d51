//! Utility functions for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use soundpair_fingerprint::AudioSignal;
use soundpair_pairing::SessionConfig;

use crate::Cli;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".soundpair";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Returns ~/.soundpair/config.yaml.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
}

/// Path of the config file the CLI reads: `--config` or the default.
pub fn config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match cli.config.as_deref() {
        Some(p) => Ok(PathBuf::from(p)),
        None => default_config_path().ok_or_else(|| anyhow::anyhow!("cannot determine config path")),
    }
}

/// Loads the session configuration.
///
/// An explicit `--config` must exist. The default file is optional and
/// built-in defaults apply when it is missing.
pub fn get_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let path = config_path(cli)?;
    if cli.config.is_none() && !path.exists() {
        return Ok(SessionConfig::default());
    }
    SessionConfig::load(&path).with_context(|| format!("load config {}", path.display()))
}

/// Reads the first channel of a WAV file as normalized mono samples.
pub fn load_wav(path: impl AsRef<Path>) -> anyhow::Result<AudioSignal> {
    let path = path.as_ref();
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    if channels > 1 {
        tracing::debug!("{}: using channel 0 of {}", path.display(), channels);
    }

    AudioSignal::new(samples, spec.sample_rate)
        .with_context(|| format!("decode {}", path.display()))
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(result: &T, as_json: bool) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)? + "\n"
    } else {
        serde_yaml::to_string(result)?
    };
    print!("{}", output);
    Ok(())
}

/// Prints to stderr when `-v` is set.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: &[[i16; 2]]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in &frame[..spec.channels as usize] {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn loads_first_channel_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[[16384, -1], [-32768, -1], [0, -1]]);

        let signal = load_wav(&path).unwrap();
        assert_eq!(signal.sample_rate(), 8000);
        assert_eq!(signal.samples(), &[0.5, -1.0, 0.0]);
    }

    #[test]
    fn loads_float_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.75] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let signal = load_wav(&path).unwrap();
        assert_eq!(signal.samples(), &[0.25, -0.75]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_wav("/nonexistent/take.wav").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/take.wav"));
    }
}
