mod types;

pub use types::*;

use anyhow::{Context, Result};
use ffpipe_av::{LogLevel, PixelFormat, Probe};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./ffpipe.toml",
        "./config.toml",
        "~/.config/ffpipe/config.toml",
        "/etc/ffpipe/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    for (name, path) in [
        ("ffmpeg_path", &config.tools.ffmpeg_path),
        ("ffprobe_path", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("tools.{} does not exist: {:?}", name, path);
            }
        }
    }

    if config.ffmpeg.loglevel.parse::<LogLevel>().is_err() {
        anyhow::bail!(
            "ffmpeg.loglevel must be one of {}, got '{}'",
            LogLevel::NAMES.join(", "),
            config.ffmpeg.loglevel
        );
    }

    let mut probe = Probe::new("")?;
    config
        .probe
        .apply(&mut probe)
        .context("Invalid [probe] section")?;

    let capture = &config.capture;
    match capture.pixel_format.parse::<PixelFormat>() {
        Ok(format) if format.packed_bytes() == Some(3) => {}
        _ => anyhow::bail!(
            "capture.pixel_format must be rgb24 or bgr24, got '{}'",
            capture.pixel_format
        ),
    }
    if let Some(fps) = capture.fps {
        if fps.is_nan() || fps <= 0.0 {
            anyhow::bail!("capture.fps must be positive, got {}", fps);
        }
    }
    if capture.encoding().is_err() {
        anyhow::bail!(
            "capture.image_format must be jpeg or png, got '{}'",
            capture.image_format
        );
    }
    if !(1..=100).contains(&capture.quality) {
        anyhow::bail!("capture.quality must be between 1 and 100, got {}", capture.quality);
    }

    Ok(())
}
