use ffpipe_av::{get_tool_path, Ffmpeg, LogLevel, Probe, Toolchain};
use ffpipe_media::ImageEncoding;
use ffpipe_options::Value;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub ffmpeg: FfmpegConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

impl ToolsConfig {
    /// Program names for building commands, without touching the filesystem.
    pub fn toolchain(&self) -> Toolchain {
        let defaults = Toolchain::default();
        Toolchain {
            ffmpeg: display_or(&self.ffmpeg_path, defaults.ffmpeg),
            ffprobe: display_or(&self.ffprobe_path, defaults.ffprobe),
        }
    }

    /// Locate both tools, preferring the configured paths.
    pub fn resolve(&self) -> ffpipe_av::Result<Toolchain> {
        let defaults = Toolchain::default();
        let ffmpeg = get_tool_path(&defaults.ffmpeg, self.ffmpeg_path.as_deref())?;
        let ffprobe = get_tool_path(&defaults.ffprobe, self.ffprobe_path.as_deref())?;
        Ok(Toolchain {
            ffmpeg: ffmpeg.to_string_lossy().into_owned(),
            ffprobe: ffprobe.to_string_lossy().into_owned(),
        })
    }
}

fn display_or(path: &Option<PathBuf>, fallback: String) -> String {
    path.as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or(fallback)
}

/// Global options applied to every ffmpeg invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FfmpegConfig {
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Suppress the periodic progress line.
    #[serde(default)]
    pub nostats: bool,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            loglevel: default_loglevel(),
            nostats: false,
        }
    }
}

fn default_loglevel() -> String {
    LogLevel::Error.to_string()
}

/// Overrides for ffprobe. Unset fields leave ffprobe's own defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub rtsp_transport: Option<String>,

    #[serde(default)]
    pub probesize: Option<i64>,

    #[serde(default)]
    pub analyzeduration: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Frame rate to capture at; the probed rate when unset.
    #[serde(default)]
    pub fps: Option<f64>,

    #[serde(default = "default_image_format")]
    pub image_format: String,

    /// JPEG quality, 1-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            pixel_format: default_pixel_format(),
            fps: None,
            image_format: default_image_format(),
            quality: default_quality(),
        }
    }
}

impl CaptureConfig {
    pub fn encoding(&self) -> ffpipe_media::Result<ImageEncoding> {
        self.image_format.parse()
    }
}

fn default_pixel_format() -> String {
    "rgb24".to_string()
}

fn default_image_format() -> String {
    "png".to_string()
}

fn default_quality() -> u8 {
    ffpipe_media::DEFAULT_QUALITY
}

impl FfmpegConfig {
    /// Set the configured global options on `ffmpeg`.
    pub fn apply(&self, ffmpeg: &mut Ffmpeg) -> ffpipe_av::Result<()> {
        let globals = ffmpeg.globals_mut();
        globals.set("loglevel", self.loglevel.as_str())?;
        if self.nostats {
            globals.set("nostats", Value::Switch)?;
        }
        Ok(())
    }
}

impl ProbeConfig {
    /// Set the configured overrides on `probe`.
    pub fn apply(&self, probe: &mut Probe) -> ffpipe_av::Result<()> {
        if let Some(transport) = &self.rtsp_transport {
            probe.set("rtsp_transport", transport.as_str())?;
        }
        if let Some(size) = self.probesize {
            probe.set("probesize", size)?;
        }
        if let Some(duration) = self.analyzeduration {
            probe.set("analyzeduration", duration)?;
        }
        Ok(())
    }
}
