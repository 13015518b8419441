//! Stream probing with ffprobe.

use crate::catalog::{LogLevel, RtspTransport};
use crate::stream::{Platform, Source};
use crate::{Error, Result};
use ffpipe_options::{OptionSpec, Options, Outcome, Rule, Schema, Value};
use serde::{Deserialize, Serialize};
use std::process::Command;
use std::sync::LazyLock;

/// Default program name, resolved through `PATH`.
pub const FFPROBE: &str = "ffprobe";

/// Flags requesting machine-readable output, appended after the options.
const OUTPUT_FLAGS: [&str; 4] = ["-show_format", "-show_streams", "-of", "json"];

static PROBE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("ffprobe")
        .opt("rtsp_transport", "rtsp_transport", Rule::OneOf(RtspTransport::NAMES))
        .option(
            OptionSpec::new("probesize", "probesize", Rule::Range { min: 32.0, max: 5_000_000.0 })
                .doc("Bytes read to detect the stream layout"),
        )
        .opt(
            "analyzeduration",
            "analyzeduration",
            Rule::Range { min: 0.0, max: 5_000_000.0 },
        )
        .option(OptionSpec::new("hide_banner", "hide_banner", Rule::Switch).with_default(Value::Switch))
        .option(
            OptionSpec::new("loglevel", "loglevel", Rule::OneOf(LogLevel::NAMES))
                .with_default(LogLevel::Error),
        )
});

/// The first video stream of a probed source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second, from `r_frame_rate`.
    pub r_frame_rate: f64,
    pub codec_name: Option<String>,
    pub pix_fmt: Option<String>,
    /// From `codec_tag_string`.
    pub tag: Option<String>,
    /// Every other key ffprobe reported for the stream.
    pub others: serde_json::Map<String, serde_json::Value>,
}

impl ProbeInfo {
    /// `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Parse ffprobe's JSON output into the first video stream.
pub fn parse_output(stdout: &[u8]) -> Result<ProbeInfo> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::parse_error(FFPROBE, "empty output"));
    }
    let output: FfprobeOutput = serde_json::from_slice(stdout)?;

    let mut stream = output
        .streams
        .into_iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))
        .ok_or(Error::NoVideoStream)?;

    let width = take_dimension(&mut stream, "width")?;
    let height = take_dimension(&mut stream, "height")?;
    let r_frame_rate = stream
        .remove("r_frame_rate")
        .and_then(|v| v.as_str().and_then(parse_frame_rate))
        .ok_or_else(|| Error::parse_error(FFPROBE, "missing or invalid r_frame_rate"))?;

    Ok(ProbeInfo {
        width,
        height,
        r_frame_rate,
        codec_name: take_string(&mut stream, "codec_name"),
        pix_fmt: take_string(&mut stream, "pix_fmt"),
        tag: take_string(&mut stream, "codec_tag_string"),
        others: stream,
    })
}

fn take_dimension(
    stream: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<u32> {
    stream
        .remove(key)
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::parse_error(FFPROBE, format!("missing or invalid {key}")))
}

fn take_string(stream: &mut serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    match stream.remove(key)? {
        serde_json::Value::String(s) => Some(s),
        other => {
            stream.insert(key.to_string(), other);
            None
        }
    }
}

/// `"num/den"` or a plain number.
pub fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok()
}

/// An ffprobe invocation for one source, with its result cached.
#[derive(Debug, Clone)]
pub struct Probe {
    program: String,
    source: Source,
    platform: Platform,
    options: Options,
    info: Option<ProbeInfo>,
}

impl Probe {
    pub fn new(source: impl Into<Source>) -> Result<Self> {
        Self::with_program(FFPROBE, source)
    }

    /// Use `program` instead of `ffprobe` from `PATH`.
    pub fn with_program(program: impl Into<String>, source: impl Into<Source>) -> Result<Self> {
        let mut probe = Self {
            program: program.into(),
            source: Source::Location(String::new()),
            platform: Platform::current(),
            options: Options::new(&PROBE),
            info: None,
        };
        probe.set_source(source)?;
        Ok(probe)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn path(&self) -> String {
        self.source.resolve(self.platform)
    }

    /// Change the source and forget the cached result.
    pub fn set_source(&mut self, source: impl Into<Source>) -> Result<()> {
        let source = source.into();
        if source.is_rtsp() {
            self.options.set("rtsp_transport", RtspTransport::Tcp)?;
        } else if self.options.is_set("rtsp_transport") {
            self.options.unset("rtsp_transport")?;
        }
        self.source = source;
        self.info = None;
        Ok(())
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Outcome> {
        Ok(self.options.set(key, value)?)
    }

    pub fn build(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.options.to_ordered_args());
        argv.extend(OUTPUT_FLAGS.iter().map(|flag| flag.to_string()));
        argv.push(self.path());
        argv
    }

    /// The probe result, running ffprobe on first use.
    pub fn info(&mut self) -> Result<&ProbeInfo> {
        let info = match self.info.take() {
            Some(info) => info,
            None => self.run()?,
        };
        Ok(self.info.insert(info))
    }

    /// Run ffprobe again and replace the cached result.
    pub fn refresh(&mut self) -> Result<&ProbeInfo> {
        let info = self.run()?;
        Ok(self.info.insert(info))
    }

    fn run(&self) -> Result<ProbeInfo> {
        let argv = self.build();

        #[cfg(feature = "tracing")]
        tracing::debug!(argv = %argv.join(" "), "Probing source");

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|e| Error::from_spawn(&self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool_failed(&self.program, stderr.trim()));
        }
        parse_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "audio", "codec_name": "aac"},
            {
                "index": 1,
                "codec_type": "video",
                "codec_name": "h264",
                "codec_tag_string": "avc1",
                "width": 1920,
                "height": 1080,
                "pix_fmt": "yuv420p",
                "r_frame_rate": "30000/1001",
                "profile": "High"
            }
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2"}
    }"#;

    #[test]
    fn test_parse_output() {
        let info = parse_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.size(), (1920, 1080));
        assert!((info.r_frame_rate - 29.97).abs() < 0.01);
        assert_eq!(info.codec_name.as_deref(), Some("h264"));
        assert_eq!(info.pix_fmt.as_deref(), Some("yuv420p"));
        assert_eq!(info.tag.as_deref(), Some("avc1"));
        assert_eq!(info.others["profile"], "High");
        assert_eq!(info.others["index"], 1);
        assert!(!info.others.contains_key("width"));
    }

    #[test]
    fn test_no_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}]}"#;
        assert_matches!(parse_output(json.as_bytes()), Err(Error::NoVideoStream));
        assert_matches!(parse_output(b"{}"), Err(Error::NoVideoStream));
    }

    #[test]
    fn test_empty_or_garbage_output() {
        assert_matches!(parse_output(b"  \n"), Err(Error::ParseError { .. }));
        assert_matches!(parse_output(b"not json"), Err(Error::Json(_)));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("24000/1001"), Some(23.976023976023978));
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn test_build() {
        let mut probe = Probe::new("rtsp://camera/1").unwrap();
        probe.set("probesize", 5000).unwrap();
        assert_eq!(
            probe.build(),
            [
                "ffprobe",
                "-hide_banner",
                "-loglevel",
                "error",
                "-probesize",
                "5000",
                "-rtsp_transport",
                "tcp",
                "-show_format",
                "-show_streams",
                "-of",
                "json",
                "rtsp://camera/1",
            ]
        );

        probe.set_source("clip.mp4").unwrap();
        assert!(!probe.build().contains(&"-rtsp_transport".to_string()));
    }

    #[test]
    fn test_missing_program() {
        let mut probe = Probe::with_program("ffpipe-no-such-probe", "clip.mp4").unwrap();
        assert_matches!(probe.info(), Err(Error::ToolNotFound { .. }));
    }
}
