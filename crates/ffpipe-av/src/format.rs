//! Muxer, demuxer and device configurations.

use crate::catalog::{FormatName, PixelFormat, DEMUXER_FFLAGS, MOVFLAGS, MUXER_FFLAGS};
use crate::codec::video_size;
use crate::{Error, Result};
use ffpipe_options::{FlagSet, OptionSpec, Options, Outcome, Rule, Schema, Value, ValueKind};
use std::fmt;
use std::sync::LazyLock;

/// Which side of the tool a format sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Muxer,
    Demuxer,
    /// Capture devices read like demuxers.
    Device,
}

/// Format implementation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    Generic,
    V4l2,
    RawVideo,
    Mp4,
    Segment,
    H264,
    Hevc,
}

const BOOLEAN: &[ValueKind] = &[ValueKind::Bool];
const TEXT: &[ValueKind] = &[ValueKind::Text];
const BINARY: &[&str] = &["0", "1"];

static MUXER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("muxer")
        .option(OptionSpec::new("format", "f", Rule::OneOf(FormatName::NAMES)).doc("Container format"))
        .option(
            OptionSpec::new("fflags", "fflags", Rule::Flags(MUXER_FFLAGS))
                .with_default(FlagSet::with_allowed(MUXER_FFLAGS)),
        )
});

static DEMUXER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("demuxer")
        .opt("format", "f", Rule::OneOf(FormatName::NAMES))
        .option(
            OptionSpec::new("fflags", "fflags", Rule::Flags(DEMUXER_FFLAGS))
                .with_default(FlagSet::with_allowed(DEMUXER_FFLAGS)),
        )
        .option(
            OptionSpec::new("probesize", "probesize", Rule::Range { min: 32.0, max: 5_000_000.0 })
                .doc("Bytes read to detect the stream layout"),
        )
        .opt(
            "analyzeduration",
            "analyzeduration",
            Rule::Range { min: 0.0, max: 5_000_000.0 },
        )
});

fn fixed_format(name: &'static str, parent: &Schema, format: &'static str) -> Schema {
    Schema::new(name).inherit(parent).option(
        OptionSpec::new("format", "f", Rule::Any)
            .with_default(format)
            .read_only(),
    )
}

static V4L2: LazyLock<Schema> = LazyLock::new(|| {
    fixed_format("v4l2", &DEMUXER, "v4l2")
        .opt("input_format", "input_format", Rule::Kinds(TEXT))
        .opt("framerate", "framerate", Rule::Min(1.0))
});

static RAW_VIDEO_DEMUXER: LazyLock<Schema> = LazyLock::new(|| {
    fixed_format("rawvideo-demuxer", &DEMUXER, "rawvideo")
        .opt("framerate", "framerate", Rule::Min(1.0))
        .opt("pixel_format", "pixel_format", Rule::OneOf(PixelFormat::NAMES))
        .option(
            OptionSpec::new("video_size", "video_size", Rule::Custom(video_size))
                .doc("Frame size as WxH; raw input cannot be probed"),
        )
});

static RAW_VIDEO_MUXER: LazyLock<Schema> =
    LazyLock::new(|| fixed_format("rawvideo-muxer", &MUXER, "rawvideo"));

static MP4_MUXER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("mp4-muxer")
        .inherit(&MUXER)
        .narrow(
            "format",
            Rule::OneOf(&["mov", "mp4", "mpegts"]),
            Some(Value::from("mp4")),
        )
        .option(
            OptionSpec::new("movflags", "movflags", Rule::Flags(MOVFLAGS))
                .with_default(FlagSet::with_allowed(MOVFLAGS)),
        )
        .opt("moov_size", "moov_size", Rule::Min(0.0))
        .opt("frag_duration", "frag_duration", Rule::Min(0.0))
        .opt("frag_size", "frag_size", Rule::Min(0.0))
        .opt("min_frag_duration", "min_frag_duration", Rule::Min(0.0))
        .opt("write_tmcd", "write_tmcd", Rule::Kinds(BOOLEAN))
        .opt("write_prft", "write_prft", Rule::OneOf(&["wallclock", "pts"]))
});

static MP4_DEMUXER: LazyLock<Schema> =
    LazyLock::new(|| fixed_format("mp4-demuxer", &DEMUXER, "mp4"));

static SEGMENT: LazyLock<Schema> = LazyLock::new(|| {
    fixed_format("segment", &MUXER, "segment")
        .option(
            OptionSpec::new("segment_time", "segment_time", Rule::Min(0.0))
                .doc("Target segment length in seconds"),
        )
        .opt("segment_format", "segment_format", Rule::OneOf(&["mp4", "mov", "mpegts"]))
        .opt("segment_format_options", "segment_format_options", Rule::Params)
        .opt("strftime", "strftime", Rule::OneOf(BINARY))
        .opt("reset_timestamps", "reset_timestamps", Rule::OneOf(BINARY))
        .opt("segment_atclocktime", "segment_atclocktime", Rule::OneOf(BINARY))
});

static H264_MUXER: LazyLock<Schema> =
    LazyLock::new(|| fixed_format("h264-muxer", &MUXER, "h264"));

static H264_DEMUXER: LazyLock<Schema> =
    LazyLock::new(|| fixed_format("h264-demuxer", &DEMUXER, "h264"));

static HEVC_MUXER: LazyLock<Schema> =
    LazyLock::new(|| fixed_format("hevc-muxer", &MUXER, "hevc"));

static HEVC_DEMUXER: LazyLock<Schema> =
    LazyLock::new(|| fixed_format("hevc-demuxer", &DEMUXER, "hevc"));

/// The option table for a format variant.
pub fn schema_for(direction: Direction, family: FormatFamily) -> Result<&'static Schema> {
    let schema: &'static Schema = match (family, direction) {
        (FormatFamily::Generic, Direction::Muxer) => &MUXER,
        (FormatFamily::Generic, Direction::Demuxer) => &DEMUXER,
        (FormatFamily::V4l2, Direction::Device) => &V4L2,
        (FormatFamily::RawVideo, Direction::Muxer) => &RAW_VIDEO_MUXER,
        (FormatFamily::RawVideo, Direction::Demuxer) => &RAW_VIDEO_DEMUXER,
        (FormatFamily::Mp4, Direction::Muxer) => &MP4_MUXER,
        (FormatFamily::Mp4, Direction::Demuxer) => &MP4_DEMUXER,
        (FormatFamily::Segment, Direction::Muxer) => &SEGMENT,
        (FormatFamily::H264, Direction::Muxer) => &H264_MUXER,
        (FormatFamily::H264, Direction::Demuxer) => &H264_DEMUXER,
        (FormatFamily::Hevc, Direction::Muxer) => &HEVC_MUXER,
        (FormatFamily::Hevc, Direction::Demuxer) => &HEVC_DEMUXER,
        _ => {
            return Err(Error::Unsupported(format!(
                "{family:?} has no {direction:?} variant"
            )))
        }
    };
    Ok(schema)
}

/// A muxer, demuxer or capture device configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    direction: Direction,
    family: FormatFamily,
    options: Options,
}

impl Format {
    pub fn new(direction: Direction, family: FormatFamily) -> Result<Self> {
        let schema = schema_for(direction, family)?;
        Ok(Self {
            direction,
            family,
            options: Options::new(schema),
        })
    }

    fn known(direction: Direction, family: FormatFamily, schema: &'static Schema) -> Self {
        Self {
            direction,
            family,
            options: Options::new(schema),
        }
    }

    /// Muxer with no forced format; ffmpeg guesses from the destination.
    pub fn muxer() -> Self {
        Self::known(Direction::Muxer, FormatFamily::Generic, &MUXER)
    }

    /// Demuxer with no forced format; ffmpeg probes the source.
    pub fn demuxer() -> Self {
        Self::known(Direction::Demuxer, FormatFamily::Generic, &DEMUXER)
    }

    /// Video4Linux2 capture device.
    pub fn v4l2() -> Self {
        Self::known(Direction::Device, FormatFamily::V4l2, &V4L2)
    }

    pub fn raw_video_muxer() -> Self {
        Self::known(Direction::Muxer, FormatFamily::RawVideo, &RAW_VIDEO_MUXER)
    }

    pub fn raw_video_demuxer() -> Self {
        Self::known(Direction::Demuxer, FormatFamily::RawVideo, &RAW_VIDEO_DEMUXER)
    }

    /// MP4 family muxer (`mp4` by default, also `mov` and `mpegts`).
    pub fn mp4() -> Self {
        Self::known(Direction::Muxer, FormatFamily::Mp4, &MP4_MUXER)
    }

    pub fn mp4_demuxer() -> Self {
        Self::known(Direction::Demuxer, FormatFamily::Mp4, &MP4_DEMUXER)
    }

    pub fn segment() -> Self {
        Self::known(Direction::Muxer, FormatFamily::Segment, &SEGMENT)
    }

    pub fn h264_muxer() -> Self {
        Self::known(Direction::Muxer, FormatFamily::H264, &H264_MUXER)
    }

    pub fn h264_demuxer() -> Self {
        Self::known(Direction::Demuxer, FormatFamily::H264, &H264_DEMUXER)
    }

    pub fn hevc_muxer() -> Self {
        Self::known(Direction::Muxer, FormatFamily::Hevc, &HEVC_MUXER)
    }

    pub fn hevc_demuxer() -> Self {
        Self::known(Direction::Demuxer, FormatFamily::Hevc, &HEVC_DEMUXER)
    }

    /// Look up a muxer by format name.
    pub fn muxer_by_name(name: &str) -> Result<Self> {
        let mut format = match name {
            "rawvideo" => return Ok(Self::raw_video_muxer()),
            "segment" => return Ok(Self::segment()),
            "h264" => return Ok(Self::h264_muxer()),
            "hevc" => return Ok(Self::hevc_muxer()),
            "mp4" | "mov" | "mpegts" => Self::mp4(),
            other if FormatName::NAMES.contains(&other) => Self::muxer(),
            other => return Err(Error::Unsupported(format!("muxer '{other}'"))),
        };
        format.set("format", name)?;
        Ok(format)
    }

    /// Look up a demuxer by format name.
    pub fn demuxer_by_name(name: &str) -> Result<Self> {
        match name {
            "v4l2" => Ok(Self::v4l2()),
            "rawvideo" => Ok(Self::raw_video_demuxer()),
            "mp4" => Ok(Self::mp4_demuxer()),
            "h264" => Ok(Self::h264_demuxer()),
            "hevc" => Ok(Self::hevc_demuxer()),
            other if FormatName::NAMES.contains(&other) => {
                let mut format = Self::demuxer();
                format.set("format", other)?;
                Ok(format)
            }
            other => Err(Error::Unsupported(format!("demuxer '{other}'"))),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn family(&self) -> FormatFamily {
        self.family
    }

    /// Whether this format can sit on an input stream.
    pub fn can_read(&self) -> bool {
        matches!(self.direction, Direction::Demuxer | Direction::Device)
    }

    /// Whether this format can sit on an output stream.
    pub fn can_write(&self) -> bool {
        self.direction == Direction::Muxer
    }

    pub fn is_device(&self) -> bool {
        self.direction == Direction::Device
    }

    /// The forced format name, if any.
    pub fn name(&self) -> Option<&str> {
        self.options.get("format").and_then(Value::as_str)
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

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn to_args(&self) -> Vec<String> {
        self.options.to_ordered_args()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.options)
    }
}
