//! Input and output streams.
//!
//! A stream owns its own options plus a nested codec and format. Building a
//! stream merges all three into one argument list sorted by wire name, then
//! appends the location (`-i <path>` for inputs, the destination for outputs).

use crate::catalog::{HwAccel, PixelFormat, RtspTransport, VSync};
use crate::codec::{video_size, Codec};
use crate::format::Format;
use crate::{Error, Result};
use ffpipe_options::{assemble, Fragment, OptionSpec, Options, Outcome, Rule, Schema, Value, ValueKind, Verdict};
use regex::Regex;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Destination that sends output to the process's standard output.
pub const PIPE: &str = "pipe:";

/// Device node prefix for capture devices on Linux.
pub const LINUX_DEVICE: &str = "/dev/video";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

static CLOCK_TIME: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{1,2}):(\d{1,2})$"));

/// Where an input reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Capture device index.
    Device(u32),
    /// File path or URL.
    Location(String),
}

impl Source {
    /// The path handed to the tool on `platform`.
    pub fn resolve(&self, platform: Platform) -> String {
        match (self, platform) {
            (Source::Device(index), Platform::Linux) => format!("{LINUX_DEVICE}{index}"),
            (Source::Device(index), Platform::Other) => index.to_string(),
            (Source::Location(location), _) => location.clone(),
        }
    }

    pub fn is_rtsp(&self) -> bool {
        matches!(self, Source::Location(location) if location.starts_with("rtsp"))
    }
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = s.parse() {
                return Ok(Source::Device(index));
            }
        }
        Ok(Source::Location(s.to_string()))
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(source) => source,
            Err(never) => match never {},
        }
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::from(s.as_str())
    }
}

impl From<u32> for Source {
    fn from(index: u32) -> Self {
        Source::Device(index)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Device(index) => write!(f, "{index}"),
            Source::Location(location) => f.write_str(location),
        }
    }
}

/// Target platform, which decides how device indices resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }
}

/// `H:M:S` text (at most 8 characters) or whole seconds, normalized to `HH:MM:SS`.
fn clock_time(value: Value) -> Verdict {
    let (hours, minutes, seconds) = match &value {
        Value::Int(total) if (0..SECONDS_PER_DAY).contains(total) => {
            (total / 3600, total % 3600 / 60, total % 60)
        }
        Value::Int(total) => {
            return Verdict::reject(format!("{total} seconds is not within one day"));
        }
        Value::Text(text) if text.len() <= 8 => {
            let pattern = match CLOCK_TIME.as_ref() {
                Ok(pattern) => pattern,
                Err(e) => return Verdict::reject(e.to_string()),
            };
            let Some(caps) = pattern.captures(text) else {
                return Verdict::reject(format!("expected HH:MM:SS, got '{text}'"));
            };
            let field = |i: usize| caps[i].parse::<i64>().unwrap_or(i64::MAX);
            (field(1), field(2), field(3))
        }
        other => return Verdict::reject(format!("expected HH:MM:SS, got {other}")),
    };

    if hours > 23 {
        return Verdict::reject(format!("hour must be at most 23, got {hours}"));
    }
    if minutes > 59 || seconds > 59 {
        return Verdict::reject(format!(
            "minutes and seconds must be at most 59, got {minutes}:{seconds}"
        ));
    }
    Verdict::Store(Value::Text(format!("{hours:02}:{minutes:02}:{seconds:02}")))
}

fn filter_chain(value: Value) -> Verdict {
    match value {
        Value::Text(text) => {
            let trimmed = text.strip_suffix(',').unwrap_or(&text);
            Verdict::Store(Value::Text(trimmed.to_string()))
        }
        other => Verdict::reject(format!("expected a filter graph, got {}", other.kind())),
    }
}

/// `false` leaves the option unset; `true` or a bare switch turns it on.
fn overwrite(value: Value) -> Verdict {
    match value {
        Value::Bool(false) => Verdict::Ignore,
        Value::Bool(true) | Value::Switch => Verdict::Store(Value::Switch),
        other => Verdict::reject(format!("expected a bool, got {}", other.kind())),
    }
}

static COMMON_STREAM: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("stream")
        .switch("no_audio", "an")
        .switch("no_data", "dn")
        .switch("no_subtitle", "sn")
        .switch("no_video", "vn")
        .option(OptionSpec::new("realtime", "re", Rule::Switch).doc("Read input at native frame rate"))
        .opt("video_sync", "vsync", Rule::OneOf(VSync::NAMES))
        .opt(
            "audio_sync",
            "async",
            Rule::chain([Rule::Kinds(&[ValueKind::Int]), Rule::Min(1.0)]),
        )
        .option(OptionSpec::new("seek", "ss", Rule::Custom(clock_time)).doc("Start position"))
        .option(OptionSpec::new("to", "to", Rule::Custom(clock_time)).doc("Stop position"))
        .option(OptionSpec::new("duration", "t", Rule::Min(0.0)).doc("Duration in seconds"))
        .opt("pix_fmt", "pix_fmt", Rule::OneOf(PixelFormat::NAMES))
});

static INPUT_STREAM: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("input")
        .inherit(&COMMON_STREAM)
        .opt("rtsp_transport", "rtsp_transport", Rule::OneOf(RtspTransport::NAMES))
        .opt("video_size", "video_size", Rule::Custom(video_size))
        .opt("frame_rate", "r", Rule::Min(0.0))
        .opt("hwaccel", "hwaccel", Rule::OneOf(HwAccel::NAMES))
        .opt("hwaccel_device", "hwaccel_device", Rule::OneOf(HwAccel::NAMES))
        .opt(
            "hwaccel_output_format",
            "hwaccel_output_format",
            Rule::Kinds(&[ValueKind::Text]),
        )
});

static OUTPUT_STREAM: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("output")
        .inherit(&COMMON_STREAM)
        .opt("video_filter", "vf", Rule::Custom(filter_chain))
        .opt("audio_filter", "af", Rule::Custom(filter_chain))
        .opt(
            "frame_rate",
            "r",
            Rule::Kinds(&[ValueKind::Int, ValueKind::Float]),
        )
        .option(
            OptionSpec::new("overwrite", "y", Rule::Custom(overwrite))
                .doc("Replace the destination if it exists"),
        )
});

/// Merge stream options with the nested codec and format, ordered by key.
fn stream_args(options: &Options, codec: Option<&Codec>, format: &Format) -> Vec<String> {
    let mut fragments = options.fragments();
    if let Some(codec) = codec {
        fragments.push(Fragment::new("codec", codec.to_args()));
    }
    fragments.push(Fragment::new("muxer", format.to_args()));
    assemble(fragments)
}

/// The input side of an ffmpeg invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InputStream {
    source: Source,
    platform: Platform,
    options: Options,
    decoder: Option<Codec>,
    demuxer: Format,
}

impl InputStream {
    /// Input for `source` on the current platform.
    pub fn new(source: impl Into<Source>) -> Result<Self> {
        Self::with_platform(source, Platform::current())
    }

    pub fn with_platform(source: impl Into<Source>, platform: Platform) -> Result<Self> {
        let mut stream = Self {
            source: Source::Location(String::new()),
            platform,
            options: Options::new(&INPUT_STREAM),
            decoder: Some(Codec::video_decoder()),
            demuxer: Format::demuxer(),
        };
        stream.set_source(source)?;
        Ok(stream)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The path passed after `-i`.
    pub fn path(&self) -> String {
        self.source.resolve(self.platform)
    }

    /// Change the source.
    ///
    /// A device index on Linux switches to the v4l2 device format and drops
    /// the decoder; moving away from a device restores a plain demuxer. RTSP
    /// locations force TCP transport, any other source clears it.
    pub fn set_source(&mut self, source: impl Into<Source>) -> Result<()> {
        let source = source.into();
        match (&source, self.platform) {
            (Source::Device(_), Platform::Linux) => {
                self.demuxer = Format::v4l2();
                self.decoder = None;
            }
            _ if self.demuxer.is_device() => self.demuxer = Format::demuxer(),
            _ => {}
        }

        if source.is_rtsp() {
            self.options.set("rtsp_transport", RtspTransport::Tcp)?;
        } else if self.options.is_set("rtsp_transport") {
            self.options.unset("rtsp_transport")?;
        }

        self.source = source;
        Ok(())
    }

    pub fn decoder(&self) -> Option<&Codec> {
        self.decoder.as_ref()
    }

    pub fn decoder_mut(&mut self) -> Option<&mut Codec> {
        self.decoder.as_mut()
    }

    /// Use `codec` to decode. Clears a hardware device forced by
    /// [`InputStream::set_decoder_by_name`].
    pub fn set_decoder(&mut self, codec: Codec) -> Result<()> {
        if !codec.can_decode() {
            return Err(Error::InvalidInput(format!("{codec} cannot decode")));
        }
        if self.options.is_set("hwaccel_device") {
            self.options.unset("hwaccel_device")?;
        }
        self.decoder = Some(codec);
        Ok(())
    }

    /// Select a named hardware decoder, forcing the CUDA device and
    /// dropping audio.
    pub fn set_decoder_by_name(&mut self, name: &str) -> Result<()> {
        let codec = Codec::decoder_by_name(name)?;
        self.options.set("hwaccel_device", HwAccel::Cuda)?;
        self.options.set("no_audio", Value::Switch)?;
        self.decoder = Some(codec);
        Ok(())
    }

    pub fn clear_decoder(&mut self) {
        self.decoder = None;
    }

    pub fn demuxer(&self) -> &Format {
        &self.demuxer
    }

    pub fn demuxer_mut(&mut self) -> &mut Format {
        &mut self.demuxer
    }

    pub fn set_demuxer(&mut self, format: Format) -> Result<()> {
        if !format.can_read() {
            return Err(Error::InvalidInput(format!("{format} cannot read input")));
        }
        self.demuxer = format;
        Ok(())
    }

    pub fn set_demuxer_by_name(&mut self, name: &str) -> Result<()> {
        self.set_demuxer(Format::demuxer_by_name(name)?)
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

    /// Input arguments, ending with `-i <path>`.
    pub fn build(&self) -> Vec<String> {
        let mut args = stream_args(&self.options, self.decoder.as_ref(), &self.demuxer);
        args.push("-i".to_string());
        args.push(self.path());
        args
    }
}

impl fmt::Display for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputStream({})", self.build().join(" "))
    }
}

/// One output of an ffmpeg invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputStream {
    destination: String,
    options: Options,
    encoder: Option<Codec>,
    muxer: Format,
}

impl OutputStream {
    /// Output to `destination` with a generic video encoder and muxer.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            options: Options::new(&OUTPUT_STREAM),
            encoder: Some(Codec::video_encoder()),
            muxer: Format::muxer(),
        }
    }

    /// Output to the process's standard output.
    pub fn pipe() -> Self {
        Self::new(PIPE)
    }

    /// Output with an optional encoder and muxer in place of the defaults.
    pub fn with(
        destination: impl Into<String>,
        encoder: Option<Codec>,
        muxer: Option<Format>,
    ) -> Result<Self> {
        let mut stream = Self::new(destination);
        if let Some(codec) = encoder {
            stream.set_encoder(codec)?;
        }
        if let Some(format) = muxer {
            stream.set_muxer(format)?;
        }
        Ok(stream)
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn is_pipe(&self) -> bool {
        self.destination == PIPE
    }

    pub fn encoder(&self) -> Option<&Codec> {
        self.encoder.as_ref()
    }

    pub fn encoder_mut(&mut self) -> Option<&mut Codec> {
        self.encoder.as_mut()
    }

    pub fn set_encoder(&mut self, codec: Codec) -> Result<()> {
        if !codec.can_encode() {
            return Err(Error::InvalidInput(format!("{codec} cannot encode")));
        }
        self.encoder = Some(codec);
        Ok(())
    }

    pub fn set_encoder_by_name(&mut self, name: &str) -> Result<()> {
        self.set_encoder(Codec::encoder_by_name(name)?)
    }

    /// Let ffmpeg pick the encoder.
    pub fn clear_encoder(&mut self) {
        self.encoder = None;
    }

    pub fn muxer(&self) -> &Format {
        &self.muxer
    }

    pub fn muxer_mut(&mut self) -> &mut Format {
        &mut self.muxer
    }

    pub fn set_muxer(&mut self, format: Format) -> Result<()> {
        if !format.can_write() {
            return Err(Error::InvalidInput(format!("{format} cannot write output")));
        }
        self.muxer = format;
        Ok(())
    }

    pub fn set_muxer_by_name(&mut self, name: &str) -> Result<()> {
        self.set_muxer(Format::muxer_by_name(name)?)
    }

    /// Append a filter to the video filter chain.
    pub fn add_video_filter(&mut self, filter: &str) -> Result<()> {
        let chain = match self.options.get("video_filter").and_then(Value::as_str) {
            Some(current) if self.options.is_set("video_filter") => format!("{current},{filter}"),
            _ => filter.to_string(),
        };
        self.options.set("video_filter", chain)?;
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

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Output arguments, ending with the destination.
    pub fn build(&self) -> Vec<String> {
        let mut args = stream_args(&self.options, self.encoder.as_ref(), &self.muxer);
        args.push(self.destination.clone());
        args
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputStream({})", self.build().join(" "))
    }
}
