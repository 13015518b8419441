//! Codec configurations.
//!
//! A [`Codec`] pairs a media kind (generic, video, audio) and a role (encode,
//! decode) with a codec family. The option table is looked up from those three
//! tags by [`schema_for`]; each table is declared once as a static.

use crate::catalog::{
    CODEC_FLAGS, CODEC_FLAGS2, CUVID_DECODERS, ERR_DETECT, ME_METHOD, NAL_HRD, NVENC_H264_PROFILES,
    NVENC_HEVC_PROFILES, NVENC_PRESETS, NVENC_RATE_CONTROL, STRICT, X26X_LEVELS, X26X_PRESETS,
    X26X_PROFILES, X26X_TUNES,
};
use crate::{Error, Result};
use ffpipe_options::{
    FlagSet, OptionSpec, Options, Outcome, ParamSet, ParamValue, Rule, Schema, Value, ValueKind,
    Verdict,
};
use std::fmt;
use std::sync::LazyLock;

/// Elementary stream kind a codec applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// No stream specifier; applies to every stream.
    Generic,
    Video,
    Audio,
}

impl MediaKind {
    /// Stream specifier appended to wire names.
    pub fn suffix(self) -> &'static str {
        match self {
            MediaKind::Generic => "",
            MediaKind::Video => ":v",
            MediaKind::Audio => ":a",
        }
    }
}

/// Whether the codec encodes or decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Encode,
    Decode,
}

/// Codec implementation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Whatever ffmpeg picks, configured through generic options.
    Generic,
    /// Stream copy; nothing can be changed.
    Copy,
    LibX264,
    LibX265,
    NvencH264,
    NvencHevc,
    /// NVIDIA hardware decoders.
    Cuvid,
}

const INTEGER: &[ValueKind] = &[ValueKind::Int];
const NUMBER: &[ValueKind] = &[ValueKind::Int, ValueKind::Float];
const BOOLEAN: &[ValueKind] = &[ValueKind::Bool];
const TEXT: &[ValueKind] = &[ValueKind::Text];

fn integer_at_least(min: f64) -> Rule {
    Rule::chain([Rule::Kinds(INTEGER), Rule::Min(min)])
}

/// Normalize a bitrate to kilobits: `2000`, `"2000k"` and `"2M"` are accepted.
fn bitrate(value: Value) -> Verdict {
    let kbps = match &value {
        Value::Int(n) => Some(*n),
        Value::Text(text) => parse_bitrate(text),
        _ => None,
    };
    match kbps {
        Some(n) if n > 0 => Verdict::Store(Value::Text(format!("{n}k"))),
        Some(n) => Verdict::reject(format!("bitrate must be positive, got {n}")),
        None => Verdict::reject(format!(
            "bitrate must look like 2000, '2000k' or '2M', got {value}"
        )),
    }
}

fn parse_bitrate(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(n);
    }
    if let Some(kilo) = text.strip_suffix('k') {
        return kilo.parse().ok();
    }
    let mega: i64 = text.strip_suffix('M')?.parse().ok()?;
    mega.checked_mul(1024)
}

/// `WxH` with both sides positive.
pub(crate) fn video_size(value: Value) -> Verdict {
    let parsed = value.as_str().and_then(|text| {
        let (w, h) = text.trim().split_once('x')?;
        Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?))
    });
    match parsed {
        Some((w, h)) if w > 0 && h > 0 => Verdict::Store(Value::Text(format!("{w}x{h}"))),
        _ => Verdict::reject(format!("expected '<width>x<height>', got {value}")),
    }
}

/// `TOPxBOTTOMxLEFTxRIGHT` crop margins.
fn crop(value: Value) -> Verdict {
    let valid = value.as_str().is_some_and(|text| {
        let parts: Vec<&str> = text.split('x').collect();
        parts.len() == 4 && parts.iter().all(|p| p.parse::<u32>().is_ok())
    });
    if valid {
        Verdict::Store(value)
    } else {
        Verdict::reject(format!("expected '<top>x<bottom>x<left>x<right>', got {value}"))
    }
}

static CODING: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("coding")
        .option(
            OptionSpec::new("strict", "strict", Rule::OneOf(STRICT))
                .doc("How strictly to follow the standards"),
        )
        .option(
            OptionSpec::new("flags", "flags", Rule::Flags(CODEC_FLAGS))
                .with_default(FlagSet::with_allowed(CODEC_FLAGS))
                .doc("Generic codec flags"),
        )
        .option(
            OptionSpec::new("flags2", "flags2", Rule::Flags(CODEC_FLAGS2))
                .with_default(FlagSet::with_allowed(CODEC_FLAGS2)),
        )
        .option(
            OptionSpec::new("threads", "threads", integer_at_least(0.0))
                .doc("Worker threads; 0 lets the codec decide"),
        )
});

static DECODING: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("decoding")
        .inherit(&CODING)
        .option(OptionSpec::new("codec", "c", Rule::Any).read_only())
        .option(
            OptionSpec::new("lowres", "lowres", integer_at_least(0.0))
                .doc("Decode at 1/2, 1/4 or 1/8 resolution"),
        )
        .option(
            OptionSpec::new("err_detect", "err_detect", Rule::Flags(ERR_DETECT))
                .with_default(FlagSet::with_allowed(ERR_DETECT)),
        )
});

static ENCODING: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("encoding")
        .inherit(&CODING)
        .option(OptionSpec::new("codec", "c", Rule::Any).read_only())
        .option(OptionSpec::new("bitrate", "b", Rule::Custom(bitrate)).doc("Average bitrate"))
        .option(
            OptionSpec::new("maxrate", "maxrate", Rule::Custom(bitrate))
                .doc("Maximum bitrate; needs bufsize"),
        )
        .opt("minrate", "minrate", Rule::Custom(bitrate))
        .opt("bufsize", "bufsize", Rule::Custom(bitrate))
        .opt("profile", "profile", Rule::Kinds(INTEGER))
        .opt("level", "level", Rule::Kinds(INTEGER))
        .opt("compression_level", "compression_level", Rule::Kinds(INTEGER))
        .option(
            OptionSpec::new("me_method", "me_method", Rule::Flags(ME_METHOD))
                .with_default(FlagSet::with_allowed(ME_METHOD)),
        )
});

static VIDEO_DECODING: LazyLock<Schema> =
    LazyLock::new(|| Schema::new("video-decoding").inherit_suffixed(&DECODING, ":v"));

static AUDIO_DECODING: LazyLock<Schema> =
    LazyLock::new(|| Schema::new("audio-decoding").inherit_suffixed(&DECODING, ":a"));

static AUDIO_ENCODING: LazyLock<Schema> =
    LazyLock::new(|| Schema::new("audio-encoding").inherit_suffixed(&ENCODING, ":a"));

static VIDEO_ENCODING: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("video-encoding")
        .inherit_suffixed(&ENCODING, ":v")
        .option(OptionSpec::new("gop_size", "g", integer_at_least(0.0)).doc("GOP size"))
        .opt("keyint_min", "keyint_min", Rule::Kinds(INTEGER))
        .opt("refs", "refs", Rule::Kinds(INTEGER))
        .opt("brd_scale", "brd_scale", Rule::Range { min: 0.0, max: 3.0 })
        .opt("chroma_offset", "chromaoffset", Rule::Kinds(INTEGER))
        .opt("mv0_threshold", "mv0_threshold", Rule::Min(0.0))
        .opt("b_sensitivity", "b_sensitivity", Rule::Min(1.0))
        .opt("timecode_frame_start", "timecode_frame_start", Rule::Min(-1.0))
});

fn copy_of(name: &'static str, parent_decoding: &Schema, parent_encoding: &Schema) -> Schema {
    Schema::new(name)
        .inherit(parent_decoding)
        .inherit(parent_encoding)
        .narrow("codec", Rule::OneOf(&["copy"]), Some(Value::from("copy")))
        .frozen()
}

static COPY: LazyLock<Schema> = LazyLock::new(|| copy_of("copy", &DECODING, &ENCODING));

static VIDEO_COPY: LazyLock<Schema> =
    LazyLock::new(|| copy_of("video-copy", &VIDEO_DECODING, &VIDEO_ENCODING));

static AUDIO_COPY: LazyLock<Schema> =
    LazyLock::new(|| copy_of("audio-copy", &AUDIO_DECODING, &AUDIO_ENCODING));

static LIBX: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("libx")
        .inherit(&VIDEO_ENCODING)
        .narrow("codec", Rule::OneOf(&["libx264", "libx265"]), None)
        .opt("preset", "preset", Rule::OneOf(X26X_PRESETS))
        .opt("tune", "tune", Rule::OneOf(X26X_TUNES))
        .narrow("profile", Rule::OneOf(X26X_PROFILES), None)
        .narrow("level", Rule::OneOf(X26X_LEVELS), None)
        .option(
            OptionSpec::new("crf", "crf", Rule::Range { min: 0.0, max: 51.0 })
                .doc("Constant rate factor; 0 is lossless"),
        )
        .opt("crf_max", "crf_max", Rule::Range { min: 0.0, max: 51.0 })
        .opt("qp", "qp", Rule::Kinds(NUMBER))
        .opt("qmin", "qmin", Rule::Kinds(NUMBER))
        .opt("qmax", "qmax", Rule::Kinds(NUMBER))
        .opt("qdiff", "qdiff", Rule::Kinds(NUMBER))
        .opt("qblur", "qblur", Rule::Kinds(NUMBER))
        .opt("qcomp", "qcomp", Rule::Kinds(NUMBER))
        .narrow("refs", Rule::Range { min: 1.0, max: 16.0 }, None)
        .opt("rc_lookahead", "rc-lookahead", Rule::Kinds(INTEGER))
});

static LIBX264: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("libx264")
        .inherit(&LIBX)
        .narrow("codec", Rule::OneOf(&["libx264"]), Some(Value::from("libx264")))
        .option(
            OptionSpec::new("x264opts", "x264opts", Rule::Params)
                .with_default(ParamSet::new())
                .doc("Raw x264 options"),
        )
        .opt("nal_hrd", "nal-hrd", Rule::OneOf(NAL_HRD))
});

static LIBX265: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("libx265")
        .inherit(&LIBX)
        .narrow("codec", Rule::OneOf(&["libx265"]), Some(Value::from("libx265")))
        .option(
            OptionSpec::new("x265_params", "x265-params", Rule::Params)
                .with_default(ParamSet::new())
                .doc("Raw x265 options"),
        )
});

static NVENC: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("nvenc")
        .inherit(&LIBX)
        .narrow("codec", Rule::OneOf(&["h264_nvenc", "hevc_nvenc"]), None)
        .narrow("preset", Rule::OneOf(NVENC_PRESETS), None)
        .opt("rc", "rc", Rule::OneOf(NVENC_RATE_CONTROL))
        .option(
            OptionSpec::new("gpu", "gpu", integer_at_least(-1.0))
                .doc("GPU index; -1 picks any"),
        )
        .opt("cq", "cq", Rule::Range { min: 0.0, max: 51.0 })
        .opt("strict_gop", "strict_gop", Rule::Kinds(BOOLEAN))
        .opt("zerolatency", "zerolatency", Rule::Kinds(BOOLEAN))
        .opt("cbr", "cbr", Rule::Kinds(BOOLEAN))
        .opt("two_pass", "2pass", Rule::Kinds(BOOLEAN))
});

static NVENC_H264: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("h264_nvenc")
        .inherit(&NVENC)
        .narrow("codec", Rule::OneOf(&["h264_nvenc"]), Some(Value::from("h264_nvenc")))
        .narrow("profile", Rule::OneOf(NVENC_H264_PROFILES), None)
});

static NVENC_HEVC: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("hevc_nvenc")
        .inherit(&NVENC)
        .narrow("codec", Rule::OneOf(&["hevc_nvenc"]), Some(Value::from("hevc_nvenc")))
        .narrow("profile", Rule::OneOf(NVENC_HEVC_PROFILES), None)
});

static CUVID: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("cuvid")
        .inherit(&VIDEO_DECODING)
        .narrow("codec", Rule::OneOf(CUVID_DECODERS), None)
        .opt("gpu", "gpu", integer_at_least(-1.0))
        .opt("surfaces", "surfaces", integer_at_least(0.0))
        .option(
            OptionSpec::new("resize", "resize", Rule::Custom(video_size))
                .doc("Resize on the GPU, as WxH"),
        )
        .opt("crop", "crop", Rule::chain([Rule::Kinds(TEXT), Rule::Custom(crop)]))
});

/// The option table for a codec variant.
pub fn schema_for(kind: MediaKind, role: Role, family: Family) -> Result<&'static Schema> {
    let schema: &'static Schema = match (family, kind, role) {
        (Family::Generic, MediaKind::Generic, Role::Encode) => &ENCODING,
        (Family::Generic, MediaKind::Generic, Role::Decode) => &DECODING,
        (Family::Generic, MediaKind::Video, Role::Encode) => &VIDEO_ENCODING,
        (Family::Generic, MediaKind::Video, Role::Decode) => &VIDEO_DECODING,
        (Family::Generic, MediaKind::Audio, Role::Encode) => &AUDIO_ENCODING,
        (Family::Generic, MediaKind::Audio, Role::Decode) => &AUDIO_DECODING,
        (Family::Copy, MediaKind::Generic, _) => &COPY,
        (Family::Copy, MediaKind::Video, _) => &VIDEO_COPY,
        (Family::Copy, MediaKind::Audio, _) => &AUDIO_COPY,
        (Family::LibX264, MediaKind::Video, Role::Encode) => &LIBX264,
        (Family::LibX265, MediaKind::Video, Role::Encode) => &LIBX265,
        (Family::NvencH264, MediaKind::Video, Role::Encode) => &NVENC_H264,
        (Family::NvencHevc, MediaKind::Video, Role::Encode) => &NVENC_HEVC,
        (Family::Cuvid, MediaKind::Video, Role::Decode) => &CUVID,
        _ => {
            return Err(Error::Unsupported(format!(
                "{family:?} codec cannot {role:?} {kind:?} streams"
            )))
        }
    };
    Ok(schema)
}

/// An encoder or decoder configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Codec {
    kind: MediaKind,
    role: Role,
    family: Family,
    options: Options,
}

impl Codec {
    /// Create a codec with default options.
    pub fn new(kind: MediaKind, role: Role, family: Family) -> Result<Self> {
        let schema = schema_for(kind, role, family)?;
        Ok(Self {
            kind,
            role,
            family,
            options: Options::new(schema),
        })
    }

    fn known(kind: MediaKind, role: Role, family: Family, schema: &'static Schema) -> Self {
        Self {
            kind,
            role,
            family,
            options: Options::new(schema),
        }
    }

    /// Generic video encoder.
    pub fn video_encoder() -> Self {
        Self::known(MediaKind::Video, Role::Encode, Family::Generic, &VIDEO_ENCODING)
    }

    /// Generic video decoder.
    pub fn video_decoder() -> Self {
        Self::known(MediaKind::Video, Role::Decode, Family::Generic, &VIDEO_DECODING)
    }

    /// Generic audio encoder.
    pub fn audio_encoder() -> Self {
        Self::known(MediaKind::Audio, Role::Encode, Family::Generic, &AUDIO_ENCODING)
    }

    /// Generic audio decoder.
    pub fn audio_decoder() -> Self {
        Self::known(MediaKind::Audio, Role::Decode, Family::Generic, &AUDIO_DECODING)
    }

    /// Stream copy of every stream (`-c copy`).
    pub fn copy() -> Self {
        Self::known(MediaKind::Generic, Role::Encode, Family::Copy, &COPY)
    }

    pub fn libx264() -> Self {
        Self::known(MediaKind::Video, Role::Encode, Family::LibX264, &LIBX264)
    }

    pub fn libx265() -> Self {
        Self::known(MediaKind::Video, Role::Encode, Family::LibX265, &LIBX265)
    }

    pub fn h264_nvenc() -> Self {
        Self::known(MediaKind::Video, Role::Encode, Family::NvencH264, &NVENC_H264)
    }

    pub fn hevc_nvenc() -> Self {
        Self::known(MediaKind::Video, Role::Encode, Family::NvencHevc, &NVENC_HEVC)
    }

    /// NVIDIA hardware decoder, `h264_cuvid` or `hevc_cuvid`.
    pub fn cuvid(name: &str) -> Result<Self> {
        let mut codec = Self::known(MediaKind::Video, Role::Decode, Family::Cuvid, &CUVID);
        codec.set("codec", name)?;
        Ok(codec)
    }

    /// Look up an encoder by its ffmpeg name.
    pub fn encoder_by_name(name: &str) -> Result<Self> {
        match name {
            "libx264" => Ok(Self::libx264()),
            "libx265" => Ok(Self::libx265()),
            "h264_nvenc" => Ok(Self::h264_nvenc()),
            "hevc_nvenc" => Ok(Self::hevc_nvenc()),
            "copy" => Ok(Self::copy()),
            other => Err(Error::Unsupported(format!("encoder '{other}'"))),
        }
    }

    /// Look up a decoder by its ffmpeg name.
    pub fn decoder_by_name(name: &str) -> Result<Self> {
        match name {
            "copy" => Ok(Self::copy()),
            cuvid if CUVID_DECODERS.contains(&cuvid) => Self::cuvid(cuvid),
            other => Err(Error::Unsupported(format!("decoder '{other}'"))),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Whether the codec may sit on an output stream.
    pub fn can_encode(&self) -> bool {
        self.role == Role::Encode || self.family == Family::Copy
    }

    /// Whether the codec may sit on an input stream.
    pub fn can_decode(&self) -> bool {
        self.role == Role::Decode || self.family == Family::Copy
    }

    /// The selected codec name, if any.
    pub fn name(&self) -> Option<&str> {
        self.options.get("codec").and_then(Value::as_str)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Validate and store one option.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Outcome> {
        Ok(self.options.set(key, value)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Key of the raw parameter option (`x264opts`, `x265_params`), if the
    /// codec has one.
    pub fn params_key(&self) -> Option<&'static str> {
        self.options
            .schema()
            .specs()
            .find(|spec| matches!(spec.rule, Rule::Params))
            .map(|spec| spec.key)
    }

    /// Set one entry of the raw parameter option, replacing an existing one.
    pub fn add_param(&mut self, key: &str, value: impl Into<ParamValue>) -> Result<()> {
        let option = self
            .params_key()
            .ok_or_else(|| Error::Unsupported(format!("{self} takes no raw parameters")))?;
        let mut params = self
            .get(option)
            .and_then(Value::as_params)
            .cloned()
            .unwrap_or_default();
        params.insert(key, value);
        self.set(option, params)?;
        Ok(())
    }

    /// Arguments for this codec, ordered by wire name.
    pub fn to_args(&self) -> Vec<String> {
        self.options.to_ordered_args()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_libx264_defaults() {
        let codec = Codec::libx264();
        assert_eq!(codec.name(), Some("libx264"));
        assert_eq!(codec.to_args(), ["-c:v", "libx264"]);
    }

    #[test]
    fn test_video_options_are_suffixed() {
        let mut codec = Codec::libx264();
        codec.set("bitrate", "2M").unwrap();
        codec.set("crf", 23).unwrap();
        codec.set("preset", "fast").unwrap();
        assert_eq!(
            codec.to_args(),
            ["-b:v", "2048k", "-c:v", "libx264", "-crf", "23", "-preset", "fast"]
        );
    }

    #[test]
    fn test_audio_encoder_suffix() {
        let mut codec = Codec::audio_encoder();
        codec.set("bitrate", 128).unwrap();
        assert_eq!(codec.to_args(), ["-b:a", "128k"]);
    }

    #[test]
    fn test_bitrate_normalization() {
        let mut codec = Codec::video_encoder();
        for (input, expected) in [("2000k", "2000k"), ("3M", "3072k"), ("500", "500k")] {
            codec.set("bitrate", input).unwrap();
            assert_eq!(codec.get("bitrate"), Some(&Value::from(expected)));
        }
        assert!(codec.set("bitrate", 0).is_err());
        assert!(codec.set("bitrate", "-5k").is_err());
        assert!(codec.set("bitrate", "fast").is_err());
        assert!(codec.set("bitrate", 2.5).is_err());
        assert_eq!(codec.get("bitrate"), Some(&Value::from("500k")));
    }

    #[test]
    fn test_copy_is_frozen() {
        let mut codec = Codec::copy();
        assert_eq!(codec.name(), Some("copy"));
        assert_matches!(
            codec.set("codec", "libx264"),
            Err(Error::Option(ffpipe_options::Error::ReadOnly { .. }))
        );
        assert!(codec.set("threads", 4).is_err());
        assert!(codec.set("bitrate", "1M").is_err());
        assert_eq!(codec.name(), Some("copy"));
        assert_eq!(codec.to_args(), ["-c", "copy"]);
        assert!(codec.can_encode() && codec.can_decode());
    }

    #[test]
    fn test_generic_codec_name_is_read_only() {
        let mut codec = Codec::video_encoder();
        assert!(codec.set("codec", "libx264").is_err());
        assert!(codec.to_args().is_empty());
    }

    #[test]
    fn test_libx_ranges() {
        let mut codec = Codec::libx265();
        assert!(codec.set("crf", 52).is_err());
        assert!(codec.set("refs", 0).is_err());
        codec.set("refs", 16).unwrap();
        assert!(codec.set("preset", "hq").is_err());
        codec.set("x265_params", "keyint=60:min-keyint=30").unwrap();
        assert_eq!(
            codec.to_args(),
            ["-c:v", "libx265", "-refs", "16", "-x265-params", "keyint=60:min-keyint=30"]
        );
    }

    #[test]
    fn test_add_param_merges_into_raw_params() {
        let mut codec = Codec::libx264();
        assert_eq!(codec.params_key(), Some("x264opts"));
        codec.set("x264opts", "keyint=60").unwrap();
        codec.add_param("log-level", "warning").unwrap();
        codec.add_param("keyint", 30).unwrap();
        assert_eq!(
            codec.to_args(),
            ["-c:v", "libx264", "-x264opts", "keyint=30:log-level=warning"]
        );

        let mut nvenc = Codec::h264_nvenc();
        assert_eq!(nvenc.params_key(), None);
        assert_matches!(nvenc.add_param("log-level", "error"), Err(Error::Unsupported(_)));
    }

    #[test]
    fn test_nvenc_profiles_are_family_specific() {
        let mut h264 = Codec::h264_nvenc();
        let mut hevc = Codec::hevc_nvenc();
        h264.set("profile", "high").unwrap();
        assert!(hevc.set("profile", "high").is_err());
        hevc.set("profile", "main10").unwrap();
        hevc.set("preset", "llhq").unwrap();
        hevc.set("two_pass", true).unwrap();
        assert_eq!(
            hevc.to_args(),
            ["-2pass", "1", "-c:v", "hevc_nvenc", "-preset", "llhq", "-profile:v", "main10"]
        );
        assert!(h264.set("gpu", -2).is_err());
        h264.set("gpu", 0).unwrap();
    }

    #[test]
    fn test_flags_default_empty_and_validated() {
        let mut codec = Codec::video_decoder();
        assert!(codec.set("flags", "+bogus").is_err());
        codec.set("flags", "+low_delay").unwrap();
        assert_eq!(codec.to_args(), ["-flags:v", "+low_delay"]);
    }

    #[test]
    fn test_strict_accepts_names_and_numbers() {
        let mut codec = Codec::video_encoder();
        codec.set("strict", "experimental").unwrap();
        codec.set("strict", -2).unwrap();
        assert!(codec.set("strict", 3).is_err());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Codec::encoder_by_name("libx265").unwrap().family(), Family::LibX265);
        assert_eq!(Codec::decoder_by_name("hevc_cuvid").unwrap().name(), Some("hevc_cuvid"));
        assert_matches!(Codec::encoder_by_name("vp9"), Err(Error::Unsupported(_)));
        assert_matches!(Codec::decoder_by_name("libx264"), Err(Error::Unsupported(_)));
    }

    #[test]
    fn test_cuvid_options() {
        let mut codec = Codec::cuvid("h264_cuvid").unwrap();
        codec.set("resize", "1280x720").unwrap();
        codec.set("crop", "0x0x10x10").unwrap();
        assert!(codec.set("resize", "1280").is_err());
        assert!(codec.set("crop", "1x2x3").is_err());
        assert_eq!(
            codec.to_args(),
            ["-c:v", "h264_cuvid", "-crop", "0x0x10x10", "-resize", "1280x720"]
        );
    }

    #[test]
    fn test_schema_for_rejects_impossible_combinations() {
        assert!(schema_for(MediaKind::Audio, Role::Encode, Family::LibX264).is_err());
        assert!(schema_for(MediaKind::Video, Role::Encode, Family::Cuvid).is_err());
        assert!(Codec::new(MediaKind::Video, Role::Decode, Family::Copy).is_ok());
    }
}
