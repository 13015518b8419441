//! Named values accepted by ffmpeg options.
//!
//! Each catalog enum renders to the exact token ffmpeg expects and exposes
//! its full vocabulary as `NAMES`, which the option schemas use as
//! allow-lists.

use crate::Error;
use ffpipe_options::Value;
use std::fmt;
use std::str::FromStr;

/// Generate a closed set of ffmpeg tokens.
///
/// The macro produces an enum with:
/// - `as_str()` returning the ffmpeg token
/// - `ALL` and `NAMES` listing every variant
/// - `Display` and `FromStr` over the token
/// - `From<_> for Value` so variants can be assigned to options directly
macro_rules! catalog {
    ($(#[doc = $doc:expr])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Every token, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($token),+];

            /// The token passed to ffmpeg.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(Error::Unsupported(format!(
                        "{} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl From<$name> for Value {
            fn from(value: $name) -> Self {
                Value::Text(value.as_str().to_string())
            }
        }
    };
}

catalog! {
    /// Logging verbosity of ffmpeg and ffprobe.
    LogLevel {
        Quiet => "quiet",
        Panic => "panic",
        Fatal => "fatal",
        Error => "error",
        Warning => "warning",
        Info => "info",
        Verbose => "verbose",
        Debug => "debug",
        Trace => "trace",
    }
}

catalog! {
    /// Lower transport used for RTSP sources.
    RtspTransport {
        Tcp => "tcp",
        Udp => "udp",
    }
}

catalog! {
    /// Video sync method.
    VSync {
        Passthrough => "passthrough",
        Cfr => "cfr",
        Vfr => "vfr",
        Drop => "drop",
        Auto => "auto",
    }
}

catalog! {
    /// Hardware acceleration backends.
    HwAccel {
        Auto => "auto",
        Cuvid => "cuvid",
        Cuda => "cuda",
        Vaapi => "vaapi",
        Dxva2 => "dxva2",
        Drm => "drm",
    }
}

catalog! {
    /// Pixel formats for raw video.
    PixelFormat {
        Gray => "gray",
        Rgb24 => "rgb24",
        Rgb8 => "rgb8",
        Bgr24 => "bgr24",
        Yuv410p => "yuv410p",
        Yuv420p => "yuv420p",
        Yuvj420p => "yuvj420p",
        Yuv422p => "yuv422p",
        Yuyv422 => "yuyv422",
        Yuv444p => "yuv444p",
        Yuvj444p => "yuvj444p",
        Nv12 => "nv12",
        Nv16 => "nv16",
        Nv24 => "nv24",
    }
}

catalog! {
    /// Container and device formats.
    FormatName {
        V4l2 => "v4l2",
        Dshow => "dshow",
        AvFoundation => "avfoundation",
        RawVideo => "rawvideo",
        Mp4 => "mp4",
        Segment => "segment",
        MpegTs => "mpegts",
        H264 => "h264",
        Hevc => "hevc",
        Mov => "mov",
    }
}

impl PixelFormat {
    /// Bytes per pixel for packed formats, `None` for planar ones.
    pub fn packed_bytes(self) -> Option<usize> {
        match self {
            PixelFormat::Gray | PixelFormat::Rgb8 => Some(1),
            PixelFormat::Yuyv422 => Some(2),
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => Some(3),
            _ => None,
        }
    }
}

/// Generic codec `flags`.
pub const CODEC_FLAGS: &[&str] = &[
    "mv4",
    "qpel",
    "loop",
    "qscale",
    "pass1",
    "pass2",
    "gray",
    "emu_edge",
    "psnr",
    "truncated",
    "drop_changed",
    "ildct",
    "low_delay",
    "global_header",
    "bitexact",
    "aic",
    "cbp",
    "qprd",
    "ilme",
    "cgop",
    "output_corrupt",
];

/// Generic codec `flags2`.
pub const CODEC_FLAGS2: &[&str] = &[
    "fast",
    "noout",
    "ignorecrop",
    "local_header",
    "chunks",
    "showall",
    "export_mvs",
    "skip_manual",
    "ass_ro_flush_noop",
];

/// Decoder `err_detect` flags.
pub const ERR_DETECT: &[&str] = &[
    "crccheck",
    "bitstream",
    "buffer",
    "explode",
    "ignore_err",
    "careful",
    "compliant",
    "aggressive",
];

/// Motion estimation methods.
pub const ME_METHOD: &[&str] = &[
    "zero", "full", "epzs", "esa", "tesa", "dia", "log", "phods", "x1", "hex", "umh", "iter",
];

/// Standards compliance, by name or number.
pub const STRICT: &[&str] = &[
    "very",
    "strict",
    "normal",
    "unofficial",
    "experimental",
    "-2",
    "-1",
    "0",
    "1",
    "2",
];

/// x264/x265 presets.
pub const X26X_PRESETS: &[&str] = &[
    "placebo",
    "veryslow",
    "slower",
    "slow",
    "medium",
    "fast",
    "faster",
    "veryfast",
    "superfast",
    "ultrafast",
];

/// x264/x265 tunes.
pub const X26X_TUNES: &[&str] = &[
    "film",
    "stillimage",
    "fastdecode",
    "psnr",
    "ssim",
    "grain",
    "zerolatency",
    "animation",
];

/// x264/x265 profiles.
pub const X26X_PROFILES: &[&str] = &[
    "baseline", "main", "high", "high10", "high422", "high444", "main10", "main12",
];

/// Codec levels (H.264 Annex A).
pub const X26X_LEVELS: &[&str] = &[
    "1", "1b", "1.1", "1.2", "1.3", "2", "2.1", "2.2", "3", "3.1", "3.2", "4", "4.1", "4.2", "5",
    "5.1", "5.2", "6", "6.1", "6.2",
];

/// x264 `nal-hrd` signalling.
pub const NAL_HRD: &[&str] = &["none", "vbr", "cbr"];

/// NVENC presets.
pub const NVENC_PRESETS: &[&str] = &[
    "slow",
    "medium",
    "fast",
    "hp",
    "hq",
    "bd",
    "ll",
    "llhq",
    "llhp",
    "lossless",
    "losslesshp",
];

/// NVENC rate-control modes.
pub const NVENC_RATE_CONTROL: &[&str] = &[
    "constqp",
    "vbr",
    "cbr",
    "vbr_minqp",
    "ll_2pass_quality",
    "ll_2pass_size",
    "cbr_ld_hq",
    "cbr_hq",
    "vbr_hq",
];

/// NVENC H.264 profiles.
pub const NVENC_H264_PROFILES: &[&str] = &["baseline", "main", "high", "high444p"];

/// NVENC HEVC profiles.
pub const NVENC_HEVC_PROFILES: &[&str] = &["main", "main10", "rext"];

/// Muxer `fflags`.
pub const MUXER_FFLAGS: &[&str] = &["flush_packets", "latm", "bitexact", "shortest", "autobsf"];

/// Demuxer `fflags`.
pub const DEMUXER_FFLAGS: &[&str] = &[
    "ignidx",
    "genpts",
    "nofillin",
    "noparse",
    "discardcorrupt",
    "sortdts",
    "keepside",
    "fastseek",
    "nobuffer",
];

/// MOV/MP4 muxer `movflags`.
pub const MOVFLAGS: &[&str] = &[
    "rtphint",
    "empty_moov",
    "frag_keyframe",
    "frag_every_frame",
    "separate_moof",
    "isml",
    "faststart",
    "omit_tfhd_offset",
    "disable_chpl",
    "dash",
    "cmaf",
    "frag_discont",
    "delay_moov",
    "global_sidx",
    "skip_sidx",
    "write_colr",
    "prefer_icc",
    "write_gama",
    "use_metadata_tags",
    "skip_trailer",
    "negative_cts_offsets",
];

/// CUDA decoders.
pub const CUVID_DECODERS: &[&str] = &["h264_cuvid", "hevc_cuvid"];

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_tokens_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), *level);
        }
        assert_eq!(LogLevel::NAMES.len(), LogLevel::ALL.len());
    }

    #[test]
    fn test_unknown_token() {
        assert_matches!("sctp".parse::<RtspTransport>(), Err(Error::Unsupported(_)));
    }

    #[test]
    fn test_into_value() {
        assert_eq!(Value::from(PixelFormat::Bgr24), Value::from("bgr24"));
        assert_eq!(HwAccel::Cuda.to_string(), "cuda");
    }

    #[test]
    fn test_packed_bytes() {
        assert_eq!(PixelFormat::Bgr24.packed_bytes(), Some(3));
        assert_eq!(PixelFormat::Yuv420p.packed_bytes(), None);
    }
}
