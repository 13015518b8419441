//! # ffpipe-av
//!
//! Typed ffmpeg command building and subprocess supervision.
//!
//! This crate provides functionality for:
//! - Describing inputs and outputs with validated codec, format and stream options
//! - Building deterministic ffmpeg argument vectors
//! - Running ffmpeg and reading its piped output as raw chunks or video frames
//! - Probing sources with ffprobe
//! - Detecting the installed tools and their capabilities
//!
//! ## Features
//!
//! - `tracing` - Log spawned commands and process lifecycle through `tracing`
//!
//! ## Example
//!
//! ```no_run
//! use ffpipe_av::{Codec, Ffmpeg, InputStream, OutputStream};
//!
//! let mut output = OutputStream::new("out.mp4");
//! output.set_encoder(Codec::libx264())?;
//! output.set("duration", 10)?;
//!
//! let mut ffmpeg = Ffmpeg::new(InputStream::new("rtsp://camera/stream")?);
//! ffmpeg.add_output(output)?;
//! ffmpeg.run_to_completion()?;
//! # Ok::<(), ffpipe_av::Error>(())
//! ```

pub mod capture;
pub mod catalog;
pub mod codec;
mod error;
pub mod ffmpeg;
pub mod format;
pub mod nonblock;
pub mod probe;
pub mod process;
pub mod reader;
pub mod stream;
pub mod tools;

// Re-exports
pub use capture::{Capture, Toolchain, VideoCapture, VideoWriter};
pub use catalog::{FormatName, HwAccel, LogLevel, PixelFormat, RtspTransport, VSync};
pub use codec::{Codec, Family, MediaKind, Role};
pub use error::{Error, Result};
pub use ffmpeg::Ffmpeg;
pub use format::{Direction, Format, FormatFamily};
pub use nonblock::NonBlocking;
pub use probe::{Probe, ProbeInfo};
pub use process::{Process, ProcessState};
pub use reader::{ChunkSource, Chunks, End, FrameReader};
pub use stream::{InputStream, OutputStream, Platform, Source, PIPE};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};
