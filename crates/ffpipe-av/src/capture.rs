//! Capture front-ends built on the command builder and the probe.

use crate::catalog::PixelFormat;
use crate::codec::{Codec, Family};
use crate::ffmpeg::{Ffmpeg, FFMPEG};
use crate::format::Format;
use crate::probe::{Probe, ProbeInfo, FFPROBE};
use crate::process::ProcessState;
use crate::reader::{Chunks, FrameReader, SizedReads};
use crate::stream::{InputStream, OutputStream, Source};
use crate::{Error, Result};
use ffpipe_media::Frame;
use ffpipe_options::Value;

/// Programs used to run and probe commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            ffmpeg: FFMPEG.to_string(),
            ffprobe: FFPROBE.to_string(),
        }
    }
}

/// A source with a probe and an ffmpeg command reading from it.
#[derive(Debug)]
pub struct Capture {
    ffmpeg: Ffmpeg,
    probe: Probe,
}

impl Capture {
    /// Capture from `source`, optionally writing to `destination`.
    pub fn new(
        source: impl Into<Source>,
        destination: Option<String>,
        toolchain: &Toolchain,
    ) -> Result<Self> {
        let source = source.into();
        let input = InputStream::new(source.clone())?;
        let mut ffmpeg = Ffmpeg::with_program(&toolchain.ffmpeg, input);
        if let Some(destination) = destination {
            ffmpeg.add_output(OutputStream::new(destination))?;
        }
        let probe = Probe::with_program(&toolchain.ffprobe, source)?;
        Ok(Self { ffmpeg, probe })
    }

    pub fn ffmpeg(&self) -> &Ffmpeg {
        &self.ffmpeg
    }

    pub fn ffmpeg_mut(&mut self) -> &mut Ffmpeg {
        &mut self.ffmpeg
    }

    pub fn probe(&self) -> &Probe {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut Probe {
        &mut self.probe
    }

    /// Probe the source, once.
    pub fn read_probe(&mut self) -> Result<&ProbeInfo> {
        self.probe.info()
    }

    /// Spawn ffmpeg. Fails if a process is already attached.
    pub fn start(&mut self) -> Result<()> {
        self.ffmpeg.run().map(drop)
    }

    pub fn state(&self) -> ProcessState {
        self.ffmpeg.state()
    }

    /// Read `n` bytes of piped output.
    pub fn read(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ffmpeg
            .process_mut()
            .ok_or(Error::NoProcess)?
            .read(n)
    }

    /// Iterate over `size`-byte chunks of piped output.
    pub fn chunks(&mut self, size: usize) -> Result<Chunks<SizedReads<'_>>> {
        Ok(self
            .ffmpeg
            .process_mut()
            .ok_or(Error::NoProcess)?
            .chunks(size))
    }

    /// Point both the command and the probe at a new source.
    pub fn set_source(&mut self, source: impl Into<Source>) -> Result<()> {
        let source = source.into();
        self.ffmpeg.input_mut().set_source(source.clone())?;
        self.probe.set_source(source)
    }

    /// Stop and detach the process. Calling it again does nothing.
    pub fn release(&mut self) -> Result<()> {
        match self.ffmpeg.take_process() {
            Some(mut process) if process.state() == ProcessState::Running => {
                process.stop().map(drop)
            }
            _ => Ok(()),
        }
    }
}

/// Raw frames from a source, decoded by ffmpeg into packed pixels.
#[derive(Debug)]
pub struct VideoCapture {
    capture: Capture,
    fps: Option<f64>,
    reader: Option<FrameReader>,
}

impl VideoCapture {
    /// Capture at `fps`, or at the probed rate when `None`.
    ///
    /// The pixel format must pack three bytes per pixel.
    pub fn new(
        source: impl Into<Source>,
        fps: Option<f64>,
        pixel_format: PixelFormat,
        toolchain: &Toolchain,
    ) -> Result<Self> {
        if pixel_format.packed_bytes() != Some(crate::reader::BYTES_PER_PIXEL) {
            return Err(Error::Unsupported(format!(
                "pixel format {pixel_format} for raw frame capture"
            )));
        }

        let mut capture = Capture::new(source, None, toolchain)?;
        capture
            .ffmpeg_mut()
            .input_mut()
            .set("realtime", Value::Switch)?;

        let mut output = OutputStream::pipe();
        output.set_muxer(Format::raw_video_muxer())?;
        output.set_encoder(Codec::video_encoder())?;
        output.set("pix_fmt", pixel_format)?;
        capture.ffmpeg_mut().add_output(output)?;

        Ok(Self {
            capture,
            fps,
            reader: None,
        })
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut Capture {
        &mut self.capture
    }

    /// Probe the source, then start reading frames of the probed size.
    pub fn run(&mut self) -> Result<&mut FrameReader> {
        if self.reader.is_some() {
            return Err(Error::ProcessAttached);
        }
        let info = self.capture.read_probe()?;
        let (width, height) = info.size();
        let rate = self.fps.unwrap_or(info.r_frame_rate);

        self.capture
            .ffmpeg_mut()
            .output_mut(0)
            .ok_or(Error::NoOutputs)?
            .set("frame_rate", rate)?;
        self.capture.start()?;

        let process = self
            .capture
            .ffmpeg_mut()
            .take_process()
            .ok_or(Error::NoProcess)?;

        #[cfg(feature = "tracing")]
        tracing::info!(width, height, rate, "Capturing raw frames");

        let reader = FrameReader::new(process, width as usize, height as usize)?;
        Ok(self.reader.insert(reader))
    }

    /// The next frame, or `None` when the source ended.
    pub fn read(&mut self) -> Result<Option<Frame>> {
        self.reader
            .as_mut()
            .ok_or(Error::NoProcess)?
            .read_frame()
    }

    pub fn frames(&mut self) -> Result<Chunks<&mut FrameReader>> {
        Ok(self.reader.as_mut().ok_or(Error::NoProcess)?.frames())
    }

    /// Stop reading. Calling it again does nothing.
    pub fn release(&mut self) -> Result<()> {
        match self.reader.take() {
            Some(mut reader) if reader.process().state() == ProcessState::Running => reader.stop(),
            _ => Ok(()),
        }
    }
}

/// Copies or transcodes a source into one or more destinations.
#[derive(Debug)]
pub struct VideoWriter {
    ffmpeg: Ffmpeg,
}

impl VideoWriter {
    pub fn new(source: impl Into<Source>, toolchain: &Toolchain) -> Result<Self> {
        let input = InputStream::new(source)?;
        Ok(Self {
            ffmpeg: Ffmpeg::with_program(&toolchain.ffmpeg, input),
        })
    }

    pub fn ffmpeg(&self) -> &Ffmpeg {
        &self.ffmpeg
    }

    pub fn ffmpeg_mut(&mut self) -> &mut Ffmpeg {
        &mut self.ffmpeg
    }

    /// Add one output per destination.
    ///
    /// Without a codec ffmpeg picks one. Capture devices cannot be stream
    /// copied, so a copy codec is dropped for them.
    pub fn write<I, S>(
        &mut self,
        destinations: I,
        muxer: Option<Format>,
        codec: Option<Codec>,
        overwrite: bool,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let from_device = matches!(self.ffmpeg.input().source(), Source::Device(_));
        for destination in destinations {
            let mut output = OutputStream::new(destination);
            match &codec {
                Some(codec) if !(from_device && codec.family() == Family::Copy) => {
                    output.set_encoder(codec.clone())?;
                }
                _ => output.clear_encoder(),
            }
            if let Some(muxer) = &muxer {
                output.set_muxer(muxer.clone())?;
            }
            output.set("overwrite", overwrite)?;
            self.ffmpeg.add_output(output)?;
        }
        Ok(())
    }

    pub fn build(&self) -> Vec<String> {
        self.ffmpeg.build()
    }

    pub fn run(&mut self) -> Result<()> {
        self.ffmpeg.run().map(drop)
    }

    /// Ask ffmpeg to finish writing and exit.
    pub fn stop(&mut self) -> Result<()> {
        let mut process = self.ffmpeg.take_process().ok_or(Error::NoProcess)?;
        process.stop().map(drop)
    }
}
