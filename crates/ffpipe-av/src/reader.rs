//! Chunked reading from a supervised process.

use crate::process::Process;
use crate::{Error, Result};
use ffpipe_media::{ElementType, Frame};

/// Bytes per pixel of the packed RGB/BGR formats the frame reader expects.
pub const BYTES_PER_PIXEL: usize = 3;

/// Anything that yields a finite sequence of chunks.
pub trait ChunkSource {
    type Chunk;

    /// The next chunk, or `None` once the source is exhausted.
    fn read_chunk(&mut self) -> Result<Option<Self::Chunk>>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    type Chunk = S::Chunk;

    fn read_chunk(&mut self) -> Result<Option<Self::Chunk>> {
        (**self).read_chunk()
    }
}

/// Why a [`Chunks`] iterator stopped.
#[derive(Debug)]
pub enum End {
    /// The source ran out of data.
    Exhausted,
    /// Reading failed; the error is kept here instead of being yielded.
    Failed(Error),
}

/// Iterator over a [`ChunkSource`].
///
/// The iterator ends quietly on exhaustion or on the first error. Inspect
/// [`Chunks::end`] afterwards to tell the two apart. It is not restartable.
#[derive(Debug)]
pub struct Chunks<S> {
    source: S,
    end: Option<End>,
}

impl<S: ChunkSource> Chunks<S> {
    pub fn new(source: S) -> Self {
        Self { source, end: None }
    }

    /// How the iteration ended, once it has.
    pub fn end(&self) -> Option<&End> {
        self.end.as_ref()
    }

    pub fn into_end(self) -> Option<End> {
        self.end
    }
}

impl<S: ChunkSource> Iterator for Chunks<S> {
    type Item = S::Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }
        match self.source.read_chunk() {
            Ok(Some(chunk)) => Some(chunk),
            Ok(None) => {
                self.end = Some(End::Exhausted);
                None
            }
            Err(e) => {
                self.end = Some(End::Failed(e));
                None
            }
        }
    }
}

/// Fixed-size reads from a process's standard output.
#[derive(Debug)]
pub struct SizedReads<'a> {
    process: &'a mut Process,
    size: usize,
}

impl<'a> SizedReads<'a> {
    pub fn new(process: &'a mut Process, size: usize) -> Self {
        Self { process, size }
    }
}

impl ChunkSource for SizedReads<'_> {
    type Chunk = Vec<u8>;

    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        self.process.read(self.size)
    }
}

impl Process {
    /// Iterate over `size`-byte chunks of standard output.
    pub fn chunks(&mut self, size: usize) -> Chunks<SizedReads<'_>> {
        Chunks::new(SizedReads::new(self, size))
    }
}

/// Reads raw video from a process, one frame at a time.
///
/// Each read fetches exactly `width * height * 3` bytes and shapes them as
/// `(height, width, 3)`. The reader only consumes output; it cannot write.
#[derive(Debug)]
pub struct FrameReader {
    process: Process,
    width: usize,
    height: usize,
}

impl FrameReader {
    pub fn new(process: Process, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!(
                "frame size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            process,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per frame.
    pub fn chunk_size(&self) -> usize {
        self.width * self.height * BYTES_PER_PIXEL
    }

    /// The next frame, or `None` when the stream ended cleanly.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let expected = self.chunk_size();
        match self.process.read(expected)? {
            None => Ok(None),
            Some(bytes) if bytes.len() != expected => Err(Error::ShortRead {
                expected,
                actual: bytes.len(),
            }),
            Some(bytes) => Ok(Some(Frame::from_raw(
                &bytes,
                (self.height, self.width),
                ElementType::U8,
            )?)),
        }
    }

    pub fn frames(&mut self) -> Chunks<&mut Self> {
        Chunks::new(self)
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn process_mut(&mut self) -> &mut Process {
        &mut self.process
    }

    pub fn into_process(self) -> Process {
        self.process
    }

    /// Stop the process, discarding any partial frame still buffered.
    pub fn stop(&mut self) -> Result<()> {
        self.process.stop().map(drop)
    }
}

impl ChunkSource for FrameReader {
    type Chunk = Frame;

    fn read_chunk(&mut self) -> Result<Option<Frame>> {
        self.read_frame()
    }
}
