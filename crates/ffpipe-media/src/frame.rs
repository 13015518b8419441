//! The frame value object.

use crate::array::{ElementType, PixelArray};
use crate::codec::{self, ImageEncoding};
use crate::{Error, Result};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Backing store of a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameData {
    /// Decoded pixels.
    Array(PixelArray),
    /// An opaque buffer, typically compressed media.
    Buffer(Vec<u8>),
}

/// One unit of raw pixel data, or an opaque buffer standing in for one.
///
/// Equality compares content: two array frames are equal when shape,
/// element type and pixels match.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: FrameData,
}

impl Frame {
    /// Reshape raw bytes into `(dims.0, dims.1, channels)`.
    ///
    /// The channel count is inferred from the byte length and must be 3 or 4.
    pub fn from_raw(bytes: &[u8], dims: (usize, usize), dtype: ElementType) -> Result<Self> {
        let plane = dims
            .0
            .checked_mul(dims.1)
            .and_then(|pixels| pixels.checked_mul(dtype.size()))
            .ok_or_else(|| Error::invalid_shape(format!("{}x{} overflows", dims.0, dims.1)))?;
        if plane == 0 || bytes.len() % plane != 0 {
            return Err(Error::invalid_shape(format!(
                "{} bytes do not split into {}x{} {} pixels",
                bytes.len(),
                dims.0,
                dims.1,
                dtype
            )));
        }
        let channels = bytes.len() / plane;
        if !matches!(channels, 3 | 4) {
            return Err(Error::invalid_shape(format!(
                "expected 3 or 4 channels, got {channels}"
            )));
        }
        let array = PixelArray::new([dims.0, dims.1, channels], dtype, bytes.to_vec())?;
        Ok(Self::from(array))
    }

    /// Copy an existing array.
    pub fn from_array(array: &PixelArray) -> Self {
        Self::from(array.clone())
    }

    /// Wrap an opaque buffer without interpreting it.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: FrameData::Buffer(bytes.into()),
        }
    }

    /// Interpret a serialized buffer.
    ///
    /// Tries an image decode, then a compressed array, then a compressed
    /// blob; the first that succeeds wins.
    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        if let Ok(array) = codec::decode_image(buf) {
            return Ok(Self::from(array));
        }
        if let Ok(array) = codec::decompress_array(buf) {
            return Ok(Self::from(array));
        }
        if let Ok(bytes) = codec::decompress(buf) {
            return Ok(Self::from_bytes(bytes));
        }
        Err(Error::Uninterpretable)
    }

    /// Serialize the frame.
    ///
    /// 8-bit arrays become PNG, other arrays a compressed array, and opaque
    /// buffers a compressed blob. [`Frame::from_buffer`] reverses each.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match &self.data {
            FrameData::Array(array) if array.dtype() == ElementType::U8 => {
                codec::encode_image(array, ImageEncoding::Png, codec::DEFAULT_QUALITY)
            }
            FrameData::Array(array) => codec::compress_array(array),
            FrameData::Buffer(bytes) => codec::compress(bytes),
        }
    }

    /// Encode an 8-bit frame as an image file.
    pub fn encode(&self, encoding: ImageEncoding, quality: u8) -> Result<Vec<u8>> {
        match &self.data {
            FrameData::Array(array) => codec::encode_image(array, encoding, quality),
            FrameData::Buffer(_) => Err(Error::Unsupported(
                "cannot image-encode an opaque buffer".to_string(),
            )),
        }
    }

    /// Decode image file bytes into pixels.
    pub fn decode(buf: &[u8]) -> Result<PixelArray> {
        codec::decode_image(buf)
    }

    /// Write the frame to `path`.
    ///
    /// 8-bit arrays are image-encoded; anything else is written as
    /// [`Frame::to_bytes`]. An existing file is only replaced when
    /// `overwrite` is set.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        encoding: ImageEncoding,
        quality: u8,
        overwrite: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        let bytes = match &self.data {
            FrameData::Array(array) if array.dtype() == ElementType::U8 => {
                codec::encode_image(array, encoding, quality)?
            }
            _ => self.to_bytes()?,
        };

        let mut file = if overwrite {
            fs::File::create(path)?
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => Error::FileExists {
                        path: path.to_path_buf(),
                    },
                    _ => Error::Io(e),
                })?
        };
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Read and interpret a file written by [`Frame::save`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_buffer(&fs::read(path)?)
    }

    /// Array shape, or the buffer length for opaque frames.
    pub fn size(&self) -> Vec<usize> {
        match &self.data {
            FrameData::Array(array) => array.shape().to_vec(),
            FrameData::Buffer(bytes) => vec![bytes.len()],
        }
    }

    pub fn as_array(&self) -> Option<&PixelArray> {
        match &self.data {
            FrameData::Array(array) => Some(array),
            FrameData::Buffer(_) => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&[u8]> {
        match &self.data {
            FrameData::Array(_) => None,
            FrameData::Buffer(bytes) => Some(bytes),
        }
    }

    pub fn data(&self) -> &FrameData {
        &self.data
    }

    pub fn into_data(self) -> FrameData {
        self.data
    }
}

impl From<PixelArray> for Frame {
    fn from(array: PixelArray) -> Self {
        Self {
            data: FrameData::Array(array),
        }
    }
}

impl PartialEq<PixelArray> for Frame {
    fn eq(&self, other: &PixelArray) -> bool {
        self.as_array() == Some(other)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            FrameData::Array(array) => {
                let [d0, d1, c] = array.shape();
                write!(f, "Frame({d0}x{d1}x{c} {})", array.dtype())
            }
            FrameData::Buffer(bytes) => write!(f, "Frame({} bytes)", bytes.len()),
        }
    }
}
