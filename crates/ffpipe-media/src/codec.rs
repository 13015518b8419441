//! Buffer codecs: image files, compressed arrays and compressed blobs.

use crate::array::{ElementType, PixelArray};
use crate::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

/// Header that marks a compressed array buffer.
pub const ARRAY_MAGIC: &[u8] = b"FPNA\x01";

/// JPEG quality used when none is given.
pub const DEFAULT_QUALITY: u8 = 95;

/// Image container used by [`encode_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

impl ImageEncoding {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
        }
    }
}

impl FromStr for ImageEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageEncoding::Jpeg),
            "png" => Ok(ImageEncoding::Png),
            other => Err(Error::Unsupported(format!("image encoding '{other}'"))),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ArrayRecord {
    shape: [usize; 3],
    dtype: ElementType,
    data: Vec<u8>,
}

/// Encode an 8-bit RGB or RGBA array as an image file.
///
/// JPEG has no alpha channel, so a fourth channel is dropped.
pub fn encode_image(array: &PixelArray, encoding: ImageEncoding, quality: u8) -> Result<Vec<u8>> {
    if array.dtype() != ElementType::U8 {
        return Err(Error::Unsupported(format!(
            "cannot encode {} pixels as an image",
            array.dtype()
        )));
    }
    let color = match array.channels() {
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        n => return Err(Error::invalid_shape(format!("{n} channels cannot form an image"))),
    };
    let width = dimension(array.cols())?;
    let height = dimension(array.rows())?;

    let mut buf = Vec::new();
    match encoding {
        ImageEncoding::Png => {
            PngEncoder::new(&mut buf).write_image(array.data(), width, height, color)?;
        }
        ImageEncoding::Jpeg => {
            let rgb: Vec<u8> = if array.channels() == 4 {
                array
                    .data()
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect()
            } else {
                array.data().to_vec()
            };
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            encoder.encode(&rgb, width, height, ExtendedColorType::Rgb8)?;
        }
    }
    Ok(buf)
}

/// Decode an image file into an 8-bit array (RGBA when the image has alpha).
pub fn decode_image(bytes: &[u8]) -> Result<PixelArray> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width() as usize, img.height() as usize);
    if img.color().has_alpha() {
        PixelArray::from_u8([height, width, 4], img.to_rgba8().into_raw())
    } else {
        PixelArray::from_u8([height, width, 3], img.to_rgb8().into_raw())
    }
}

fn dimension(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid_shape(format!("dimension {value} too large")))
}

/// Serialize an array of any element type into a compressed-array buffer.
pub fn compress_array(array: &PixelArray) -> Result<Vec<u8>> {
    let record = ArrayRecord {
        shape: array.shape(),
        dtype: array.dtype(),
        data: array.data().to_vec(),
    };
    let serialized = bincode::serialize(&record)?;
    let mut out = ARRAY_MAGIC.to_vec();
    out.extend(compress(&serialized)?);
    Ok(out)
}

/// Inverse of [`compress_array`].
pub fn decompress_array(bytes: &[u8]) -> Result<PixelArray> {
    let body = bytes
        .strip_prefix(ARRAY_MAGIC)
        .ok_or(Error::NotCompressedArray)?;
    let record: ArrayRecord = bincode::deserialize(&decompress(body)?)?;
    PixelArray::new(record.shape, record.dtype, record.data)
}

/// zlib-compress an opaque byte buffer.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`compress`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn gradient(channels: usize) -> PixelArray {
        let data = (0..4 * 6 * channels).map(|i| (i * 7 % 256) as u8).collect();
        PixelArray::from_u8([4, 6, channels], data).unwrap()
    }

    #[test]
    fn test_png_is_lossless() {
        for channels in [3, 4] {
            let array = gradient(channels);
            let png = encode_image(&array, ImageEncoding::Png, DEFAULT_QUALITY).unwrap();
            assert!(png.starts_with(b"\x89PNG"));
            assert_eq!(decode_image(&png).unwrap(), array);
        }
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let jpeg = encode_image(&gradient(4), ImageEncoding::Jpeg, 90).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
        let decoded = decode_image(&jpeg).unwrap();
        assert_eq!(decoded.shape(), [4, 6, 3]);
    }

    #[test]
    fn test_image_requires_u8() {
        let array = PixelArray::zeros([2, 2, 3], ElementType::U16).unwrap();
        assert_matches!(
            encode_image(&array, ImageEncoding::Png, DEFAULT_QUALITY),
            Err(Error::Unsupported(_))
        );
    }

    #[test]
    fn test_compressed_array_keeps_dtype() {
        let array = PixelArray::from_f32([1, 2, 3], &[0.0, 0.5, 1.0, -1.0, 2.5, 3.25]).unwrap();
        let buf = compress_array(&array).unwrap();
        assert!(buf.starts_with(ARRAY_MAGIC));
        assert_eq!(decompress_array(&buf).unwrap(), array);
    }

    #[test]
    fn test_decompress_array_requires_header() {
        let blob = compress(b"plain").unwrap();
        assert_matches!(decompress_array(&blob), Err(Error::NotCompressedArray));
    }

    #[test]
    fn test_encoding_from_extension() {
        assert_eq!(".JPG".parse::<ImageEncoding>().unwrap(), ImageEncoding::Jpeg);
        assert_eq!("png".parse::<ImageEncoding>().unwrap(), ImageEncoding::Png);
        assert!("gif".parse::<ImageEncoding>().is_err());
    }
}
