//! Dense pixel arrays shaped `(rows, cols, channels)`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a pixel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    U8,
    U16,
    F32,
}

impl ElementType {
    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::F32 => 4,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::U8 => "uint8",
            ElementType::U16 => "uint16",
            ElementType::F32 => "float32",
        };
        f.write_str(name)
    }
}

fn shape_bytes(shape: [usize; 3], dtype: ElementType) -> Result<usize> {
    shape
        .iter()
        .try_fold(dtype.size(), |acc, dim| acc.checked_mul(*dim))
        .ok_or_else(|| Error::invalid_shape(format!("{shape:?} overflows")))
}

/// A three-dimensional array of pixels stored as little-endian bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelArray {
    shape: [usize; 3],
    dtype: ElementType,
    data: Vec<u8>,
}

impl PixelArray {
    /// Wrap `data`, checking that its length matches `shape` and `dtype`.
    pub fn new(shape: [usize; 3], dtype: ElementType, data: Vec<u8>) -> Result<Self> {
        let expected = shape_bytes(shape, dtype)?;
        if data.len() != expected {
            return Err(Error::invalid_shape(format!(
                "{} bytes cannot fill {:?} of {}",
                data.len(),
                shape,
                dtype
            )));
        }
        Ok(Self { shape, dtype, data })
    }

    /// 8-bit array.
    pub fn from_u8(shape: [usize; 3], data: Vec<u8>) -> Result<Self> {
        Self::new(shape, ElementType::U8, data)
    }

    /// 16-bit array.
    pub fn from_u16(shape: [usize; 3], values: &[u16]) -> Result<Self> {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(shape, ElementType::U16, data)
    }

    /// 32-bit float array.
    pub fn from_f32(shape: [usize; 3], values: &[f32]) -> Result<Self> {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(shape, ElementType::F32, data)
    }

    /// All-zero array.
    pub fn zeros(shape: [usize; 3], dtype: ElementType) -> Result<Self> {
        let len = shape_bytes(shape, dtype)?;
        Ok(Self {
            shape,
            dtype,
            data: vec![0; len],
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    /// Raw element bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// First dimension (image height).
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Second dimension (image width).
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    pub fn channels(&self) -> usize {
        self.shape[2]
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the element data in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Decode the elements of a 16-bit array.
    pub fn to_u16(&self) -> Option<Vec<u16>> {
        (self.dtype == ElementType::U16).then(|| {
            self.data
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect()
        })
    }

    /// Decode the elements of a float array.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        (self.dtype == ElementType::F32).then(|| {
            self.data
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_length_must_match_shape() {
        assert!(PixelArray::from_u8([2, 2, 3], vec![0; 12]).is_ok());
        assert_matches!(
            PixelArray::from_u8([2, 2, 3], vec![0; 11]),
            Err(Error::InvalidShape(_))
        );
        assert_matches!(
            PixelArray::new([2, 2, 3], ElementType::U16, vec![0; 12]),
            Err(Error::InvalidShape(_))
        );
    }

    #[test]
    fn test_u16_values_round_trip_through_bytes() {
        let values = [0u16, 1, 256, 65535];
        let array = PixelArray::from_u16([1, 1, 4], &values).unwrap();
        assert_eq!(array.byte_len(), 8);
        assert_eq!(array.to_u16().unwrap(), values);
        assert!(array.to_f32().is_none());
    }

    #[test]
    fn test_dimensions() {
        let array = PixelArray::zeros([4, 2, 3], ElementType::U8).unwrap();
        assert_eq!(array.rows(), 4);
        assert_eq!(array.cols(), 2);
        assert_eq!(array.channels(), 3);
        assert_eq!(array.len(), 24);
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let huge = [usize::MAX / 2, 3, 1];
        assert_matches!(PixelArray::zeros(huge, ElementType::U8), Err(Error::InvalidShape(_)));
        assert_matches!(
            PixelArray::new(huge, ElementType::F32, Vec::new()),
            Err(Error::InvalidShape(_))
        );
    }
}
