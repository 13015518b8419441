//! # ffpipe-media
//!
//! Frame value objects for raw video pipelines.
//!
//! A [`Frame`] holds either decoded pixels ([`PixelArray`]) or an opaque
//! buffer. Frames serialize through one of three buffer codecs:
//!
//! - 8-bit arrays as PNG images
//! - wider arrays as compressed arrays (a short header followed by zlib data)
//! - opaque buffers as zlib blobs
//!
//! [`Frame::from_buffer`] recognises all three.

pub mod array;
pub mod codec;
mod error;
mod frame;

pub use array::{ElementType, PixelArray};
pub use codec::{ImageEncoding, DEFAULT_QUALITY};
pub use error::{Error, Result};
pub use frame::{Frame, FrameData};
