//! ffpipe - typed ffmpeg command building, probing and frame capture
//!
//! This library crate exposes the application configuration for integration testing.

pub mod config;
