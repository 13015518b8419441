//! Integration tests for configuration file discovery.

use ffpipe::config::{load_config_or_default, validate_config, Config};
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Run `f` with the working directory set to `dir`.
fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir).unwrap();
    let result = f();
    std::env::set_current_dir(previous).unwrap();
    result
}

#[test]
#[serial]
fn explicit_path_wins() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("ffpipe.toml"), "[ffmpeg]\nloglevel = \"info\"\n").unwrap();
    let explicit = temp.path().join("other.toml");
    fs::write(&explicit, "[ffmpeg]\nloglevel = \"debug\"\n").unwrap();

    let config = in_dir(temp.path(), || load_config_or_default(Some(&explicit))).unwrap();
    assert_eq!(config.ffmpeg.loglevel, "debug");
}

#[test]
#[serial]
fn ffpipe_toml_is_preferred_over_config_toml() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("ffpipe.toml"), "[ffmpeg]\nloglevel = \"info\"\n").unwrap();
    fs::write(temp.path().join("config.toml"), "[ffmpeg]\nloglevel = \"debug\"\n").unwrap();

    let config = in_dir(temp.path(), || load_config_or_default(None)).unwrap();
    assert_eq!(config.ffmpeg.loglevel, "info");
}

#[test]
#[serial]
fn config_toml_is_found() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("config.toml"), "[capture]\nquality = 70\n").unwrap();

    let config = in_dir(temp.path(), || load_config_or_default(None)).unwrap();
    assert_eq!(config.capture.quality, 70);
}

#[test]
#[serial]
fn invalid_discovered_file_is_an_error() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("ffpipe.toml"), "[capture]\nimage_format = \"bmp\"\n").unwrap();

    let result = in_dir(temp.path(), || load_config_or_default(None));
    assert!(result.is_err());
}

#[test]
fn default_config_is_valid() {
    validate_config(&Config::default()).unwrap();
}

#[test]
fn missing_tool_paths_only_warn() {
    let mut config = Config::default();
    config.tools.ffmpeg_path = Some("/nonexistent/ffmpeg".into());
    validate_config(&config).unwrap();
    assert_eq!(config.tools.toolchain().ffmpeg, "/nonexistent/ffmpeg");
}
