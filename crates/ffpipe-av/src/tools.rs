//! External tool detection and capability listing.

use crate::ffmpeg::FFMPEG;
use crate::probe::FFPROBE;
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

/// `<flags> <name> <description>` rows of the encoder and decoder listings.
static CODEC_ROW: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s+(\S+)\s*(.*)$"));

/// ` DEd <name> <description>` rows of the format listing; older builds
/// print no device column.
static FORMAT_ROW: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^ ([D ])([E ])([d ]?) (\S+)\s*(.*)$"));

/// `GPU <index>: <model> (UUID: ...)` rows of `nvidia-smi -L`.
static GPU_ROW: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^GPU \d+:"));

fn compiled(pattern: &'static LazyLock<std::result::Result<Regex, regex::Error>>) -> Result<&'static Regex> {
    pattern
        .as_ref()
        .map_err(|e| Error::parse_error(FFMPEG, e.to_string()))
}

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// First line of the version banner, if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if an ffmpeg-style tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use ffpipe_av::check_tool;
///
/// let info = check_tool("ffprobe");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(name, "-version")
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(name: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(name).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = which::which(name).ok();

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check ffmpeg and ffprobe on `PATH`.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![check_tool(FFMPEG), check_tool(FFPROBE)]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    require_tool(name)
}

/// Number of NVIDIA GPUs reported by `nvidia-smi`, zero when it is missing.
pub fn count_gpus() -> usize {
    match Command::new("nvidia-smi").arg("-L").output() {
        Ok(output) if output.status.success() => {
            parse_gpu_list(&String::from_utf8_lossy(&output.stdout)).unwrap_or(0)
        }
        _ => 0,
    }
}

pub fn parse_gpu_list(text: &str) -> Result<usize> {
    let row = compiled(&GPU_ROW)?;
    Ok(text.lines().filter(|line| row.is_match(line.trim())).count())
}

/// Media type column of the codec listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodecType {
    Video,
    Audio,
    Subtitle,
    Data,
}

/// One row of `ffmpeg -encoders` or `ffmpeg -decoders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecEntry {
    pub name: String,
    pub codec_type: CodecType,
    pub description: String,
}

/// One row of `ffmpeg -formats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatEntry {
    pub name: String,
    pub demuxer: bool,
    pub muxer: bool,
    pub device: bool,
    pub description: String,
}

fn query(ffmpeg: &str, listing: &str) -> Result<String> {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-loglevel", "quiet", listing])
        .output()
        .map_err(|e| Error::from_spawn(ffmpeg, e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed(ffmpeg, format!("{listing}: {}", stderr.trim())));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error(ffmpeg, format!("Invalid UTF-8: {e}")))
}

/// Hardware acceleration methods ffmpeg was built with.
pub fn list_hwaccels(ffmpeg: &str) -> Result<Vec<String>> {
    Ok(parse_hwaccels(&query(ffmpeg, "-hwaccels")?))
}

pub fn list_encoders(ffmpeg: &str) -> Result<Vec<CodecEntry>> {
    parse_codecs(&query(ffmpeg, "-encoders")?)
}

pub fn list_decoders(ffmpeg: &str) -> Result<Vec<CodecEntry>> {
    parse_codecs(&query(ffmpeg, "-decoders")?)
}

pub fn list_formats(ffmpeg: &str) -> Result<Vec<FormatEntry>> {
    parse_formats(&query(ffmpeg, "-formats")?)
}

/// Encoders whose name contains `needle`.
pub fn find_encoders(ffmpeg: &str, needle: &str) -> Result<Vec<CodecEntry>> {
    Ok(list_encoders(ffmpeg)?
        .into_iter()
        .filter(|entry| entry.name.contains(needle))
        .collect())
}

/// Decoders whose name contains `needle`.
pub fn find_decoders(ffmpeg: &str, needle: &str) -> Result<Vec<CodecEntry>> {
    Ok(list_decoders(ffmpeg)?
        .into_iter()
        .filter(|entry| entry.name.contains(needle))
        .collect())
}

/// Formats whose name list contains `name`.
pub fn find_formats(ffmpeg: &str, name: &str) -> Result<Vec<FormatEntry>> {
    Ok(list_formats(ffmpeg)?
        .into_iter()
        .filter(|entry| entry.name.split(',').any(|n| n == name))
        .collect())
}

/// The method names, one per line after the heading.
pub fn parse_hwaccels(text: &str) -> Vec<String> {
    text.lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rows after the `------` separator of an encoder or decoder listing.
pub fn parse_codecs(text: &str) -> Result<Vec<CodecEntry>> {
    let row = compiled(&CODEC_ROW)?;
    let entries = text
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let caps = row.captures(line)?;
            let codec_type = match caps[1].chars().next()? {
                'V' => CodecType::Video,
                'A' => CodecType::Audio,
                'S' => CodecType::Subtitle,
                'D' => CodecType::Data,
                _ => return None,
            };
            Some(CodecEntry {
                name: caps[2].to_string(),
                codec_type,
                description: caps[3].trim().to_string(),
            })
        })
        .collect();
    Ok(entries)
}

/// Rows after the `--` separator of a format listing.
pub fn parse_formats(text: &str) -> Result<Vec<FormatEntry>> {
    let row = compiled(&FORMAT_ROW)?;
    let entries = text
        .lines()
        .skip_while(|line| line.trim() != "--")
        .skip(1)
        .filter_map(|line| {
            let caps = row.captures(line)?;
            Some(FormatEntry {
                name: caps[4].to_string(),
                demuxer: &caps[1] == "D",
                muxer: &caps[2] == "E",
                device: &caps[3] == "d",
                description: caps[5].trim().to_string(),
            })
        })
        .collect();
    Ok(entries)
}
