//! CLI end-to-end tests
//!
//! Tests for the ffpipe command-line interface. Commands that run tools
//! use shell scripts standing in for ffmpeg and ffprobe.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the ffpipe binary
#[allow(deprecated)]
fn ffpipe_cmd() -> Command {
    Command::cargo_bin("ffpipe").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = ffpipe_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = ffpipe_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffpipe"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = ffpipe_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "ffpipe {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_cli_check_tools_command() {
    let temp = tempdir().unwrap();
    let mut cmd = ffpipe_cmd();
    cmd.current_dir(temp.path())
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"))
        .stdout(predicate::str::contains("NVIDIA GPUs"));
}

#[test]
fn test_cli_build_prints_command() {
    let temp = tempdir().unwrap();
    let mut cmd = ffpipe_cmd();
    cmd.current_dir(temp.path())
        .args([
            "build",
            "in.mp4",
            "out.mkv",
            "--codec",
            "libx264",
            "--seek",
            "00:01:05",
            "--duration",
            "10",
            "--video-filter",
            "scale=640:-2",
            "--overwrite",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "ffmpeg -hide_banner -loglevel error",
        ))
        .stdout(predicate::str::contains("-ss 00:01:05 -i in.mp4"))
        .stdout(predicate::str::contains("-c:v libx264 -x264opts log-level=error"))
        .stdout(predicate::str::contains("-vf scale=640:-2"))
        .stdout(predicate::str::contains("-t 10"))
        .stdout(predicate::str::contains("-y out.mkv"));
}

#[test]
fn test_cli_build_rejects_bad_clock_time() {
    let temp = tempdir().unwrap();
    let mut cmd = ffpipe_cmd();
    cmd.current_dir(temp.path())
        .args(["build", "in.mp4", "out.mkv", "--seek", "00:99:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --seek"));
}

#[test]
fn test_cli_build_rejects_unknown_codec() {
    let temp = tempdir().unwrap();
    let mut cmd = ffpipe_cmd();
    cmd.current_dir(temp.path())
        .args(["build", "in.mp4", "out.mkv", "--codec", "vp9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported"));
}

#[test]
fn test_cli_build_uses_config_loglevel() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[ffmpeg]\nloglevel = \"warning\"\nnostats = true\n").unwrap();

    let mut cmd = ffpipe_cmd();
    cmd.current_dir(temp.path())
        .args(["build", "in.mp4", "out.mkv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-loglevel warning -nostats"));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = ffpipe_cmd();
    cmd.args(["probe", "/nonexistent/path/movie.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_validate_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("ffpipe.toml");
    fs::write(
        &config_file,
        r#"
[ffmpeg]
loglevel = "info"

[capture]
image_format = "jpeg"
quality = 85
"#,
    )
    .unwrap();

    let mut cmd = ffpipe_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("jpeg"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("ffpipe.toml");
    fs::write(&config_file, "[capture]\nquality = 0\n").unwrap();

    let mut cmd = ffpipe_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("capture.quality"));
}

#[cfg(unix)]
mod fake_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Two 4x2 RGB frames.
    const FAKE_FFMPEG: &str = "#!/bin/sh\nhead -c 48 /dev/zero\n";

    const FAKE_FFPROBE: &str = r#"#!/bin/sh
cat <<'JSON'
{"streams": [{"index": 0, "codec_type": "video", "codec_name": "rawvideo",
  "width": 4, "height": 2, "r_frame_rate": "15/1", "pix_fmt": "rgb24"}]}
JSON
"#;

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Write both scripts, a config pointing at them and an empty source.
    fn setup(dir: &Path) {
        let ffmpeg = write_script(dir, "ffmpeg", FAKE_FFMPEG);
        let ffprobe = write_script(dir, "ffprobe", FAKE_FFPROBE);
        fs::write(
            dir.join("ffpipe.toml"),
            format!("[tools]\nffmpeg_path = \"{ffmpeg}\"\nffprobe_path = \"{ffprobe}\"\n"),
        )
        .unwrap();
        fs::write(dir.join("clip.mp4"), b"").unwrap();
    }

    #[test]
    fn test_cli_probe_with_fake_ffprobe() {
        let temp = tempdir().unwrap();
        setup(temp.path());

        let mut cmd = ffpipe_cmd();
        cmd.current_dir(temp.path())
            .args(["probe", "clip.mp4"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Size: 4x2"))
            .stdout(predicate::str::contains("15.000 fps"));
    }

    #[test]
    fn test_cli_probe_json() {
        let temp = tempdir().unwrap();
        setup(temp.path());

        let output = ffpipe_cmd()
            .current_dir(temp.path())
            .args(["probe", "clip.mp4", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["width"], 4);
        assert_eq!(json["height"], 2);
        assert_eq!(json["r_frame_rate"], 15.0);
        assert_eq!(json["others"]["index"], 0);
    }

    #[test]
    fn test_cli_capture_saves_frames() {
        let temp = tempdir().unwrap();
        setup(temp.path());
        let out_dir = temp.path().join("frames");

        let mut cmd = ffpipe_cmd();
        cmd.current_dir(temp.path())
            .args(["capture", "clip.mp4", "--frames", "5", "--out-dir"])
            .arg(&out_dir)
            .assert()
            .success()
            .stdout(predicate::str::contains("frame_00001.png"));

        assert!(out_dir.join("frame_00000.png").exists());
        assert!(out_dir.join("frame_00001.png").exists());
        assert!(!out_dir.join("frame_00002.png").exists());
    }

    #[test]
    fn test_cli_build_and_run() {
        let temp = tempdir().unwrap();
        setup(temp.path());

        let mut cmd = ffpipe_cmd();
        cmd.current_dir(temp.path())
            .args(["build", "clip.mp4", "out.mkv", "--run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Finished writing out.mkv"));
    }
}
