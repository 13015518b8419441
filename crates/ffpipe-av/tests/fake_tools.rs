//! Pipeline tests against shell scripts standing in for ffmpeg and ffprobe.
//!
//! The fake ffmpeg writes two 4x2 BGR frames to stdout; the fake ffprobe
//! reports a single 4x2 video stream at 15 fps.

#![cfg(unix)]

use assert_matches::assert_matches;
use ffpipe_av::{
    Capture, End, Error, Ffmpeg, InputStream, OutputStream, PixelFormat, Probe, ProcessState,
    Toolchain, VideoCapture,
};
use serial_test::serial;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

const FRAME_BYTES: usize = 4 * 2 * 3;

const FAKE_FFMPEG: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$(dirname "$0")/ffmpeg.args"
head -c 48 /dev/zero
"#;

const FAKE_FFPROBE: &str = r#"#!/bin/sh
cat <<'JSON'
{"streams": [{"index": 0, "codec_type": "video", "codec_name": "rawvideo",
  "width": 4, "height": 2, "r_frame_rate": "15/1", "pix_fmt": "bgr24"}]}
JSON
"#;

const FAILING_FFPROBE: &str = "#!/bin/sh\necho 'No such file or directory' >&2\nexit 1\n";

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn fake_toolchain(dir: &TempDir) -> Toolchain {
    Toolchain {
        ffmpeg: write_script(dir.path(), "ffmpeg", FAKE_FFMPEG),
        ffprobe: write_script(dir.path(), "ffprobe", FAKE_FFPROBE),
    }
}

#[test]
#[serial]
fn test_probe_with_fake_ffprobe() {
    let dir = TempDir::new().unwrap();
    let tools = fake_toolchain(&dir);

    let mut probe = Probe::with_program(&tools.ffprobe, "clip.mp4").unwrap();
    let info = probe.info().unwrap();
    assert_eq!(info.size(), (4, 2));
    assert_eq!(info.r_frame_rate, 15.0);
    assert_eq!(info.pix_fmt.as_deref(), Some("bgr24"));
}

#[test]
#[serial]
fn test_probe_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let ffprobe = write_script(dir.path(), "ffprobe", FAILING_FFPROBE);

    let mut probe = Probe::with_program(ffprobe, "missing.mp4").unwrap();
    assert_matches!(
        probe.info(),
        Err(Error::ToolFailed { ref message, .. }) if message.contains("No such file")
    );
}

#[test]
#[serial]
fn test_video_capture_reads_all_frames() {
    let dir = TempDir::new().unwrap();
    let tools = fake_toolchain(&dir);

    let mut capture = VideoCapture::new("clip.mp4", None, PixelFormat::Bgr24, &tools).unwrap();
    let reader = capture.run().unwrap();
    assert_eq!(reader.chunk_size(), FRAME_BYTES);

    let mut frames = capture.frames().unwrap();
    let collected: Vec<_> = frames.by_ref().collect();
    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].size(), vec![2, 4, 3]);
    assert_matches!(frames.end(), Some(End::Exhausted));
    drop(frames);
    capture.release().unwrap();

    // The probed rate is passed to the output
    let args = fs::read_to_string(dir.path().join("ffmpeg.args")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    let rate = args.iter().position(|a| *a == "-r").unwrap();
    assert_eq!(args[rate + 1], "15");
    assert_eq!(args.last(), Some(&"pipe:"));
}

#[test]
#[serial]
fn test_capture_chunks_and_release() {
    let dir = TempDir::new().unwrap();
    let tools = fake_toolchain(&dir);

    let mut capture = Capture::new("clip.mp4", Some("pipe:".to_string()), &tools).unwrap();
    assert_matches!(capture.read(4), Err(Error::NoProcess));
    capture.start().unwrap();
    assert_matches!(capture.start(), Err(Error::ProcessAttached));

    let total: usize = capture.chunks(FRAME_BYTES).unwrap().map(|c| c.len()).sum();
    assert_eq!(total, 2 * FRAME_BYTES);
    assert_matches!(capture.state(), ProcessState::Exited(Some(0)));

    capture.release().unwrap();
    capture.release().unwrap();
    assert_eq!(capture.state(), ProcessState::Idle);
}

#[test]
#[serial]
fn test_stop_twice_fails() {
    let dir = TempDir::new().unwrap();
    let tools = fake_toolchain(&dir);

    let mut ffmpeg = Ffmpeg::with_program(&tools.ffmpeg, InputStream::new("clip.mp4").unwrap());
    ffmpeg.add_output(OutputStream::pipe()).unwrap();
    let process = ffmpeg.run().unwrap();
    let remaining = process.stop().unwrap();
    assert!(remaining.len() <= 2 * FRAME_BYTES);
    assert_matches!(process.stop(), Err(Error::InvalidState { .. }));
}

#[test]
#[serial]
fn test_run_to_completion_with_file_output() {
    let dir = TempDir::new().unwrap();
    let tools = fake_toolchain(&dir);

    let mut ffmpeg = Ffmpeg::with_program(&tools.ffmpeg, InputStream::new("clip.mp4").unwrap());
    ffmpeg.add_output(OutputStream::new("out.mkv")).unwrap();
    ffmpeg.run_to_completion().unwrap();
    assert!(ffmpeg.process().is_none());
}
