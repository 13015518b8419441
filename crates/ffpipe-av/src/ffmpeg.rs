//! The ffmpeg command builder.

use crate::catalog::LogLevel;
use crate::codec::Codec;
use crate::process::{Process, ProcessState};
use crate::stream::{InputStream, OutputStream};
use crate::{Error, Result};
use ffpipe_options::{OptionSpec, Options, Rule, Schema, Value};
use std::fmt;
use std::sync::LazyLock;

/// Default program name, resolved through `PATH`.
pub const FFMPEG: &str = "ffmpeg";

static GLOBAL: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("ffmpeg")
        .option(OptionSpec::new("hide_banner", "hide_banner", Rule::Switch).with_default(Value::Switch))
        .option(
            OptionSpec::new("loglevel", "loglevel", Rule::OneOf(LogLevel::NAMES))
                .with_default(LogLevel::Error)
                .doc("Tool log verbosity"),
        )
        .option(OptionSpec::new("nostats", "nostats", Rule::Switch).doc("Suppress progress lines"))
});

/// One ffmpeg invocation: global options, one input and any number of outputs.
///
/// # Example
///
/// ```
/// use ffpipe_av::{Ffmpeg, InputStream, OutputStream};
///
/// let mut ffmpeg = Ffmpeg::new(InputStream::new("clip.mp4")?);
/// ffmpeg.add_output(OutputStream::new("out.mkv"))?;
/// assert_eq!(
///     ffmpeg.build(),
///     ["ffmpeg", "-hide_banner", "-loglevel", "error", "-i", "clip.mp4", "out.mkv"]
/// );
/// # Ok::<(), ffpipe_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Ffmpeg {
    program: String,
    globals: Options,
    input: InputStream,
    outputs: Vec<OutputStream>,
    process: Option<Process>,
}

impl Ffmpeg {
    pub fn new(input: InputStream) -> Self {
        Self::with_program(FFMPEG, input)
    }

    /// Use `program` instead of `ffmpeg` from `PATH`.
    pub fn with_program(program: impl Into<String>, input: InputStream) -> Self {
        Self {
            program: program.into(),
            globals: Options::new(&GLOBAL),
            input,
            outputs: Vec::new(),
            process: None,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Register an output. Destinations must be unique.
    pub fn add_output(&mut self, output: OutputStream) -> Result<()> {
        if self
            .outputs
            .iter()
            .any(|existing| existing.destination() == output.destination())
        {
            return Err(Error::DuplicateOutput {
                path: output.destination().to_string(),
            });
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn outputs(&self) -> &[OutputStream] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<&OutputStream> {
        self.outputs.get(index)
    }

    pub fn output_mut(&mut self, index: usize) -> Option<&mut OutputStream> {
        self.outputs.get_mut(index)
    }

    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
    }

    pub fn input(&self) -> &InputStream {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputStream {
        &mut self.input
    }

    pub fn globals(&self) -> &Options {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Options {
        &mut self.globals
    }

    /// `[program] + globals + input + outputs`, outputs in insertion order.
    ///
    /// Encoders with a raw parameter option (libx264, libx265) are built with
    /// `log-level=<loglevel>` added to it. The stored outputs are not changed.
    pub fn build(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.globals.to_ordered_args());
        argv.extend(self.input.build());
        for output in &self.outputs {
            argv.extend(self.build_output(output));
        }
        argv
    }

    fn build_output(&self, output: &OutputStream) -> Vec<String> {
        let Some(level) = self.globals.get("loglevel").and_then(Value::as_str) else {
            return output.build();
        };
        if output.encoder().and_then(Codec::params_key).is_none() {
            return output.build();
        }

        let mut tagged = output.clone();
        match tagged.encoder_mut().map(|encoder| encoder.add_param("log-level", level)) {
            Some(Ok(())) => tagged.build(),
            _ => output.build(),
        }
    }

    /// Spawn the command and keep the process attached.
    ///
    /// Standard output is piped when any output writes to [`crate::PIPE`].
    pub fn run(&mut self) -> Result<&mut Process> {
        if self.outputs.is_empty() {
            return Err(Error::NoOutputs);
        }
        if self.process.is_some() {
            return Err(Error::ProcessAttached);
        }
        let pipe_stdout = self.outputs.iter().any(OutputStream::is_pipe);
        let process = Process::spawn(self.build(), pipe_stdout)?;
        Ok(self.process.insert(process))
    }

    /// Run, wait for exit and fail on a non-zero status.
    pub fn run_to_completion(&mut self) -> Result<()> {
        self.run()?;
        let mut process = self.process.take().ok_or(Error::NoProcess)?;
        let code = process.wait()?;
        if code == Some(0) {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&process.stderr_output())
            .trim()
            .to_string();
        let message = if stderr.is_empty() {
            process.state().to_string()
        } else {
            stderr
        };
        Err(Error::tool_failed(&self.program, message))
    }

    pub fn process(&self) -> Option<&Process> {
        self.process.as_ref()
    }

    pub fn process_mut(&mut self) -> Option<&mut Process> {
        self.process.as_mut()
    }

    /// Detach the process so the builder can run again.
    pub fn take_process(&mut self) -> Option<Process> {
        self.process.take()
    }

    pub fn state(&self) -> ProcessState {
        self.process
            .as_ref()
            .map_or(ProcessState::Idle, Process::state)
    }
}

impl fmt::Display for Ffmpeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::stream::{Platform, PIPE};
    use assert_matches::assert_matches;

    fn input() -> InputStream {
        InputStream::with_platform("clip.mp4", Platform::Linux).unwrap()
    }

    #[test]
    fn test_build_order() {
        let mut ffmpeg = Ffmpeg::new(input());
        ffmpeg.globals_mut().set("nostats", Value::Switch).unwrap();
        ffmpeg.input_mut().set("realtime", Value::Switch).unwrap();

        let mut raw = OutputStream::pipe();
        raw.set_muxer(Format::raw_video_muxer()).unwrap();
        raw.set("pix_fmt", "bgr24").unwrap();
        ffmpeg.add_output(raw).unwrap();
        ffmpeg
            .add_output(OutputStream::with("copy.mkv", Some(Codec::copy()), None).unwrap())
            .unwrap();

        assert_eq!(
            ffmpeg.build(),
            [
                "ffmpeg",
                "-hide_banner",
                "-loglevel",
                "error",
                "-nostats",
                "-re",
                "-i",
                "clip.mp4",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "bgr24",
                "pipe:",
                "-c",
                "copy",
                "copy.mkv",
            ]
        );
    }

    #[test]
    fn test_x26x_encoders_inherit_loglevel() {
        let mut ffmpeg = Ffmpeg::new(input());
        ffmpeg
            .add_output(OutputStream::with("a.mp4", Some(Codec::libx264()), None).unwrap())
            .unwrap();
        let mut hevc = Codec::libx265();
        hevc.set("x265_params", "keyint=60:log-level=full").unwrap();
        ffmpeg
            .add_output(OutputStream::with("b.mp4", Some(hevc), None).unwrap())
            .unwrap();
        ffmpeg
            .add_output(OutputStream::with("c.mp4", Some(Codec::h264_nvenc()), None).unwrap())
            .unwrap();
        ffmpeg.globals_mut().set("loglevel", "warning").unwrap();

        assert_eq!(
            ffmpeg.build(),
            [
                "ffmpeg",
                "-hide_banner",
                "-loglevel",
                "warning",
                "-i",
                "clip.mp4",
                "-c:v",
                "libx264",
                "-x264opts",
                "log-level=warning",
                "a.mp4",
                "-c:v",
                "libx265",
                "-x265-params",
                "keyint=60:log-level=warning",
                "b.mp4",
                "-c:v",
                "h264_nvenc",
                "c.mp4",
            ]
        );

        let stored = ffmpeg.output(0).unwrap().encoder().unwrap();
        assert!(stored.get("x264opts").and_then(Value::as_params).unwrap().is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut a = OutputStream::new("out.mp4");
        a.set("duration", 4).unwrap();
        a.set("no_audio", Value::Switch).unwrap();
        let mut b = OutputStream::new("out.mp4");
        b.set("no_audio", Value::Switch).unwrap();
        b.set("duration", 4).unwrap();
        assert_eq!(a.build(), b.build());
    }

    #[test]
    fn test_duplicate_output() {
        let mut ffmpeg = Ffmpeg::new(input());
        ffmpeg.add_output(OutputStream::new("out.mp4")).unwrap();
        let mut second = OutputStream::new("out.mp4");
        second.set("duration", 1).unwrap();
        assert_matches!(
            ffmpeg.add_output(second),
            Err(Error::DuplicateOutput { ref path }) if path == "out.mp4"
        );
        assert_eq!(ffmpeg.outputs().len(), 1);
        assert!(ffmpeg.output(0).unwrap().get("duration").is_none());
    }

    #[test]
    fn test_run_without_outputs() {
        let mut ffmpeg = Ffmpeg::with_program("true", input());
        assert_matches!(ffmpeg.run(), Err(Error::NoOutputs));
        assert_eq!(ffmpeg.state(), ProcessState::Idle);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_twice() {
        let mut ffmpeg = Ffmpeg::with_program("true", input());
        ffmpeg.add_output(OutputStream::new(PIPE)).unwrap();
        ffmpeg.run().unwrap();
        assert_matches!(ffmpeg.run(), Err(Error::ProcessAttached));
        assert!(ffmpeg.take_process().is_some());
        assert!(ffmpeg.run().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_to_completion_reports_failure() {
        let mut ffmpeg = Ffmpeg::with_program("false", input());
        ffmpeg.add_output(OutputStream::new("out.mp4")).unwrap();
        assert_matches!(
            ffmpeg.run_to_completion(),
            Err(Error::ToolFailed { ref tool, .. }) if tool == "false"
        );
    }
}
