//! Subprocess supervision.
//!
//! A [`Process`] owns one child and its standard streams. Standard input is
//! always piped so the tool can be asked to quit; standard error is drained
//! into memory by a helper thread so the child never blocks on it.

use crate::{Error, Result};
use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Token that asks ffmpeg to finish and exit.
const QUIT: &[u8] = b"q";

/// Lifecycle of a supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Nothing has been spawned.
    Idle,
    Running,
    /// Stopped gracefully through [`Process::stop`].
    Stopped,
    Killed,
    /// Exited on its own, with its exit code if it has one.
    Exited(Option<i32>),
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessState::Stopped | ProcessState::Killed | ProcessState::Exited(_)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Idle => f.write_str("idle"),
            ProcessState::Running => f.write_str("running"),
            ProcessState::Stopped => f.write_str("stopped"),
            ProcessState::Killed => f.write_str("killed"),
            ProcessState::Exited(Some(code)) => write!(f, "exited with code {code}"),
            ProcessState::Exited(None) => f.write_str("exited"),
        }
    }
}

/// A running external tool.
#[derive(Debug)]
pub struct Process {
    argv: Vec<String>,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Arc<Mutex<Vec<u8>>>,
    drain: Option<JoinHandle<()>>,
    state: ProcessState,
}

impl Process {
    /// Spawn `argv[0]` with the remaining arguments.
    ///
    /// Standard output is piped only when `pipe_stdout` is set; otherwise it
    /// is discarded.
    pub fn spawn(argv: Vec<String>, pipe_stdout: bool) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::InvalidInput("empty argument vector".to_string()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(argv = %argv.join(" "), pipe_stdout, "Spawning process");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(if pipe_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::from_spawn(program, e))?;

        let stderr = Arc::new(Mutex::new(Vec::new()));
        let drain = child.stderr.take().map(|pipe| {
            let sink = Arc::clone(&stderr);
            thread::spawn(move || drain_into(pipe, &sink))
        });

        Ok(Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            argv,
            child,
            stderr,
            drain,
            state: ProcessState::Running,
        })
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Whether the child is still running and has not been reaped.
    pub fn is_alive(&mut self) -> bool {
        self.state == ProcessState::Running && matches!(self.child.try_wait(), Ok(None))
    }

    /// Everything the child has written to standard error so far.
    pub fn stderr_output(&self) -> Vec<u8> {
        match self.stderr.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Read `n` bytes from standard output.
    ///
    /// Blocks until `n` bytes arrived or the stream ended. A shorter chunk is
    /// only returned at end of stream. When the stream ends with nothing left,
    /// the child is reaped and `None` is returned once; if the child wrote to
    /// standard error, that output is returned as an error instead. Reading
    /// again afterwards fails.
    pub fn read(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_running("read")?;
        if n == 0 {
            return Err(Error::InvalidInput("read size must be positive".to_string()));
        }
        let stdout = self
            .stdout
            .as_mut()
            .ok_or(Error::PipeUnavailable("stdout"))?;

        let mut chunk = Vec::with_capacity(n);
        stdout.take(n as u64).read_to_end(&mut chunk)?;
        if !chunk.is_empty() {
            return Ok(Some(chunk));
        }

        self.stdout = None;
        let code = self.reap()?;
        self.state = ProcessState::Exited(code);

        #[cfg(feature = "tracing")]
        tracing::debug!(program = self.program(), ?code, "Process output ended");

        self.check_stderr()?;
        Ok(None)
    }

    /// Write all of `bytes` to standard input.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_running("write")?;
        let stdin = self.stdin.as_mut().ok_or(Error::PipeUnavailable("stdin"))?;
        stdin
            .write_all(bytes)
            .and_then(|()| stdin.flush())
            .map_err(pipe_error)
    }

    /// Ask the tool to quit, then drain and reap it.
    ///
    /// Returns whatever was still buffered on standard output. Anything the
    /// tool wrote to standard error is reported as a failure; the process is
    /// stopped either way.
    pub fn stop(&mut self) -> Result<Vec<u8>> {
        self.ensure_running("stop")?;
        self.state = ProcessState::Stopped;

        if let Some(mut stdin) = self.stdin.take() {
            match stdin.write_all(QUIT).and_then(|()| stdin.flush()) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut remaining = Vec::new();
        if let Some(mut stdout) = self.stdout.take() {
            stdout.read_to_end(&mut remaining)?;
        }
        let _code = self.reap()?;

        #[cfg(feature = "tracing")]
        tracing::info!(program = self.program(), code = ?_code, "Process stopped");

        self.check_stderr()?;
        Ok(remaining)
    }

    /// Terminate the child immediately. Does nothing once it has finished.
    pub fn kill(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        self.state = ProcessState::Killed;
        self.stdin = None;
        self.stdout = None;

        if let Err(e) = self.child.kill() {
            // Already reaped by the OS side
            if e.kind() != io::ErrorKind::InvalidInput {
                return Err(e.into());
            }
        }
        self.reap()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(program = self.program(), "Process killed");

        Ok(())
    }

    /// Wait for the child to exit on its own.
    ///
    /// Standard input is closed and unread standard output is discarded.
    pub fn wait(&mut self) -> Result<Option<i32>> {
        self.ensure_running("wait")?;
        self.stdin = None;
        if let Some(mut stdout) = self.stdout.take() {
            io::copy(&mut stdout, &mut io::sink())?;
        }
        let code = self.reap()?;
        self.state = ProcessState::Exited(code);

        #[cfg(feature = "tracing")]
        tracing::debug!(program = self.program(), ?code, "Process exited");

        Ok(code)
    }

    /// Hand the standard pipes over to another owner.
    pub(crate) fn take_pipes(&mut self) -> (Option<ChildStdin>, Option<ChildStdout>) {
        (self.stdin.take(), self.stdout.take())
    }

    fn ensure_running(&self, operation: &str) -> Result<()> {
        if self.state == ProcessState::Running {
            Ok(())
        } else {
            Err(Error::invalid_state(operation, self.state))
        }
    }

    fn reap(&mut self) -> Result<Option<i32>> {
        self.stdin = None;
        let status = self.child.wait()?;
        if let Some(drain) = self.drain.take() {
            let _ = drain.join();
        }
        Ok(status.code())
    }

    pub(crate) fn check_stderr(&self) -> Result<()> {
        let stderr = self.stderr_output();
        if stderr.is_empty() {
            return Ok(());
        }
        let message = String::from_utf8_lossy(&stderr).trim().to_string();

        #[cfg(feature = "tracing")]
        tracing::warn!(program = self.program(), %message, "Process wrote to stderr");

        Err(Error::tool_failed(self.program(), message))
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn drain_into(mut pipe: impl Read, sink: &Mutex<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    loop {
        match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => match sink.lock() {
                Ok(mut out) => out.extend_from_slice(&buf[..n]),
                Err(poisoned) => poisoned.into_inner().extend_from_slice(&buf[..n]),
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

fn pipe_error(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::BrokenPipe {
        Error::BrokenPipe
    } else {
        Error::Io(e)
    }
}
