//! Non-blocking process I/O.
//!
//! Two worker threads move bytes between the child's pipes and bounded
//! queues, so the owning thread only ever blocks on a queue and can give up
//! after a timeout.

use crate::process::{Process, ProcessState};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A process whose standard streams are serviced by worker threads.
#[derive(Debug)]
pub struct NonBlocking {
    process: Process,
    incoming: Option<Receiver<io::Result<Vec<u8>>>>,
    outgoing: Option<SyncSender<Vec<u8>>>,
    workers: Vec<JoinHandle<()>>,
    cache: BytesMut,
    drained: bool,
    stopped: bool,
}

impl NonBlocking {
    /// Take over `process`.
    ///
    /// The reader pulls at most `chunk_size` bytes per read; each queue holds
    /// up to `queue_depth` chunks before its worker blocks.
    pub fn new(mut process: Process, chunk_size: usize, queue_depth: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidInput("chunk size must be positive".to_string()));
        }
        let (stdin, stdout) = process.take_pipes();
        let mut workers = Vec::with_capacity(2);

        let incoming = match stdout {
            Some(mut stdout) => {
                let (tx, rx) = mpsc::sync_channel::<io::Result<Vec<u8>>>(queue_depth);
                let handle = thread::Builder::new()
                    .name("ffpipe-reader".to_string())
                    .spawn(move || {
                        let mut buf = vec![0u8; chunk_size];
                        loop {
                            match stdout.read(&mut buf) {
                                Ok(0) => break,
                                Ok(n) => {
                                    if tx.send(Ok(buf[..n].to_vec())).is_err() {
                                        break;
                                    }
                                }
                                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                                Err(e) => {
                                    let _ = tx.send(Err(e));
                                    break;
                                }
                            }
                        }
                    })?;
                workers.push(handle);
                Some(rx)
            }
            None => None,
        };

        let outgoing = match stdin {
            Some(mut stdin) => {
                let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(queue_depth);
                let handle = thread::Builder::new()
                    .name("ffpipe-writer".to_string())
                    .spawn(move || {
                        for bytes in rx {
                            if stdin.write_all(&bytes).and_then(|()| stdin.flush()).is_err() {
                                break;
                            }
                        }
                    })?;
                workers.push(handle);
                Some(tx)
            }
            None => None,
        };

        Ok(Self {
            process,
            incoming,
            outgoing,
            workers,
            cache: BytesMut::new(),
            drained: false,
            stopped: false,
        })
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn state(&self) -> ProcessState {
        self.process.state()
    }

    /// Bytes received but not yet returned by [`NonBlocking::read`].
    pub fn buffered(&self) -> usize {
        self.cache.len()
    }

    /// Read up to `n` bytes.
    ///
    /// Waits until `n` bytes are buffered or the stream ends. With a timeout,
    /// gives up with [`Error::Timeout`] and keeps what arrived for the next
    /// call. Returns `None` once the stream has ended and the cache is empty,
    /// unless the child wrote to standard error, which is reported as
    /// [`Error::ToolFailed`]. A failed pipe read surfaces as [`Error::Io`].
    pub fn read(&mut self, n: usize, timeout: Option<Duration>) -> Result<Option<Bytes>> {
        if self.stopped {
            return Err(Error::invalid_state("read", ProcessState::Stopped));
        }
        if n == 0 {
            return Err(Error::InvalidInput("read size must be positive".to_string()));
        }
        let incoming = self
            .incoming
            .as_ref()
            .ok_or(Error::PipeUnavailable("stdout"))?;
        let deadline = timeout.map(|t| Instant::now() + t);

        while self.cache.len() < n && !self.drained {
            let next = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match incoming.recv_timeout(remaining) {
                        Ok(chunk) => Some(chunk),
                        Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout),
                        Err(RecvTimeoutError::Disconnected) => None,
                    }
                }
                None => incoming.recv().ok(),
            };
            match next {
                Some(Ok(chunk)) => self.cache.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.drained = true;
                    return Err(e.into());
                }
                None => self.drained = true,
            }
        }

        if self.cache.is_empty() {
            if self.process.state() != ProcessState::Running {
                return Err(Error::invalid_state("read", self.process.state()));
            }
            self.process.wait()?;
            self.process.check_stderr()?;
            return Ok(None);
        }
        let take = n.min(self.cache.len());
        Ok(Some(self.cache.split_to(take).freeze()))
    }

    /// Queue `bytes` for the child's standard input.
    pub fn write(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        if self.stopped {
            return Err(Error::invalid_state("write", ProcessState::Stopped));
        }
        let outgoing = self
            .outgoing
            .as_ref()
            .ok_or(Error::PipeUnavailable("stdin"))?;
        outgoing.send(bytes.into()).map_err(|_| Error::BrokenPipe)
    }

    /// Tear down both queues, terminate the child and join the workers.
    pub fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Err(Error::invalid_state("stop", ProcessState::Stopped));
        }
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        self.stopped = true;
        self.incoming = None;
        self.outgoing = None;
        let killed = self.process.kill();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(program = self.process.program(), "Non-blocking workers joined");

        killed
    }
}

impl Drop for NonBlocking {
    fn drop(&mut self) {
        if !self.stopped {
            let _ = self.teardown();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn spawn(argv: &[&str]) -> NonBlocking {
        let argv = argv.iter().map(|s| s.to_string()).collect();
        NonBlocking::new(Process::spawn(argv, true).unwrap(), 64, 4).unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let mut io = spawn(&["cat"]);
        io.write(&b"hello"[..]).unwrap();
        let chunk = io.read(5, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(chunk.as_deref(), Some(&b"hello"[..]));
        io.stop().unwrap();
        assert_matches!(io.stop(), Err(Error::InvalidState { .. }));
        assert_matches!(io.write(&b"x"[..]), Err(Error::InvalidState { .. }));
    }

    #[test]
    fn test_timeout_keeps_partial_data() {
        let mut io = spawn(&["sh", "-c", "printf ab; exec sleep 30"]);
        assert_matches!(
            io.read(4, Some(Duration::from_millis(300))),
            Err(Error::Timeout)
        );
        assert_eq!(io.buffered(), 2);
        io.stop().unwrap();
        assert_eq!(io.state(), ProcessState::Killed);
    }

    #[test]
    fn test_end_of_stream() {
        let mut io = spawn(&["sh", "-c", "printf abc"]);
        assert_eq!(io.read(2, None).unwrap().as_deref(), Some(&b"ab"[..]));
        assert_eq!(io.read(2, None).unwrap().as_deref(), Some(&b"c"[..]));
        assert_eq!(io.read(2, None).unwrap(), None);
        assert_matches!(io.read(2, None), Err(Error::InvalidState { .. }));
    }

    #[test]
    fn test_stderr_at_end_of_stream_fails() {
        let mut io = spawn(&["sh", "-c", "echo boom >&2"]);
        let err = io.read(4, Some(Duration::from_secs(5))).unwrap_err();
        assert_matches!(err, Error::ToolFailed { ref message, .. } if message == "boom");
        assert_matches!(io.read(4, None), Err(Error::InvalidState { .. }));
    }

    #[test]
    fn test_stderr_after_data_fails_once_drained() {
        let mut io = spawn(&["sh", "-c", "printf ab; echo late >&2"]);
        assert_eq!(io.read(2, None).unwrap().as_deref(), Some(&b"ab"[..]));
        assert_matches!(io.read(2, None), Err(Error::ToolFailed { .. }));
    }
}
