//! Error types for ffpipe-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or supervising tool invocations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed or reported errors.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported codec, format or operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An option assignment was rejected.
    #[error(transparent)]
    Option(#[from] ffpipe_options::Error),

    /// Frame construction or serialization failed.
    #[error(transparent)]
    Media(#[from] ffpipe_media::Error),

    /// An output with the same destination is already registered.
    #[error("output already exists: {path}")]
    DuplicateOutput { path: String },

    /// The command has no outputs to run.
    #[error("no output streams configured")]
    NoOutputs,

    /// A process is already attached.
    #[error("a process is already attached")]
    ProcessAttached,

    /// No process has been started.
    #[error("no process attached; start one first")]
    NoProcess,

    /// The supervisor is in a state that does not allow the operation.
    #[error("cannot {operation}: process is {state}")]
    InvalidState { operation: String, state: String },

    /// The requested standard stream was not piped.
    #[error("{0} is not piped")]
    PipeUnavailable(&'static str),

    /// The process closed its standard input.
    #[error("broken pipe: process stopped reading")]
    BrokenPipe,

    /// Fewer bytes arrived than a full frame needs.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// A queued read did not complete in time.
    #[error("timed out waiting for data")]
    Timeout,

    /// The probed source has no video stream.
    #[error("no video stream in source")]
    NoVideoStream,
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an invalid state error.
    pub fn invalid_state(operation: impl Into<String>, state: impl ToString) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Whether this is a rejected option assignment.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Option(e) if e.is_validation())
    }

    /// Map a spawn failure, turning a missing binary into [`Error::ToolNotFound`].
    pub(crate) fn from_spawn(program: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found(program)
        } else {
            Error::Io(err)
        }
    }
}
