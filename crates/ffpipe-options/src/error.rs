//! Error types for ffpipe-options.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or mutating option containers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A validator rejected the value.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },

    /// The schema declares no option with this key.
    #[error("unknown option `{key}` for {schema}")]
    UnknownOption { key: String, schema: String },

    /// The option is frozen and cannot be changed.
    #[error("option `{key}` is read-only")]
    ReadOnly { key: String },

    /// Strict unset of an option that holds no value.
    #[error("option `{key}` is not set")]
    NotSet { key: String },

    /// Empty or missing flag in a flag expression.
    #[error("unknown flag `{flag}`")]
    UnknownFlag { flag: String },

    /// Flag outside the configured allow-list.
    #[error("flag `{flag}` is not one of {allowed:?}")]
    LimitedFlag {
        flag: String,
        allowed: Vec<&'static str>,
    },

    /// A `key=value` pair could not be parsed.
    #[error("malformed parameter `{0}`, expected key=value")]
    MalformedParams(String),
}

impl Error {
    /// Create a validation error.
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown flag error.
    pub fn unknown_flag(flag: impl Into<String>) -> Self {
        Self::UnknownFlag { flag: flag.into() }
    }

    /// Whether this error came from rejecting a value (as opposed to a structural misuse).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Invalid { .. }
                | Self::UnknownFlag { .. }
                | Self::LimitedFlag { .. }
                | Self::MalformedParams(_)
        )
    }
}
