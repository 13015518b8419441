//! # ffpipe-options
//!
//! Declarative option schemas for command-line tools.
//!
//! This crate provides:
//! - [`FlagSet`]: signed `+a-b` flag collections with an optional vocabulary
//! - [`ParamSet`]: `key=value:key=value` parameter blobs
//! - [`Rule`] / [`Verdict`]: composable validators
//! - [`Schema`]: per-type option tables with inheritance, narrowing and wire-name suffixing
//! - [`Options`]: a container that validates every assignment and serializes
//!   to a deterministic argument vector
//!
//! ## Example
//!
//! ```
//! use ffpipe_options::{Options, Rule, Schema, Value};
//! use std::sync::LazyLock;
//!
//! static OUTPUT: LazyLock<Schema> = LazyLock::new(|| {
//!     Schema::new("output")
//!         .switch("no_audio", "an")
//!         .opt("duration", "t", Rule::Min(0.0))
//! });
//!
//! let mut opts = Options::new(&OUTPUT);
//! opts.set("duration", 30)?;
//! opts.set("no_audio", Value::Switch)?;
//! assert_eq!(opts.to_ordered_args(), ["-an", "-t", "30"]);
//! # Ok::<(), ffpipe_options::Error>(())
//! ```

mod error;
pub mod flags;
mod options;
pub mod params;
mod rule;
mod schema;
mod value;

// Re-exports
pub use error::{Error, Result};
pub use flags::{FlagSet, Sign};
pub use options::{assemble, Fragment, Options, Outcome, Presence};
pub use params::{ParamSet, ParamValue};
pub use rule::{Rule, Verdict};
pub use schema::{OptionSpec, Schema};
pub use value::{Value, ValueKind};
