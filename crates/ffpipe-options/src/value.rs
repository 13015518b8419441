//! Values stored in an options container.

use crate::{FlagSet, Options, ParamSet};
use std::fmt;

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Flag present with no argument (`-an`, `-hide_banner`).
    Switch,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Flags(FlagSet),
    Params(ParamSet),
    /// A nested container whose arguments are expanded in place.
    Nested(Box<Options>),
}

/// Discriminant of a [`Value`], used by type-membership rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Switch,
    Bool,
    Int,
    Float,
    Text,
    Flags,
    Params,
    Nested,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Switch => "switch",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Flags => "flags",
            ValueKind::Params => "params",
            ValueKind::Nested => "options",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Switch => ValueKind::Switch,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Flags(_) => ValueKind::Flags,
            Value::Params(_) => ValueKind::Params,
            Value::Nested(_) => ValueKind::Nested,
        }
    }

    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_flags(&self) -> Option<&FlagSet> {
        match self {
            Value::Flags(flags) => Some(flags),
            _ => None,
        }
    }

    pub fn as_params(&self) -> Option<&ParamSet> {
        match self {
            Value::Params(params) => Some(params),
            _ => None,
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Value::Switch)
    }

    /// Whether serializing this value would produce nothing.
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Value::Flags(flags) => flags.is_empty(),
            Value::Params(params) => params.is_empty(),
            _ => false,
        }
    }

    /// The argument that follows `-<wire>`, or `None` for a bare switch and
    /// for nested containers.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Switch | Value::Nested(_) => None,
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(x) => Some(x.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Flags(flags) => Some(flags.compile()),
            Value::Params(params) => Some(params.compile()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Switch => f.write_str("<switch>"),
            Value::Nested(options) => write!(f, "{}", options.to_ordered_args().join(" ")),
            other => f.write_str(&other.render().unwrap_or_default()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<FlagSet> for Value {
    fn from(flags: FlagSet) -> Self {
        Value::Flags(flags)
    }
}

impl From<ParamSet> for Value {
    fn from(params: ParamSet) -> Self {
        Value::Params(params)
    }
}

impl From<Options> for Value {
    fn from(options: Options) -> Self {
        Value::Nested(Box::new(options))
    }
}
