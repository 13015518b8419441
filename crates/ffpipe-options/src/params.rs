//! `key=value:key=value` parameter blobs (`-x264opts`, `-x265-params`, ...).

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = ':';
const SETTER: char = '=';

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.trim().to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::from(s.as_str())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Int(n.into())
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

/// Mapping of parameter names to scalar values.
///
/// Keys are kept sorted so the compiled string does not depend on the order
/// parameters were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a parameter, failing if it is absent.
    pub fn remove(&mut self, key: &str) -> Result<ParamValue> {
        self.entries
            .remove(key)
            .ok_or_else(|| Error::NotSet {
                key: key.to_string(),
            })
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Overlay every entry of `other` onto this set.
    pub fn merge(&mut self, other: &ParamSet) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Overlay a pre-formatted `k=v:k2=v2` string. Nothing is applied if any
    /// pair is malformed.
    pub fn merge_str(&mut self, conf: &str) -> Result<()> {
        let parsed: ParamSet = conf.parse()?;
        self.merge(&parsed);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as `key=value` pairs joined by `:`.
    pub fn compile(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}{SETTER}{v}"))
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string())
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

impl FromStr for ParamSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut set = ParamSet::new();
        if s.trim().is_empty() {
            return Ok(set);
        }

        for pair in s.split(SEPARATOR) {
            match pair.split_once(SETTER) {
                Some((k, v)) if !k.trim().is_empty() && !v.contains(SETTER) => {
                    set.insert(k.trim(), v);
                }
                _ => return Err(Error::MalformedParams(pair.to_string())),
            }
        }
        Ok(set)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}
