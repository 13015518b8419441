//! The options container: validated values bound to a schema.

use crate::{Error, OptionSpec, Result, Schema, Value, Verdict};
use std::collections::BTreeMap;
use std::fmt;

/// What a successful `set` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The value was stored.
    Stored,
    /// The validator asked for the option to stay unset; any previous value was cleared.
    Ignored,
}

/// How an option currently gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Explicitly set.
    Explicit,
    /// Not set, but the schema declares a default.
    Default,
    /// Not set and no default.
    Absent,
}

/// One serialized attribute, sortable by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub key: String,
    pub args: Vec<String>,
}

impl Fragment {
    pub fn new(key: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }
}

/// Sort fragments by key and concatenate their arguments.
pub fn assemble(mut fragments: Vec<Fragment>) -> Vec<String> {
    fragments.sort_by(|a, b| a.key.cmp(&b.key));
    fragments.into_iter().flat_map(|f| f.args).collect()
}

/// Values for the options declared by a schema.
#[derive(Debug, Clone)]
pub struct Options {
    schema: &'static Schema,
    values: BTreeMap<&'static str, Value>,
}

impl Options {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    fn spec(&self, key: &str) -> Result<&'static OptionSpec> {
        self.schema.spec(key).ok_or_else(|| Error::UnknownOption {
            key: key.to_string(),
            schema: self.schema.name().to_string(),
        })
    }

    /// Validate and store a value.
    ///
    /// On any error the container is left exactly as it was.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Outcome> {
        let spec = self.spec(key)?;
        if spec.readonly {
            return Err(Error::ReadOnly {
                key: spec.key.to_string(),
            });
        }

        match spec.rule.check(value.into()) {
            Verdict::Store(value) => {
                self.values.insert(spec.key, value);
                Ok(Outcome::Stored)
            }
            Verdict::Ignore => {
                self.values.remove(spec.key);
                Ok(Outcome::Ignored)
            }
            Verdict::Reject(reason) => Err(Error::invalid(spec.key, reason)),
        }
    }

    /// The stored value, or the declared default.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let spec = self.schema.spec(key)?;
        self.values.get(spec.key).or(spec.default.as_ref())
    }

    /// Remove an explicitly set value.
    ///
    /// Fails if the option is read-only or holds no explicit value.
    pub fn unset(&mut self, key: &str) -> Result<Value> {
        let spec = self.spec(key)?;
        if spec.readonly {
            return Err(Error::ReadOnly {
                key: spec.key.to_string(),
            });
        }
        self.values.remove(spec.key).ok_or_else(|| Error::NotSet {
            key: spec.key.to_string(),
        })
    }

    /// Whether the option was explicitly set.
    pub fn is_set(&self, key: &str) -> bool {
        self.presence(key) == Presence::Explicit
    }

    /// Whether `get` would return a value.
    pub fn contains(&self, key: &str) -> bool {
        self.presence(key) != Presence::Absent
    }

    pub fn presence(&self, key: &str) -> Presence {
        match self.schema.spec(key) {
            Some(spec) if self.values.contains_key(spec.key) => Presence::Explicit,
            Some(spec) if spec.default.is_some() => Presence::Default,
            _ => Presence::Absent,
        }
    }

    /// Effective values (explicit or default) with their specs, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static OptionSpec, &Value)> + '_ {
        self.schema.specs().filter_map(move |spec| {
            self.values
                .get(spec.key)
                .or(spec.default.as_ref())
                .map(|value| (spec, value))
        })
    }

    /// One fragment per effective value, keyed by wire name.
    ///
    /// Empty flag and parameter sets serialize to nothing and are skipped.
    pub fn fragments(&self) -> Vec<Fragment> {
        self.iter()
            .filter(|(_, value)| !value.is_blank())
            .map(|(spec, value)| {
                let args = match value {
                    Value::Nested(inner) => inner.to_ordered_args(),
                    other => {
                        let mut args = vec![format!("-{}", spec.wire)];
                        args.extend(other.render());
                        args
                    }
                };
                Fragment::new(spec.wire.clone(), args)
            })
            .collect()
    }

    /// The argument vector for this container, ordered by wire name.
    pub fn to_ordered_args(&self) -> Vec<String> {
        assemble(self.fragments())
    }
}

impl PartialEq for Options {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.schema, other.schema) && self.values == other.values
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.schema.name(), self.to_ordered_args().join(" "))
    }
}
