//! Option declarations and per-type schema tables.
//!
//! A schema is built once per container type, usually inside a
//! `std::sync::LazyLock` static, by layering builder calls:
//!
//! ```
//! use ffpipe_options::{Rule, Schema};
//! use std::sync::LazyLock;
//!
//! static CODING: LazyLock<Schema> = LazyLock::new(|| {
//!     Schema::new("coding")
//!         .opt("threads", "threads", Rule::Min(0.0))
//!         .opt("bitrate", "b", Rule::Any)
//! });
//!
//! static VIDEO: LazyLock<Schema> = LazyLock::new(|| {
//!     Schema::new("video").inherit_suffixed(&CODING, ":v")
//! });
//!
//! assert_eq!(VIDEO.spec("bitrate").unwrap().wire, "b:v");
//! ```

use crate::{Rule, Value};
use std::collections::BTreeMap;

/// Declaration of one option.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    /// Logical name used by callers.
    pub key: &'static str,
    /// Flag name passed to the tool, without the leading `-`.
    pub wire: String,
    pub rule: Rule,
    pub default: Option<Value>,
    pub readonly: bool,
    pub doc: &'static str,
}

impl OptionSpec {
    pub fn new(key: &'static str, wire: impl Into<String>, rule: Rule) -> Self {
        Self {
            key,
            wire: wire.into(),
            rule,
            default: None,
            readonly: false,
            doc: "",
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }
}

/// The set of options a container type accepts.
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    specs: BTreeMap<&'static str, OptionSpec>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            specs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Copy every declaration of `parent`. Later calls override earlier ones.
    pub fn inherit(mut self, parent: &Schema) -> Self {
        for (key, spec) in &parent.specs {
            self.specs.insert(*key, spec.clone());
        }
        self
    }

    /// Copy every declaration of `parent`, appending `suffix` to each wire
    /// name that does not already end with it.
    pub fn inherit_suffixed(mut self, parent: &Schema, suffix: &str) -> Self {
        for (key, spec) in &parent.specs {
            let mut spec = spec.clone();
            if !spec.wire.ends_with(suffix) {
                spec.wire.push_str(suffix);
            }
            self.specs.insert(*key, spec);
        }
        self
    }

    /// Declare (or redeclare) an option.
    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.specs.insert(spec.key, spec);
        self
    }

    /// Shorthand for declaring an option with no default.
    pub fn opt(self, key: &'static str, wire: &str, rule: Rule) -> Self {
        self.option(OptionSpec::new(key, wire, rule))
    }

    /// Shorthand for a flag-only option.
    pub fn switch(self, key: &'static str, wire: &str) -> Self {
        self.option(OptionSpec::new(key, wire, Rule::Switch))
    }

    /// Replace the rule and default of an inherited option, keeping its wire
    /// name and doc. The narrowed option is writable.
    ///
    /// Narrowing a key the schema does not have declares it with the key as
    /// wire name.
    pub fn narrow(mut self, key: &'static str, rule: Rule, default: Option<Value>) -> Self {
        let spec = self
            .specs
            .entry(key)
            .or_insert_with(|| OptionSpec::new(key, key, Rule::Any));
        spec.rule = rule;
        spec.default = default;
        spec.readonly = false;
        self
    }

    /// Mark every option read-only.
    pub fn frozen(mut self) -> Self {
        for spec in self.specs.values_mut() {
            spec.readonly = true;
        }
        self
    }

    pub fn spec(&self, key: &str) -> Option<&OptionSpec> {
        self.specs.get(key)
    }

    pub fn specs(&self) -> impl Iterator<Item = &OptionSpec> {
        self.specs.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
