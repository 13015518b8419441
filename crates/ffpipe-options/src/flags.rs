//! Signed flag sets such as `+faststart-empty_moov`.
//!
//! ffmpeg accepts a flag option as a chain of `+name` (set) and `-name` (clear)
//! tokens. A [`FlagSet`] keeps both halves, optionally restricted to an
//! allow-list, and always compiles to the same canonical string for the same
//! logical contents.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const POSITIVE: char = '+';
const NEGATIVE: char = '-';

/// Which half of a flag set a flag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// `+flag`: enable.
    Positive,
    /// `-flag`: disable.
    Negative,
}

/// Split a flag expression on sign boundaries.
///
/// The first token may be unsigned, in which case it is positive. A leading
/// sign is never treated as a boundary, so `"-a"` is one token.
fn split_flags(expr: &str) -> Vec<(Sign, &str)> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, ch) in expr.char_indices().skip(1) {
        if ch == POSITIVE || ch == NEGATIVE {
            tokens.push(&expr[start..idx]);
            start = idx;
        }
    }
    tokens.push(&expr[start..]);

    tokens
        .into_iter()
        .map(|token| {
            if let Some(name) = token.strip_prefix(NEGATIVE) {
                (Sign::Negative, name)
            } else if let Some(name) = token.strip_prefix(POSITIVE) {
                (Sign::Positive, name)
            } else {
                (Sign::Positive, token)
            }
        })
        .collect()
}

/// A set of signed flags with an optional vocabulary.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    positive: BTreeSet<String>,
    negative: BTreeSet<String>,
    allowed: Option<&'static [&'static str]>,
}

impl FlagSet {
    /// An empty, unrestricted flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty flag set that only accepts flags from `allowed`.
    pub fn with_allowed(allowed: &'static [&'static str]) -> Self {
        Self {
            allowed: Some(allowed),
            ..Self::default()
        }
    }

    /// Parse `expr` into a fresh set bound to `allowed`.
    pub fn parse_with(expr: &str, allowed: &'static [&'static str]) -> Result<Self> {
        let mut set = Self::with_allowed(allowed);
        if !expr.is_empty() {
            set.add(expr)?;
        }
        Ok(set)
    }

    /// The allow-list this set is bound to, if any.
    pub fn allowed(&self) -> Option<&'static [&'static str]> {
        self.allowed
    }

    /// Copy the contents of this set into a new set bound to `allowed`,
    /// validating every flag against it.
    pub fn rebind(&self, allowed: &'static [&'static str]) -> Result<Self> {
        Self::parse_with(&self.compile(), allowed)
    }

    fn check(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::unknown_flag(name));
        }
        if let Some(allowed) = self.allowed {
            if !allowed.contains(&name) {
                return Err(Error::LimitedFlag {
                    flag: name.to_string(),
                    allowed: allowed.to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Add every flag of a signed expression like `"+a-b+c"`.
    ///
    /// A flag already present in the opposite half moves to the new half.
    /// Nothing is changed if any flag in the expression is rejected.
    pub fn add(&mut self, expr: &str) -> Result<()> {
        let tokens = split_flags(expr);
        for (_, name) in &tokens {
            self.check(name)?;
        }

        for (sign, name) in tokens {
            self.positive.remove(name);
            self.negative.remove(name);
            match sign {
                Sign::Positive => self.positive.insert(name.to_string()),
                Sign::Negative => self.negative.insert(name.to_string()),
            };
        }
        Ok(())
    }

    /// Remove every flag named in the expression from whichever half holds it.
    ///
    /// Fails without changing anything if any named flag is absent.
    pub fn remove(&mut self, expr: &str) -> Result<()> {
        let tokens = split_flags(expr);
        for (_, name) in &tokens {
            if name.is_empty() || self.sign_of(name).is_none() {
                return Err(Error::unknown_flag(*name));
            }
        }

        for (_, name) in tokens {
            self.positive.remove(name);
            self.negative.remove(name);
        }
        Ok(())
    }

    /// Which half holds `name`, if any.
    pub fn sign_of(&self, name: &str) -> Option<Sign> {
        if self.positive.contains(name) {
            Some(Sign::Positive)
        } else if self.negative.contains(name) {
            Some(Sign::Negative)
        } else {
            None
        }
    }

    /// Whether `name` is present with either sign.
    pub fn contains(&self, name: &str) -> bool {
        self.sign_of(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    /// Positive flags in sorted order.
    pub fn positive(&self) -> impl Iterator<Item = &str> {
        self.positive.iter().map(String::as_str)
    }

    /// Negative flags in sorted order.
    pub fn negative(&self) -> impl Iterator<Item = &str> {
        self.negative.iter().map(String::as_str)
    }

    /// Canonical form: `+a+b` then `-c-d`, each half sorted.
    pub fn compile(&self) -> String {
        let mut out = String::new();
        for name in &self.positive {
            out.push(POSITIVE);
            out.push_str(name);
        }
        for name in &self.negative {
            out.push(NEGATIVE);
            out.push_str(name);
        }
        out
    }

    /// Canonical form without the leading `+`.
    ///
    /// ffmpeg resets a flag option to empty before applying a value that starts
    /// with `+`; this form keeps the tool's own defaults.
    pub fn compile_unreset(&self) -> String {
        let compiled = self.compile();
        match compiled.strip_prefix(POSITIVE) {
            Some(rest) => rest.to_string(),
            None => compiled,
        }
    }
}

impl PartialEq for FlagSet {
    fn eq(&self, other: &Self) -> bool {
        self.compile() == other.compile()
    }
}

impl Eq for FlagSet {}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

impl FromStr for FlagSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut set = Self::new();
        if !s.is_empty() {
            set.add(s)?;
        }
        Ok(set)
    }
}
