//! Validation rules attached to option specs.

use crate::{FlagSet, ParamSet, Value, ValueKind};

/// Outcome of validating a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Accept and store this (possibly normalized) value.
    Store(Value),
    /// Treat the assignment as "leave the option unset".
    Ignore,
    /// Refuse the value.
    Reject(String),
}

impl Verdict {
    pub fn reject(reason: impl Into<String>) -> Self {
        Verdict::Reject(reason.into())
    }
}

/// A validator for one option.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Accept anything.
    Any,
    /// Value must be one of these kinds.
    Kinds(&'static [ValueKind]),
    /// Numeric value in `[min, max]`.
    Range { min: f64, max: f64 },
    /// Numeric value `>= min`.
    Min(f64),
    /// Numeric value `<= max`.
    Max(f64),
    /// Rendered value must be one of these strings.
    OneOf(&'static [&'static str]),
    /// Only the "no value" marker is accepted; it turns the flag on.
    Switch,
    /// Coerce text or a flag set into a flag set bound to this allow-list.
    Flags(&'static [&'static str]),
    /// Coerce text or a parameter set into a parameter set.
    Params,
    /// Arbitrary validation or normalization.
    Custom(fn(Value) -> Verdict),
    /// Apply rules in order; stop at the first that does not store.
    Chain(Vec<Rule>),
}

fn numeric(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected a number, got {}", value.kind()))
}

impl Rule {
    /// Build a chain from a list of rules.
    pub fn chain(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Chain(rules.into_iter().collect())
    }

    /// Validate `value`.
    pub fn check(&self, value: Value) -> Verdict {
        match self {
            Rule::Any => Verdict::Store(value),

            Rule::Kinds(kinds) => {
                if kinds.contains(&value.kind()) {
                    Verdict::Store(value)
                } else {
                    let names: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                    Verdict::reject(format!(
                        "expected one of [{}], got {}",
                        names.join(", "),
                        value.kind()
                    ))
                }
            }

            Rule::Range { min, max } => match numeric(&value) {
                Ok(x) if x >= *min && x <= *max => Verdict::Store(value),
                Ok(x) => Verdict::reject(format!("{x} is outside [{min}, {max}]")),
                Err(reason) => Verdict::Reject(reason),
            },

            Rule::Min(min) => match numeric(&value) {
                Ok(x) if x >= *min => Verdict::Store(value),
                Ok(x) => Verdict::reject(format!("{x} is below the minimum {min}")),
                Err(reason) => Verdict::Reject(reason),
            },

            Rule::Max(max) => match numeric(&value) {
                Ok(x) if x <= *max => Verdict::Store(value),
                Ok(x) => Verdict::reject(format!("{x} is above the maximum {max}")),
                Err(reason) => Verdict::Reject(reason),
            },

            Rule::OneOf(allowed) => match value.render() {
                Some(rendered) if allowed.contains(&rendered.as_str()) => Verdict::Store(value),
                Some(rendered) => {
                    Verdict::reject(format!("`{rendered}` is not one of {allowed:?}"))
                }
                None => Verdict::reject(format!("expected one of {allowed:?}")),
            },

            Rule::Switch => match value {
                Value::Switch => Verdict::Store(Value::Switch),
                other => Verdict::reject(format!(
                    "takes no argument, got {}; set the switch value to enable it",
                    other.kind()
                )),
            },

            Rule::Flags(allowed) => {
                let parsed = match &value {
                    Value::Text(expr) => FlagSet::parse_with(expr, *allowed),
                    Value::Flags(flags) => flags.rebind(*allowed),
                    other => return Verdict::reject(format!("expected flags, got {}", other.kind())),
                };
                match parsed {
                    Ok(flags) => Verdict::Store(Value::Flags(flags)),
                    Err(e) => Verdict::Reject(e.to_string()),
                }
            }

            Rule::Params => match value {
                Value::Text(conf) => match conf.parse::<ParamSet>() {
                    Ok(params) => Verdict::Store(Value::Params(params)),
                    Err(e) => Verdict::Reject(e.to_string()),
                },
                Value::Params(params) => Verdict::Store(Value::Params(params)),
                other => Verdict::reject(format!("expected parameters, got {}", other.kind())),
            },

            Rule::Custom(func) => func(value),

            Rule::Chain(rules) => {
                let mut current = value;
                for rule in rules {
                    match rule.check(current) {
                        Verdict::Store(next) => current = next,
                        verdict => return verdict,
                    }
                }
                Verdict::Store(current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn positive_only(value: Value) -> Verdict {
        match value.as_i64() {
            Some(n) if n > 0 => Verdict::Store(Value::Text(format!("{n}k"))),
            _ => Verdict::reject("must be positive"),
        }
    }

    #[test]
    fn test_range_is_inclusive() {
        let rule = Rule::Range { min: 0.0, max: 51.0 };
        assert_matches!(rule.check(Value::Int(0)), Verdict::Store(_));
        assert_matches!(rule.check(Value::Int(51)), Verdict::Store(_));
        assert_matches!(rule.check(Value::Float(51.5)), Verdict::Reject(_));
        assert_matches!(rule.check(Value::from("10")), Verdict::Reject(_));
    }

    #[test]
    fn test_one_of_compares_rendered_value() {
        let rule = Rule::OneOf(&["-1", "0", "normal"]);
        assert_matches!(rule.check(Value::Int(-1)), Verdict::Store(_));
        assert_matches!(rule.check(Value::from("normal")), Verdict::Store(_));
        assert_matches!(rule.check(Value::from("strict")), Verdict::Reject(_));
    }

    #[test]
    fn test_switch_only_accepts_marker() {
        assert_eq!(Rule::Switch.check(Value::Switch), Verdict::Store(Value::Switch));
        assert_matches!(Rule::Switch.check(Value::Bool(true)), Verdict::Reject(_));
    }

    #[test]
    fn test_flags_coerce_text() {
        let rule = Rule::Flags(&["a", "b"]);
        let verdict = rule.check(Value::from("-b+a"));
        assert_matches!(verdict, Verdict::Store(Value::Flags(ref f)) if f.compile() == "+a-b");
        assert_matches!(rule.check(Value::from("+c")), Verdict::Reject(_));
    }

    #[test]
    fn test_chain_short_circuits() {
        let rule = Rule::chain([
            Rule::Kinds(&[ValueKind::Int]),
            Rule::Custom(positive_only),
            Rule::OneOf(&["1k", "2k"]),
        ]);
        assert_eq!(rule.check(Value::Int(2)), Verdict::Store(Value::from("2k")));
        assert_matches!(rule.check(Value::Int(3)), Verdict::Reject(ref r) if r.contains("3k"));
        assert_matches!(rule.check(Value::Int(-3)), Verdict::Reject(ref r) if r == "must be positive");
        assert_matches!(rule.check(Value::from("2")), Verdict::Reject(ref r) if r.contains("int"));
    }

    #[test]
    fn test_custom_ignore_passes_through_chain() {
        fn ignore_false(value: Value) -> Verdict {
            match value {
                Value::Bool(false) => Verdict::Ignore,
                other => Verdict::Store(other),
            }
        }
        let rule = Rule::chain([Rule::Custom(ignore_false), Rule::Kinds(&[ValueKind::Int])]);
        assert_eq!(rule.check(Value::Bool(false)), Verdict::Ignore);
    }
}
