use serde::Serialize;
use shared::domain::{FieldValue, FormState};

/// Declarative visibility rule for a field, evaluated against an explicit snapshot of the
/// form it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum ShowIf {
    Truthy(&'static str),
    Equals(&'static str, FieldValue),
    Not(Box<ShowIf>),
    All(Vec<ShowIf>),
    Any(Vec<ShowIf>),
}

/// The predicate referenced a key the form state does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl ShowIf {
    pub fn truthy(key: &'static str) -> Self {
        ShowIf::Truthy(key)
    }

    pub fn equals(key: &'static str, value: FieldValue) -> Self {
        ShowIf::Equals(key, value)
    }

    pub fn negate(self) -> Self {
        ShowIf::Not(Box::new(self))
    }

    /// Every branch is evaluated so a dangling reference fails even when another branch
    /// already decided the outcome.
    pub fn evaluate(&self, state: &FormState) -> Result<bool, MissingField> {
        match self {
            ShowIf::Truthy(key) => state.is_truthy(key).ok_or(MissingField(*key)),
            ShowIf::Equals(key, expected) => state
                .get(key)
                .map(|value| value == *expected)
                .ok_or(MissingField(*key)),
            ShowIf::Not(inner) => inner.evaluate(state).map(|visible| !visible),
            ShowIf::All(rules) => rules
                .iter()
                .map(|rule| rule.evaluate(state))
                .collect::<Result<Vec<_>, _>>()
                .map(|results| results.into_iter().all(|visible| visible)),
            ShowIf::Any(rules) => rules
                .iter()
                .map(|rule| rule.evaluate(state))
                .collect::<Result<Vec<_>, _>>()
                .map(|results| results.into_iter().any(|visible| visible)),
        }
    }

    pub fn referenced_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, keys: &mut Vec<&'static str>) {
        match self {
            ShowIf::Truthy(key) | ShowIf::Equals(key, _) => {
                if !keys.contains(key) {
                    keys.push(*key);
                }
            }
            ShowIf::Not(inner) => inner.collect_keys(keys),
            ShowIf::All(rules) | ShowIf::Any(rules) => {
                for rule in rules {
                    rule.collect_keys(keys);
                }
            }
        }
    }
}
