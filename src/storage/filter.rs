//! Filter expressions understood by the document store.
//!
//! A [`FetchQuery`] is an ordered list of [`Filter`] alternatives combined with
//! logical OR. Each filter is a conjunction of per-field conditions.

use crate::core::Document;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    /// Substring match on string fields, element match on arrays of strings.
    Contains(String),
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Condition::Equals(expected), Some(actual)) => values_equal(expected, actual),
            (Condition::Equals(_), None) => false,
            (Condition::Contains(needle), Some(Value::String(text))) => {
                text.contains(needle.as_str())
            }
            (Condition::Contains(needle), Some(Value::Array(items))) => items
                .iter()
                .any(|item| item.as_str() == Some(needle.as_str())),
            (Condition::Contains(_), _) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Equals(value.into())));
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions
            .push((field.into(), Condition::Contains(needle.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has_contains(&self) -> bool {
        self.conditions
            .iter()
            .any(|(_, condition)| matches!(condition, Condition::Contains(_)))
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(lookup(document, field)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchQuery {
    alternatives: Vec<Filter>,
}

impl FetchQuery {
    /// Matches every document of the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn any_of(alternatives: Vec<Filter>) -> Self {
        Self { alternatives }
    }

    pub fn alternatives(&self) -> &[Filter] {
        &self.alternatives
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.alternatives.is_empty()
            || self
                .alternatives
                .iter()
                .any(|filter| filter.matches(document))
    }
}

impl From<Filter> for FetchQuery {
    fn from(filter: Filter) -> Self {
        Self {
            alternatives: vec![filter],
        }
    }
}

/// Resolves a dotted field path inside a document.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}
