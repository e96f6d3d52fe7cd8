use serde::Serialize;
use serde_json::Value;

use crate::forms::rules::Rule;

/// How a field is rendered and how its raw input is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Hidden integer (record ids).
    Hidden,
    Text,
    Password,
    Integer,
    Checkbox,
    /// Single foreign-key choice, coerced to an integer id.
    Select,
    /// Many foreign-key choices, coerced to integer ids.
    MultiSelect,
}

/// Static definition of a form field.
#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
    pub default: Initial,
    pub description: Option<&'static str>,
}

/// Compile-time default for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initial {
    None,
    Int(i64),
    Bool(bool),
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Int(i64),
    Bool(bool),
    Ids(Vec<i64>),
}

impl FieldValue {
    pub fn from_default(kind: FieldKind, default: Initial) -> Self {
        match (kind, default) {
            (_, Initial::Int(n)) => FieldValue::Int(n),
            (_, Initial::Bool(b)) => FieldValue::Bool(b),
            (FieldKind::Checkbox, Initial::None) => FieldValue::Bool(false),
            (FieldKind::MultiSelect, Initial::None) => FieldValue::Ids(Vec::new()),
            (_, Initial::None) => FieldValue::Empty,
        }
    }

    /// JSON representation sent to the API. Blank values become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Ids(ids) => Value::from(ids.clone()),
        }
    }

    /// Interpret an API value for a field of the given kind.
    pub fn from_json(kind: FieldKind, value: &Value) -> Self {
        match kind {
            FieldKind::Checkbox => FieldValue::Bool(match value {
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
                Value::String(s) => matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                _ => false,
            }),
            FieldKind::Hidden | FieldKind::Integer | FieldKind::Select => {
                json_int(value).map_or(FieldValue::Empty, FieldValue::Int)
            }
            FieldKind::MultiSelect => match value {
                Value::Array(items) => FieldValue::Ids(items.iter().filter_map(json_int).collect()),
                other => FieldValue::Ids(json_int(other).into_iter().collect()),
            },
            FieldKind::Text | FieldKind::Password => match value {
                Value::Null => FieldValue::Empty,
                Value::String(s) => FieldValue::Text(s.clone()),
                other => FieldValue::Text(other.to_string()),
            },
        }
    }

    /// String shown in a text input.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Empty | FieldValue::Ids(_) => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> &[i64] {
        match self {
            FieldValue::Ids(ids) => ids,
            _ => &[],
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        match self {
            FieldValue::Int(n) => *n == id,
            FieldValue::Ids(ids) => ids.contains(&id),
            _ => false,
        }
    }
}

fn json_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One option of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}
