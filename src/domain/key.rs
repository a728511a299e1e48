//! Scalar identifiers: entry keys, branch names and relation values

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::error::{DomainError, DomainResult};

/// Opaque scalar identifier of an entry.
///
/// `Int(8)` and `Str("8")` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Interpret a dynamic value as a key. Strings and integers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(value: $t) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

key_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&Key> for Key {
    fn from(value: &Key) -> Self {
        value.clone()
    }
}

/// Validated name of a declared branch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    /// Accept scalar values only: strings, numbers and booleans.
    ///
    /// Non-string scalars name the branch the way array keys coerce them:
    /// `true` is `"1"`, `false` is `"0"` and floats truncate to integers.
    ///
    /// `index` is the position in the declared branch list and is carried
    /// into the error so construction failures point at the culprit.
    pub fn from_value(value: &Value, index: Option<usize>) -> DomainResult<Self> {
        match value {
            Value::String(s) => Ok(Self(s.clone())),
            Value::Number(n) => Ok(Self(match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => i.to_string(),
                (None, Some(u), _) => u.to_string(),
                (None, None, Some(f)) => format!("{}", f.trunc() as i64),
                (None, None, None) => n.to_string(),
            })),
            Value::Bool(b) => Ok(Self(if *b { "1" } else { "0" }.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                Err(DomainError::not_scalar(index))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Relation value as supplied in an attribute bag: one id or a list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relation {
    One(Key),
    Many(Vec<Key>),
}

impl Relation {
    /// Read a relation from a dynamic attribute value.
    ///
    /// `null` reads as an empty list. Elements that cannot be keys are dropped.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Many(Vec::new()),
            Value::Array(items) => Self::Many(keys_of(items.iter())),
            Value::Object(map) => Self::Many(keys_of(map.values())),
            scalar => match Key::from_value(scalar) {
                Some(key) => Self::One(key),
                None => {
                    warn!(value = %scalar, "Dropping relation value that is not a key");
                    Self::Many(Vec::new())
                }
            },
        }
    }

    /// Normalized form: always a list.
    pub fn into_keys(self) -> Vec<Key> {
        match self {
            Self::One(key) => vec![key],
            Self::Many(keys) => keys,
        }
    }
}

fn keys_of<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Key> {
    values
        .filter_map(|v| {
            let key = Key::from_value(v);
            if key.is_none() {
                warn!(value = %v, "Dropping relation value that is not a key");
            }
            key
        })
        .collect()
}

impl From<Key> for Relation {
    fn from(value: Key) -> Self {
        Self::One(value)
    }
}

impl<K: Into<Key>> From<Vec<K>> for Relation {
    fn from(values: Vec<K>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}
