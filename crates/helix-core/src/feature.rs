//! A feature is an annotated region of a sequence: a key (`CDS`, `gene`,
//! ...), a [`Location`], and its `/key=value` qualifiers.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// A `/key=value` (or bare `/key`) feature annotation.
///
/// A bare flag (`/pseudo`) has `value: None`. Quoted values retain their
/// surrounding quotes; stripping them is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl Qualifier {
    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub key: String,
    pub location: Location,
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
}

impl Feature {
    pub fn new(key: impl Into<String>, location: Location) -> Self {
        Self {
            key: key.into(),
            location,
            qualifiers: Vec::new(),
        }
    }

    /// `Some(None)` for a bare flag, `Some(Some(v))` for a valued
    /// qualifier, `None` if no qualifier with this key is present.
    pub fn get_qualifier(&self, key: &str) -> Option<Option<&str>> {
        self.qualifiers
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.value.as_deref())
    }

    pub fn add_qualifier(&mut self, key: impl Into<String>, value: Option<String>) {
        self.qualifiers.push(Qualifier { key: key.into(), value });
    }
}
