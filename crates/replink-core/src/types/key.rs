use crate::types::Identifier;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

///
/// KeyValue
/// Scalar primary-key attribute value.
///
/// Only the scalar kinds that relational primary keys are built from are
/// representable; payload columns never pass through the link core.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum KeyValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
}

impl KeyValue {
    /// Canonical single-character kind tag used in encoded identifiers.
    const fn tag(&self) -> char {
        match self {
            Self::Bool(_) => 'b',
            Self::Int(_) => 'i',
            Self::Uint(_) => 'u',
            Self::Text(_) => 't',
        }
    }

    fn encode_into(&self, out: &mut String) {
        out.push(self.tag());
        out.push(':');
        match self {
            Self::Bool(v) => out.push_str(if *v { "1" } else { "0" }),
            Self::Int(v) => out.push_str(&v.to_string()),
            Self::Uint(v) => out.push_str(&v.to_string()),
            Self::Text(v) => {
                // Escape the separator characters so encoded tuples stay
                // unambiguous for arbitrary text keys.
                for ch in v.chars() {
                    if matches!(ch, ';' | '=' | '\\') {
                        out.push('\\');
                    }
                    out.push(ch);
                }
            }
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

///
/// PrimaryKey
/// Ordered primary-key tuple (attribute name → scalar value).
///
/// Attribute order is canonicalised by name so the same tuple always
/// encodes to the same [`Identifier`] regardless of insertion order.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PrimaryKey {
    attributes: BTreeMap<String, KeyValue>,
}

impl PrimaryKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: KeyValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: KeyValue) {
        self.attributes.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Encode the tuple into its canonical identifier.
    #[must_use]
    pub fn identifier(&self) -> Identifier {
        let mut out = String::new();
        for (index, (name, value)) in self.attributes.iter().enumerate() {
            if index > 0 {
                out.push(';');
            }
            out.push_str(name);
            out.push('=');
            value.encode_into(&mut out);
        }
        Identifier::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_encoding_is_insertion_order_independent() {
        let a = PrimaryKey::new()
            .with("subject", KeyValue::Uint(12))
            .with("session", KeyValue::Uint(3));
        let b = PrimaryKey::new()
            .with("session", KeyValue::Uint(3))
            .with("subject", KeyValue::Uint(12));
        assert_eq!(a.identifier(), b.identifier());
    }

    #[test]
    fn identifier_encoding_escapes_separator_characters() {
        let tricky = PrimaryKey::new().with("name", KeyValue::Text("a=b;c\\d".into()));
        let plain = PrimaryKey::new().with("name", KeyValue::Text("a=b".into()));
        assert_ne!(tricky.identifier(), plain.identifier());
        assert_eq!(tricky.identifier().as_str(), "name=t:a\\=b\\;c\\\\d");
    }

    #[test]
    fn kind_tags_keep_equal_text_apart() {
        let int = PrimaryKey::new().with("k", KeyValue::Int(1));
        let text = PrimaryKey::new().with("k", KeyValue::Text("1".into()));
        assert_ne!(int.identifier(), text.identifier());
    }
}
