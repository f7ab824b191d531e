//! Token → original value mapping
//!
//! A `Mapping` is produced fresh by every masking call and carried by the
//! caller across the external call boundary. It keeps insertion order (the
//! right-to-left order spans were masked in) and offers keyed lookup.
//! Serializes as a JSON object with entries in insertion order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Ordered association from placeholder token to original literal value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Mapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, returning the previous value if the token existed
    ///
    /// An existing token keeps its original position.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let token = token.into();
        let value = value.into();
        match self.index.get(&token) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(token.clone(), self.entries.len());
                self.entries.push((token, value));
                None
            }
        }
    }

    /// Look up the original value for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.index
            .get(token)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(token, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Iterate tokens in insertion order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut mapping = Mapping::new();
        for (token, value) in iter {
            mapping.insert(token, value);
        }
        mapping
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (token, value) in &self.entries {
            map.serialize_entry(token, value)?;
        }
        map.end()
    }
}

struct MappingVisitor;

impl<'de> Visitor<'de> for MappingVisitor {
    type Value = Mapping;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of placeholder tokens to original values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Mapping, A::Error> {
        let mut mapping = Mapping::new();
        while let Some((token, value)) = access.next_entry::<String, String>()? {
            if mapping.contains_token(&token) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate token '{}'",
                    token
                )));
            }
            mapping.insert(token, value);
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(MappingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut mapping = Mapping::new();
        assert!(mapping.is_empty());
        assert_eq!(mapping.insert("<THAI_ID_1>", "1234567890123"), None);
        assert_eq!(mapping.get("<THAI_ID_1>"), Some("1234567890123"));
        assert_eq!(mapping.get("<THAI_ID_2>"), None);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut mapping = Mapping::new();
        mapping.insert("<A_1>", "x");
        mapping.insert("<B_1>", "y");
        assert_eq!(mapping.insert("<A_1>", "z"), Some("x".to_string()));
        let tokens: Vec<&str> = mapping.tokens().collect();
        assert_eq!(tokens, vec!["<A_1>", "<B_1>"]);
        assert_eq!(mapping.get("<A_1>"), Some("z"));
    }

    #[test]
    fn test_json_preserves_insertion_order() {
        let mapping: Mapping = [
            ("<PERSON_1>", "Somchai"),
            ("<EMAIL_ADDRESS_1>", "a@b.co"),
            ("<PERSON_2>", "Malee"),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(
            json,
            r#"{"<PERSON_1>":"Somchai","<EMAIL_ADDRESS_1>":"a@b.co","<PERSON_2>":"Malee"}"#
        );

        let parsed: Mapping = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mapping);
    }

    #[test]
    fn test_json_duplicate_token_rejected() {
        let result = serde_json::from_str::<Mapping>(r#"{"<A_1>":"x","<A_1>":"y"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_non_string_value_rejected() {
        assert!(serde_json::from_str::<Mapping>(r#"{"<A_1>":1}"#).is_err());
    }
}
