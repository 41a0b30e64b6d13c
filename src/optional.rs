//! A value that may be entirely absent from a payload.
//!
//! `Optional<T>` is distinct from `Option<T>`: `Optional<Option<T>>` tells apart a field
//! that was left out (`Absent`) from one sent as an explicit `null` (`Present(None)`).
//! Pair it with `#[serde(default, skip_serializing_if = "Optional::is_absent")]` on
//! struct fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Optional<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Optional<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Optional::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        !self.is_set()
    }

    /// Borrows the value, `None` when absent.
    pub fn get(&self) -> Option<&T> {
        match self {
            Optional::Present(value) => Some(value),
            Optional::Absent => None,
        }
    }

    pub fn get_or(self, default: T) -> T {
        match self {
            Optional::Present(value) => value,
            Optional::Absent => default,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Optional::Present(value) => Some(value),
            Optional::Absent => None,
        }
    }

    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Optional::Present(value) => Optional::Present(value),
            Optional::Absent => Optional::Absent,
        }
    }
}

impl<T: Default> Optional<T> {
    pub fn get_or_default(self) -> T {
        self.get_or(T::default())
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Optional::Present(value)
    }
}

impl<T: fmt::Display> fmt::Display for Optional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Optional::Present(value) => value.fmt(f),
            Optional::Absent => write!(f, "undefined"),
        }
    }
}

impl<T: Serialize> Serialize for Optional<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Optional::Present(value) => value.serialize(serializer),
            Optional::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Optional<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Optional::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Patch {
        #[serde(default, skip_serializing_if = "Optional::is_absent")]
        name: Optional<Option<String>>,
        #[serde(default, skip_serializing_if = "Optional::is_absent")]
        age: Optional<u32>,
    }

    #[test]
    fn test_missing_null_and_value_are_distinct() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert!(missing.name.is_absent());

        let null: Patch = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(null.name, Optional::Present(None));

        let set: Patch = serde_json::from_str(r#"{"name": "Ann", "age": 3}"#).unwrap();
        assert_eq!(set.name, Optional::Present(Some("Ann".to_string())));
        assert_eq!(set.age.get(), Some(&3));
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let patch = Patch {
            name: Optional::Present(None),
            age: Optional::Absent,
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"name":null}"#);
    }

    #[test]
    fn test_accessors() {
        let absent: Optional<u32> = Optional::Absent;
        assert!(!absent.is_set());
        assert_eq!(absent.get_or(4), 4);
        assert_eq!(absent.get_or_default(), 0);
        assert_eq!(Optional::from(7).get_or_default(), 7);
        assert_eq!(absent.to_string(), "undefined");
        assert_eq!(Optional::Present(5).to_string(), "5");
    }
}
