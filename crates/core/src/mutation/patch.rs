//! Per-field change marker used by every change set.
//!
//! A field missing from the request body deserializes to `Unchanged` (via
//! `#[serde(default)]` on the containing struct). A field that is present
//! deserializes to `Set`. Nullable columns use `Patch<Option<T>>`, so an
//! explicit JSON `null` becomes `Set(None)` and clears the column.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Unchanged,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

/// `Unchanged` serializes as `null`; pair with
/// `skip_serializing_if = "Patch::is_unchanged"` to omit it instead.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Unchanged => serializer.serialize_none(),
            Patch::Set(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, Serialize)]
    #[serde(default)]
    struct Probe {
        #[serde(skip_serializing_if = "Patch::is_unchanged")]
        title: Patch<String>,
        #[serde(skip_serializing_if = "Patch::is_unchanged")]
        subtitle: Patch<Option<String>>,
    }

    #[test]
    fn absent_field_is_unchanged() {
        let probe: Probe = serde_json::from_str("{}").unwrap();
        assert!(probe.title.is_unchanged());
        assert!(probe.subtitle.is_unchanged());
    }

    #[test]
    fn explicit_null_clears_nullable_field() {
        let probe: Probe = serde_json::from_str(r#"{"subtitle": null}"#).unwrap();
        assert!(probe.title.is_unchanged());
        assert_eq!(probe.subtitle, Patch::Set(None));
    }

    #[test]
    fn empty_string_is_a_value_not_an_absence() {
        let probe: Probe = serde_json::from_str(r#"{"subtitle": ""}"#).unwrap();
        assert_eq!(probe.subtitle, Patch::Set(Some(String::new())));
    }

    #[test]
    fn null_is_rejected_for_required_field() {
        let result: Result<Probe, _> = serde_json::from_str(r#"{"title": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unchanged_fields_are_omitted_when_serialized() {
        let probe = Probe {
            title: Patch::Set("Home".to_string()),
            subtitle: Patch::Unchanged,
        };
        let json = serde_json::to_value(&probe).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "Home" }));
    }
}
