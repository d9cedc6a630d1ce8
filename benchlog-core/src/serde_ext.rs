//! Serde helpers for sparse update payloads.

use serde::{Deserialize, Deserializer};

/// Wrap any present value in `Some`, so a missing field (via `#[serde(default)]`)
/// and an explicit `null` stay distinguishable for `Option<Option<T>>` fields.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Sparse {
        #[serde(default, deserialize_with = "deserialize_some")]
        sop_id: Option<Option<i64>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() -> Result<(), serde_json::Error> {
        let absent: Sparse = serde_json::from_str("{}")?;
        let null: Sparse = serde_json::from_str(r#"{"sop_id": null}"#)?;
        let value: Sparse = serde_json::from_str(r#"{"sop_id": 4}"#)?;

        assert_eq!(absent.sop_id, None);
        assert_eq!(null.sop_id, Some(None));
        assert_eq!(value.sop_id, Some(Some(4)));
        Ok(())
    }
}
