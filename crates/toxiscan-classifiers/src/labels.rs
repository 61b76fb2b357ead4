//! Label mapping and toxic class detection

use serde::de::{self, Deserialize, Deserializer, MapAccess, Unexpected, Visitor};
use std::fmt;

/// Class index assumed to be toxic when no label names it
pub const DEFAULT_TOXIC_INDEX: usize = 1;

const TOXIC_MARKER: &str = "toxic";

/// Ordered mapping from class index to label name.
///
/// Entries keep the order they appear in the model's `id2label`, which is
/// the order [`detect_toxic_index`] scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMapping {
    entries: Vec<(usize, String)>,
}

impl LabelMapping {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(idx, label)| (idx, label.into()))
                .collect(),
        }
    }

    /// `LABEL_0 .. LABEL_{n-1}`, used when a model declares no names
    pub fn placeholder(num_labels: usize) -> Self {
        Self::new((0..num_labels).map(|idx| (idx, format!("LABEL_{}", idx))))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|(idx, label)| (*idx, label.as_str()))
    }

    /// Label for a class index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.iter()
            .find(|(idx, _)| *idx == index)
            .map(|(_, label)| label)
    }

    /// Index of the toxic class, see [`detect_toxic_index`]
    pub fn toxic_index(&self) -> usize {
        detect_toxic_index(self)
    }
}

impl fmt::Display for LabelMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (pos, (idx, label)) in self.iter().enumerate() {
            if pos > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", idx, label)?;
        }
        f.write_str("}")
    }
}

impl<'de> Deserialize<'de> for LabelMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = LabelMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of class index to label name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(2));

                while let Some((key, label)) = map.next_entry::<String, String>()? {
                    let idx = key.trim().parse::<usize>().map_err(|_| {
                        de::Error::invalid_value(Unexpected::Str(&key), &"a class index")
                    })?;
                    entries.push((idx, label));
                }

                Ok(LabelMapping { entries })
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

/// Find the class index that represents "toxic".
///
/// Every label is checked in mapping order; the last one whose lowercased
/// name contains `toxic` wins. Falls back to [`DEFAULT_TOXIC_INDEX`] when
/// nothing matches. Note that a `non-toxic` label also matches.
pub fn detect_toxic_index(labels: &LabelMapping) -> usize {
    let matches: Vec<(usize, &str)> = labels
        .iter()
        .filter(|(_, label)| label.to_lowercase().contains(TOXIC_MARKER))
        .collect();

    match matches.as_slice() {
        [] => {
            tracing::debug!(
                "No label contains '{}', using default toxic index {}",
                TOXIC_MARKER,
                DEFAULT_TOXIC_INDEX
            );
            DEFAULT_TOXIC_INDEX
        }
        [(idx, _)] => *idx,
        [.., (idx, label)] => {
            tracing::warn!(
                "{} labels contain '{}' ({:?}); using the last one, {} ({:?})",
                matches.len(),
                TOXIC_MARKER,
                matches,
                idx,
                label
            );
            *idx
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_when_no_label_matches() {
        let labels = LabelMapping::placeholder(2);
        assert_eq!(detect_toxic_index(&labels), DEFAULT_TOXIC_INDEX);
    }

    #[test]
    fn test_single_match_case_insensitive() {
        let labels = LabelMapping::new([(0, "clean"), (1, "offensive"), (2, "TOXIC")]);
        assert_eq!(detect_toxic_index(&labels), 2);
    }

    #[test]
    fn test_match_at_index_zero() {
        let labels = LabelMapping::new([(0, "Toxic"), (1, "Clean")]);
        assert_eq!(labels.toxic_index(), 0);
    }

    #[test]
    fn test_last_match_wins() {
        let labels = LabelMapping::new([(0, "toxic"), (1, "non-toxic")]);
        assert_eq!(detect_toxic_index(&labels), 1);

        let labels = LabelMapping::new([(0, "Non-Toxic"), (1, "Toxic")]);
        assert_eq!(detect_toxic_index(&labels), 1);
    }

    #[test]
    fn test_scan_follows_mapping_order_not_index_order() {
        let labels = LabelMapping::new([(1, "severe_toxic"), (0, "toxic")]);
        assert_eq!(detect_toxic_index(&labels), 0);
    }

    #[test]
    fn test_empty_mapping_uses_default() {
        assert_eq!(detect_toxic_index(&LabelMapping::default()), 1);
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let labels: LabelMapping =
            serde_json::from_str(r#"{"1": "TOXIC", "0": "NON_TOXIC", "10": "other"}"#).unwrap();

        let entries: Vec<_> = labels.iter().collect();
        assert_eq!(entries, vec![(1, "TOXIC"), (0, "NON_TOXIC"), (10, "other")]);
        assert_eq!(labels.get(0), Some("NON_TOXIC"));
        assert_eq!(labels.get(5), None);
    }

    #[test]
    fn test_deserialize_rejects_non_numeric_keys() {
        let result: Result<LabelMapping, _> = serde_json::from_str(r#"{"zero": "clean"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        let labels = LabelMapping::new([(0, "clean"), (1, "toxic")]);
        assert_eq!(labels.to_string(), r#"{0: "clean", 1: "toxic"}"#);
    }
}
