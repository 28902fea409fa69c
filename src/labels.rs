//! Label codec.
//!
//! Converts key/value maps into the ordered label sequences sent over the
//! wire, and back. Unordered input is always emitted sorted by key so two
//! calls with the same logical content produce identical requests.
//!
//! Decoding is lossy: a [`Label`] distinguishes "no value" from "empty
//! value", a `BTreeMap<String, String>` cannot. [`decode_labels`] drops
//! value-less labels entirely instead of mapping them to `""`; use
//! [`Label::value`] on the original sequence when presence matters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A key with an optional value, attached to a node or a job proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A label that is present but carries no value.
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Build labels from an unordered map, sorted by key.
pub fn build_labels<'a, I>(pairs: I) -> Vec<Label>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let sorted: BTreeMap<&String, &String> = pairs.into_iter().collect();
    sorted
        .into_iter()
        .map(|(k, v)| Label::new(k.as_str(), v.as_str()))
        .collect()
}

/// Decode a label sequence into a map. Value-less labels are omitted; on
/// duplicate keys the last one wins.
pub fn decode_labels(labels: &[Label]) -> BTreeMap<String, String> {
    labels
        .iter()
        .filter_map(|l| l.value.as_ref().map(|v| (l.key.clone(), v.clone())))
        .collect()
}

/// Trim surrounding whitespace and replace the rest with underscores, one
/// `_` per whitespace character. Wire label values may not contain spaces.
pub fn sanitize_label_value(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
