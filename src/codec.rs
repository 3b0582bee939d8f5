//! Message envelope codec.
//!
//! The transport carries message bodies as text, so payloads travel as
//! standard (padded) base64. Labels travel as `(key, kind, value)` triples:
//! an integer label fills `numValue`, a string label fills `strValue`.

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::api::wire::{WireLabel, WireMessage};
use crate::error::{Error, Result};

/// Value of a single message label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelValue {
    Int(i64),
    Str(String),
}

/// Label map attached to a message, ordered by key.
pub type Labels = BTreeMap<String, LabelValue>;

impl From<i64> for LabelValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LabelValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Encode a payload and its labels into a wire message.
///
/// Fails with [`Error::Validation`] if a label key is empty.
pub fn encode(payload: &[u8], labels: &Labels) -> Result<WireMessage> {
    let mut label = Vec::with_capacity(labels.len());
    for (key, value) in labels {
        if key.is_empty() {
            return Err(Error::validation("label key cannot be empty"));
        }
        label.push(match value {
            LabelValue::Int(v) => WireLabel {
                key: key.clone(),
                num_value: Some(*v),
                str_value: None,
            },
            LabelValue::Str(s) => WireLabel {
                key: key.clone(),
                num_value: None,
                str_value: Some(s.clone()),
            },
        });
    }

    Ok(WireMessage {
        data: STANDARD.encode(payload),
        label,
        message_id: None,
    })
}

/// Decode a wire message into its payload and labels.
///
/// A label carrying neither value field decodes to an empty string.
pub fn decode(wire: &WireMessage) -> Result<(Vec<u8>, Labels)> {
    let payload = STANDARD.decode(wire.data.as_bytes())?;

    let mut labels = Labels::new();
    for label in &wire.label {
        if label.key.is_empty() {
            return Err(Error::decode("label with empty key"));
        }
        let value = match (&label.num_value, &label.str_value) {
            (Some(v), _) => LabelValue::Int(*v),
            (None, Some(s)) => LabelValue::Str(s.clone()),
            (None, None) => LabelValue::Str(String::new()),
        };
        labels.insert(label.key.clone(), value);
    }

    Ok((payload, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, LabelValue)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_round_trip_mixed_labels() {
        let input = labels(&[
            ("retry", LabelValue::Int(3)),
            ("origin", LabelValue::Str("billing".into())),
            ("zero", LabelValue::Int(0)),
            ("negative", LabelValue::Int(i64::MIN)),
        ]);

        let wire = encode(b"hello", &input).unwrap();
        assert_eq!(wire.data, "aGVsbG8=");

        let (payload, output) = decode(&wire).unwrap();
        assert_eq!(payload, b"hello");
        assert_eq!(output, input);
    }

    #[test]
    fn test_binary_payload_is_lossless() {
        let payload: Vec<u8> = (0..=255u8).chain([0, 0, 255]).collect();
        let wire = encode(&payload, &Labels::new()).unwrap();
        let (decoded, labels) = decode(&wire).unwrap();
        assert_eq!(decoded, payload);
        assert!(labels.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let wire = encode(b"", &Labels::new()).unwrap();
        assert_eq!(wire.data, "");
        assert!(decode(&wire).unwrap().0.is_empty());
    }

    #[test]
    fn test_int_label_uses_numeric_field() {
        let wire = encode(b"x", &labels(&[("n", LabelValue::Int(0))])).unwrap();
        assert_eq!(wire.label[0].num_value, Some(0));
        assert_eq!(wire.label[0].str_value, None);
    }

    #[test]
    fn test_empty_label_key_rejected() {
        let err = encode(b"x", &labels(&[("", LabelValue::Int(1))])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let wire = WireMessage {
            data: "not base64!!".into(),
            ..Default::default()
        };
        assert!(matches!(decode(&wire), Err(Error::Decode(_))));
    }

    #[test]
    fn test_label_without_value_decodes_to_empty_string() {
        let wire = WireMessage {
            data: String::new(),
            label: vec![WireLabel {
                key: "k".into(),
                num_value: None,
                str_value: None,
            }],
            message_id: None,
        };
        let (_, labels) = decode(&wire).unwrap();
        assert_eq!(labels["k"], LabelValue::Str(String::new()));
    }

    #[test]
    fn test_label_value_conversions() {
        assert_eq!(LabelValue::from(7i32), LabelValue::Int(7));
        assert_eq!(LabelValue::from("a"), LabelValue::Str("a".into()));
        assert_eq!(LabelValue::Int(-2).to_string(), "-2");
    }

    mod properties {
        use crate::api::wire::WireMessage;
        use crate::codec::{decode, encode, LabelValue, Labels};
        use proptest::prelude::*;

        fn label_value() -> impl Strategy<Value = LabelValue> {
            prop_oneof![
                any::<i64>().prop_map(LabelValue::Int),
                any::<String>().prop_map(LabelValue::Str),
            ]
        }

        proptest! {
            #[test]
            fn payload_round_trips(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
                let wire = encode(&payload, &Labels::new()).unwrap();
                let (decoded, _) = decode(&wire).unwrap();
                prop_assert_eq!(decoded, payload);
            }

            #[test]
            fn labels_round_trip(
                payload in proptest::collection::vec(any::<u8>(), 0..64),
                input in proptest::collection::btree_map("\\PC{1,16}", label_value(), 0..8),
            ) {
                let wire = encode(&payload, &input).unwrap();
                prop_assert_eq!(wire.label.len(), input.len());
                let json = serde_json::to_string(&wire).unwrap();
                let wire: WireMessage = serde_json::from_str(&json).unwrap();
                let (decoded, output) = decode(&wire).unwrap();
                prop_assert_eq!(decoded, payload);
                prop_assert_eq!(output, input);
            }
        }
    }
}
