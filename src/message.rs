//! Messages and acknowledgement identifiers.

use std::fmt;
use std::sync::Arc;

use crate::codec::{LabelValue, Labels};

/// A unit of data published to a topic or pulled from a subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Opaque binary payload.
    pub data: Vec<u8>,
    /// Integer or string labels keyed by name.
    pub labels: Labels,
    /// Service-assigned identifier, present on delivered messages.
    pub message_id: Option<String>,
    ack_id: Option<AckId>,
}

impl Message {
    /// Create a message with the given payload and no labels.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Attach a label, replacing any previous value for `key`.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<LabelValue>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Acknowledgement identifier of this delivery, if it came from a pull.
    pub fn ack_id(&self) -> Option<&AckId> {
        self.ack_id.as_ref()
    }

    pub(crate) fn delivered(
        data: Vec<u8>,
        labels: Labels,
        message_id: Option<String>,
        ack_id: AckId,
    ) -> Self {
        Self {
            data,
            labels,
            message_id,
            ack_id: Some(ack_id),
        }
    }
}

/// Delivery-scoped token used to acknowledge one message.
///
/// An `AckId` remembers the subscription that issued it and is rejected by
/// any other subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AckId {
    subscription: Arc<str>,
    id: String,
}

impl AckId {
    pub(crate) fn new(subscription: Arc<str>, id: String) -> Self {
        Self { subscription, id }
    }

    /// The raw identifier sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Full resource name of the issuing subscription.
    pub fn subscription(&self) -> &str {
        &self.subscription
    }
}

impl fmt::Display for AckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
