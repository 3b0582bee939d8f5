//! Resource name construction.
//!
//! Every request addresses its topic or subscription by a full resource
//! name of the form `/topics/{project}/{name}` or
//! `/subscriptions/{project}/{name}`.

use crate::error::{Error, Result};

/// Maximum length of a short resource name.
const MAX_NAME_LEN: usize = 255;

/// Full resource name of a topic.
pub fn full_topic_name(project: &str, name: &str) -> String {
    format!("/topics/{project}/{name}")
}

/// Full resource name of a subscription.
pub fn full_subscription_name(project: &str, name: &str) -> String {
    format!("/subscriptions/{project}/{name}")
}

/// Check a short project or resource name before it goes on the wire.
pub(crate) fn validate(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(format!("{kind} name cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "{kind} name too long (max {MAX_NAME_LEN} characters)"
        )));
    }
    if name.contains('/') {
        return Err(Error::validation(format!(
            "{kind} name cannot contain '/': {name}"
        )));
    }
    Ok(())
}
