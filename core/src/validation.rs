//! Client-side payload checks against a template's placeholder schema.
//!
//! Purely structural: only keys are compared, never values or descriptions.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::types::Placeholder;

/// Keys a payload gets wrong relative to a placeholder list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadReport {
    /// Required placeholder keys absent from the payload, in placeholder order.
    pub missing: Vec<String>,
    /// Payload keys no placeholder declares, in payload order.
    pub extra: Vec<String>,
}

impl PayloadReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// `Ok` when valid, otherwise the `PAYLOAD_INVALID` error.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ApiError::payload_invalid(self.missing, self.extra))
        }
    }
}

/// Compare the keys of `payload` with `placeholders`.
pub fn check_payload(placeholders: &[Placeholder], payload: &Map<String, Value>) -> PayloadReport {
    let missing = placeholders
        .iter()
        .filter(|p| p.required && !payload.contains_key(&p.key))
        .map(|p| p.key.clone())
        .collect();

    let extra = payload
        .keys()
        .filter(|key| !placeholders.iter().any(|p| &p.key == *key))
        .cloned()
        .collect();

    PayloadReport { missing, extra }
}
