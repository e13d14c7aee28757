use serde::{Deserialize, Serialize};

use crate::error::PortalError;

/// `{ success, message?, data? }` wrapper used by every portal endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Turns `success: false` into a rejection carrying the server's message.
    pub fn into_result(self) -> Result<Self, PortalError> {
        if self.success {
            Ok(self)
        } else {
            Err(PortalError::Rejected(self.message.unwrap_or_default()))
        }
    }

    pub fn require_data(self) -> Result<T, PortalError> {
        let envelope = self.into_result()?;
        envelope
            .data
            .ok_or_else(|| PortalError::Decode("response is missing `data`".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    #[test]
    fn failed_envelope_carries_message() {
        let envelope: ApiEnvelope<Value> =
            serde_json::from_value(json!({"success": false, "message": "Slot full"})).unwrap();
        assert_matches!(envelope.into_result(), Err(PortalError::Rejected(msg)) if msg == "Slot full");
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let envelope: ApiEnvelope<Value> =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert_matches!(envelope.require_data(), Err(PortalError::Decode(_)));
    }

    #[test]
    fn successful_envelope_yields_data() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_value(json!({"success": true, "data": [1, 2]})).unwrap();
        assert_eq!(envelope.require_data().unwrap(), vec![1, 2]);
    }
}
