//! Check-in QR code payloads.
//!
//! The QR code shown on a member's phone carries a small JSON document.
//! It is not signed; the server only checks its shape, the lead's unit
//! and (optionally) its age.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GymError, GymResult};

pub const CHECKIN_KIND: &str = "checkin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub lead_id: Uuid,
    /// Milliseconds since the Unix epoch when the code was generated.
    pub timestamp: i64,
}

impl QrPayload {
    pub fn check_in(lead_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            kind: CHECKIN_KIND.into(),
            lead_id,
            timestamp: now.timestamp_millis(),
        }
    }

    pub fn encode(&self) -> GymResult<String> {
        serde_json::to_string(self).map_err(|e| GymError::Internal(format!("QR encode: {e}")))
    }

    /// Parse a scanned payload, accepting only check-in codes.
    pub fn decode(raw: &str) -> GymResult<Self> {
        let payload: QrPayload = serde_json::from_str(raw.trim())
            .map_err(|e| GymError::validation(format!("malformed QR payload: {e}")))?;
        if payload.kind != CHECKIN_KIND {
            return Err(GymError::validation(format!(
                "unsupported QR payload type: {}",
                payload.kind
            )));
        }
        Ok(payload)
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Generated no more than `max_age` before `now` (and not in the
    /// future beyond the same tolerance).
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.generated_at() {
            Some(at) => (now - at).abs() <= max_age,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_wire_shape() {
        let lead_id = Uuid::new_v4();
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let raw = QrPayload::check_in(lead_id, now).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "checkin");
        assert_eq!(value["lead_id"], lead_id.to_string());
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn decode_accepts_client_generated_codes() {
        let lead_id = Uuid::new_v4();
        let raw = format!(r#" {{"type":"checkin","lead_id":"{lead_id}","timestamp":1700000000000}} "#);
        let payload = QrPayload::decode(&raw).unwrap();
        assert_eq!(payload.lead_id, lead_id);
    }

    #[test]
    fn decode_rejects_other_types_and_garbage() {
        let lead_id = Uuid::new_v4();
        let raw = format!(r#"{{"type":"payment","lead_id":"{lead_id}","timestamp":1}}"#);
        assert!(matches!(
            QrPayload::decode(&raw),
            Err(GymError::Validation { .. })
        ));
        assert!(QrPayload::decode("not json").is_err());
        assert!(QrPayload::decode(r#"{"type":"checkin"}"#).is_err());
    }

    #[test]
    fn freshness_window() {
        let now = Utc::now();
        let payload = QrPayload::check_in(Uuid::new_v4(), now - Duration::minutes(3));
        assert!(payload.is_fresh(now, Duration::minutes(5)));
        assert!(!payload.is_fresh(now, Duration::minutes(1)));
    }
}
