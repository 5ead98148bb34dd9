//! WebSocket wire protocol.
//!
//! Server-to-client payloads are self-describing JSON objects; the
//! three data payloads (combined, notifications, maintenance) are
//! always delivered in that order within one push. Client-to-server
//! messages are decoded defensively: anything that does not match a
//! known shape is reported as a [`DecodeError`] so the caller can log
//! and ignore it without closing the connection.

use chrono::NaiveDate;
use serde::Serialize;

use crate::telemetry::{AudioSample, Reading};
use crate::thresholds::Notification;
use crate::types::Timestamp;

/// Date format accepted in client filter updates.
pub const FILTER_DATE_FORMAT: &str = "%m/%d/%Y";

/// Combined sensor payload: the cold-spray batch plus both microphone
/// channels.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedData {
    pub cold_spray: Vec<Reading>,
    pub micro_0: Vec<AudioSample>,
    pub micro_1: Vec<AudioSample>,
}

/// Notifications payload, sent immediately after [`CombinedData`].
#[derive(Debug, Clone, Serialize)]
pub struct NotificationsPayload {
    pub notifications: Vec<Notification>,
}

/// Maintenance payload, sent last in the triple.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MaintenancePayload {
    pub maintenance_required: bool,
}

/// Keepalive messages, tagged with a `type` field.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Heartbeat {
    Ping { timestamp: Timestamp },
    Pong { timestamp: Timestamp },
}

impl Heartbeat {
    /// A ping stamped with the current time.
    pub fn ping_now() -> Self {
        Heartbeat::Ping {
            timestamp: chrono::Utc::now(),
        }
    }

    /// A pong stamped with the current time.
    pub fn pong_now() -> Self {
        Heartbeat::Pong {
            timestamp: chrono::Utc::now(),
        }
    }
}

/// A decoded client-to-server message.
///
/// One frame may carry a filter update, a keepalive ping, or both;
/// the fields are independent so a combined frame is honored in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
    /// `Some(Some(d))` sets the filter, `Some(None)` clears it,
    /// `None` leaves it untouched.
    pub filter_update: Option<Option<NaiveDate>>,
    /// Client-initiated keepalive; expects a pong reply.
    pub ping: bool,
}

impl ClientMessage {
    /// A frame that only updates the filter.
    pub fn filter(filter_date: Option<NaiveDate>) -> Self {
        Self {
            filter_update: Some(filter_date),
            ping: false,
        }
    }

    /// A frame that only requests a pong.
    pub fn ping() -> Self {
        Self {
            filter_update: None,
            ping: true,
        }
    }
}

/// Why an inbound frame could not be decoded.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame is not valid JSON")]
    InvalidJson,
    #[error("filter_date {0:?} does not match MM/DD/YYYY")]
    InvalidDate(String),
    #[error("frame does not match any known message shape")]
    UnknownShape,
}

/// Decode one inbound text frame.
///
/// A frame must carry a `filter_date` key, a `"type": "ping"` tag, or
/// both; anything else is [`DecodeError::UnknownShape`]. A present but
/// unparseable date is an error rather than a filter clear, so a
/// client typo never silently switches the connection to live mode.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| DecodeError::InvalidJson)?;
    let Some(object) = value.as_object() else {
        return Err(DecodeError::UnknownShape);
    };

    let filter_update = match object.get("filter_date") {
        None => None,
        Some(serde_json::Value::Null) => Some(None),
        Some(serde_json::Value::String(raw)) => {
            let date = NaiveDate::parse_from_str(raw, FILTER_DATE_FORMAT)
                .map_err(|_| DecodeError::InvalidDate(raw.clone()))?;
            Some(Some(date))
        }
        Some(other) => return Err(DecodeError::InvalidDate(other.to_string())),
    };

    let ping = object.get("type").and_then(|v| v.as_str()) == Some("ping");

    if filter_update.is_none() && !ping {
        return Err(DecodeError::UnknownShape);
    }

    Ok(ClientMessage { filter_update, ping })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn decodes_filter_update_with_date() {
        let msg = decode_client_message(r#"{"filter_date": "01/15/2024"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::filter(Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        );
    }

    #[test]
    fn decodes_filter_clear() {
        let msg = decode_client_message(r#"{"filter_date": null}"#).unwrap();
        assert_eq!(msg, ClientMessage::filter(None));
    }

    #[test]
    fn decodes_client_ping() {
        let msg = decode_client_message(r#"{"type": "ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ping());
    }

    #[test]
    fn decodes_combined_filter_and_ping() {
        let msg =
            decode_client_message(r#"{"filter_date": "01/15/2024", "type": "ping"}"#).unwrap();
        assert_eq!(
            msg.filter_update,
            Some(Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        );
        assert!(msg.ping);
    }

    #[test]
    fn rejects_malformed_json() {
        assert_eq!(
            decode_client_message("not json at all"),
            Err(DecodeError::InvalidJson)
        );
    }

    #[test]
    fn rejects_bad_date_instead_of_clearing_the_filter() {
        assert_eq!(
            decode_client_message(r#"{"filter_date": "2024-01-15"}"#),
            Err(DecodeError::InvalidDate("2024-01-15".into()))
        );
        assert_eq!(
            decode_client_message(r#"{"filter_date": 42}"#),
            Err(DecodeError::InvalidDate("42".into()))
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert_eq!(
            decode_client_message(r#"{"type": "pong"}"#),
            Err(DecodeError::UnknownShape)
        );
        assert_eq!(decode_client_message("[1, 2]"), Err(DecodeError::UnknownShape));
    }

    #[test]
    fn heartbeat_serializes_with_type_tag() {
        let ping = Heartbeat::Ping {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(ping).unwrap();
        assert_eq!(json["type"], "ping");
        assert!(json["timestamp"].is_string());

        let pong = serde_json::to_value(Heartbeat::pong_now()).unwrap();
        assert_eq!(pong["type"], "pong");
    }

    #[test]
    fn combined_payload_has_three_sections() {
        let payload = CombinedData {
            cold_spray: vec![],
            micro_0: vec![],
            micro_1: vec![],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["cold_spray"].is_array());
        assert!(json["micro_0"].is_array());
        assert!(json["micro_1"].is_array());
    }
}
