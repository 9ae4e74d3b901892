//! Core RPC protocol definitions.
//!
//! Wire form: length-prefixed JSON frames (see `holomush_server::transport`
//! for the framing itself; this crate only defines the frame *shapes*).
//!
//! Frame types:
//! - request frames  — client → core RPC call (`Authenticate`, `HandleCommand`,
//!   `SubscribeOpen`, `Disconnect`)
//! - response frames — core → client RPC result
//! - `SubscribeEvent`/`SubscribeClosed` — core → client server-push for the
//!   one streaming method
//! - `Error` — a transport-level RPC failure (see spec §7: reserved for
//!   conditions that can't be expressed as a response body)

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

pub const PROTOCOL_VERSION: u32 = 1;

/// Boundary from spec §8: commands at or above this size must still be
/// parsed without panicking, not rejected outright by the wire layer.
pub const MAX_COMMAND_BYTES: usize = 8 * 1024 * 1024;

/// Per-subscriber and merged fan-in queue capacity (spec §4.E, §4.I).
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 100;
pub const MERGED_QUEUE_CAPACITY: usize = 100;

/// RPC client keepalive defaults (spec §4.J).
pub const KEEPALIVE_INTERVAL_SECS: u64 = 10;
pub const KEEPALIVE_TIMEOUT_SECS: u64 = 5;

// ── Error codes (transport-level RPC failures only, see spec §7) ───────────

pub mod error_codes {
    pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
    pub const SEND_FAILED: &str = "SEND_FAILED";
    pub const CANCELLED: &str = "CANCELLED";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
}

// ── Error shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
}

impl ErrorShape {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorShape {}

// ── Request metadata ─────────────────────────────────────────────────────────

/// `{request-id, timestamp}` metadata carried on every request and echoed
/// back on every response. Missing metadata is tolerated end to end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl RequestMeta {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            timestamp: Some(now_millis()),
        }
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Event wire form ──────────────────────────────────────────────────────────

/// Protocol-buffer-shaped wire record for an `Event` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    pub id: String,
    pub stream: String,
    pub r#type: String,
    pub timestamp: u64,
    #[serde(rename = "actorType")]
    pub actor_type: String,
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
}

mod payload_base64 {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ── Method payloads ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub success: bool,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "characterId", skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    #[serde(rename = "characterName", skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthenticateResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            session_id: None,
            character_id: None,
            character_name: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleCommandRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleCommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandleCommandResponse {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub streams: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectResponse {
    pub success: bool,
}

// ── Frame envelope ───────────────────────────────────────────────────────────

/// Discriminated union of every frame that can cross the wire in either
/// direction. One connection carries exactly one in-flight unary call or
/// one in-flight `Subscribe` stream at a time (spec's RPC surface is
/// request/response, not multiplexed).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    #[serde(rename = "authenticate")]
    Authenticate {
        meta: RequestMeta,
        request: AuthenticateRequest,
    },
    #[serde(rename = "authenticateResult")]
    AuthenticateResult {
        meta: RequestMeta,
        response: AuthenticateResponse,
    },
    #[serde(rename = "handleCommand")]
    HandleCommand {
        meta: RequestMeta,
        request: HandleCommandRequest,
    },
    #[serde(rename = "handleCommandResult")]
    HandleCommandResult {
        meta: RequestMeta,
        response: HandleCommandResponse,
    },
    #[serde(rename = "subscribeOpen")]
    SubscribeOpen {
        meta: RequestMeta,
        request: SubscribeRequest,
    },
    #[serde(rename = "subscribeEvent")]
    SubscribeEvent { event: WireEvent },
    #[serde(rename = "subscribeClosed")]
    SubscribeClosed,
    #[serde(rename = "disconnect")]
    Disconnect {
        meta: RequestMeta,
        request: DisconnectRequest,
    },
    #[serde(rename = "disconnectResult")]
    DisconnectResult {
        meta: RequestMeta,
        response: DisconnectResponse,
    },
    /// Transport-level RPC error (spec §7, axis 1): `Subscribe` against an
    /// unknown session, a failed streamed send, or cancellation.
    #[serde(rename = "error")]
    Error {
        meta: RequestMeta,
        error: ErrorShape,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_event_payload_round_trips_bit_identical() {
        let event = WireEvent {
            id: "01H000000000000000000000".into(),
            stream: "location:abc".into(),
            r#type: "say".into(),
            timestamp: 123,
            actor_type: "character".into(),
            actor_id: "char-1".into(),
            payload: br#"{"message":"hi"}"#.to_vec(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: WireEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.payload, event.payload);
    }

    #[test]
    fn frame_tags_round_trip() {
        let frame = Frame::Error {
            meta: RequestMeta::new("req-1"),
            error: ErrorShape::new(error_codes::SESSION_NOT_FOUND, "session not found"),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        let back: Frame = serde_json::from_str(&json).unwrap();
        matches!(back, Frame::Error { .. });
    }

    #[test]
    fn meta_tolerates_missing_request_id() {
        let json = r#"{"requestId":null,"timestamp":null}"#;
        let meta: RequestMeta = serde_json::from_str(json).unwrap();
        assert!(meta.request_id.is_none());
    }
}
