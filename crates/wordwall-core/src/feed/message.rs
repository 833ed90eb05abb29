//! Realtime protocol message types
//!
//! Messages exchanged with the item store's realtime endpoint as JSON text
//! frames, tagged by a `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FeedError;
use crate::models::Entry;

/// Event kind the wall subscribes to
pub const CREATE_EVENT: &str = "create";

/// Messages sent to the server
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Authenticate with a static token
    Auth { access_token: String },

    /// Subscribe to one event kind of a collection
    Subscribe {
        collection: String,
        event: String,
        uid: String,
    },

    /// Drop a subscription
    Unsubscribe { uid: String },

    /// Answer to a server ping
    Pong,
}

/// Error details attached to a rejected request
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServerError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ServerError {
    fn describe(error: Option<ServerError>) -> String {
        match error {
            Some(ServerError {
                code: Some(code),
                message,
            }) => format!("{} ({})", message, code),
            Some(ServerError { message, .. }) if !message.is_empty() => message,
            _ => "no details".to_string(),
        }
    }
}

/// Messages received from the server
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Authentication result
    Auth {
        status: String,
        #[serde(default)]
        error: Option<ServerError>,
    },

    /// Subscribe request result (sent on failure)
    Subscribe {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        error: Option<ServerError>,
    },

    /// Event on an active subscription
    Subscription {
        event: String,
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        uid: Option<String>,
    },

    /// Keep-alive, answered with `ClientMessage::Pong`
    Ping,

    /// Anything else
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Create an auth message
    pub fn auth(token: &str) -> Self {
        ClientMessage::Auth {
            access_token: token.to_string(),
        }
    }

    /// Create a subscription to creation events
    pub fn subscribe_creates(collection: &str, uid: &str) -> Self {
        ClientMessage::Subscribe {
            collection: collection.to_string(),
            event: CREATE_EVENT.to_string(),
            uid: uid.to_string(),
        }
    }

    /// Create an unsubscribe message
    pub fn unsubscribe(uid: &str) -> Self {
        ClientMessage::Unsubscribe {
            uid: uid.to_string(),
        }
    }

    /// Encode message to JSON text
    pub fn encode(&self) -> Result<String, FeedError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    /// Decode message from JSON text
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Human-readable reason for a rejected auth or subscribe
    pub fn rejection(self) -> Option<String> {
        match self {
            ServerMessage::Auth { status, error } if status != "ok" => {
                Some(ServerError::describe(error))
            }
            ServerMessage::Subscribe {
                status: Some(status),
                error,
            } if status == "error" => Some(ServerError::describe(error)),
            _ => None,
        }
    }
}

/// Extract the created entry from a subscription payload
///
/// The payload may be a single item or a batch; only the first element of a
/// batch is used. Items missing `id` or `content` yield `None`.
pub fn entry_from_payload(data: &Value) -> Option<Entry> {
    let item = match data {
        Value::Array(items) => items.first()?,
        other => other,
    };
    if !item.is_object() {
        return None;
    }
    serde_json::from_value(item.clone()).ok()
}

/// Realtime endpoint for an item store base URL
///
/// `https://host` becomes `wss://host/websocket`; websocket URLs are taken as
/// they are.
pub fn websocket_url(base: &str) -> Result<String, FeedError> {
    let base = base.trim().trim_end_matches('/');

    if base.starts_with("ws://") || base.starts_with("wss://") {
        return Ok(base.to_string());
    }

    let (scheme, rest) = if let Some(rest) = base.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(FeedError::InvalidUrl(base.to_string()));
    };

    if rest.is_empty() {
        return Err(FeedError::InvalidUrl(base.to_string()));
    }
    Ok(format!("{}://{}/websocket", scheme, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryId;
    use serde_json::json;

    #[test]
    fn test_client_message_encoding() {
        let auth: Value = serde_json::from_str(&ClientMessage::auth("t0k").encode().unwrap()).unwrap();
        assert_eq!(auth, json!({"type": "auth", "access_token": "t0k"}));

        let sub: Value =
            serde_json::from_str(&ClientMessage::subscribe_creates("texts", "u1").encode().unwrap())
                .unwrap();
        assert_eq!(
            sub,
            json!({"type": "subscribe", "collection": "texts", "event": "create", "uid": "u1"})
        );

        assert_eq!(ClientMessage::Pong.encode().unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_server_message_decoding() {
        let msg = ServerMessage::decode(r#"{"type":"auth","status":"ok","refresh_token":null}"#)
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Auth {
                status: "ok".to_string(),
                error: None
            }
        );

        let msg = ServerMessage::decode(
            r#"{"type":"subscription","event":"create","data":[{"id":1,"content":"x"}],"uid":"u1"}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::Subscription { event, data, uid } => {
                assert_eq!(event, "create");
                assert!(data.is_some());
                assert_eq!(uid.as_deref(), Some("u1"));
            }
            other => panic!("Expected Subscription message, got {:?}", other),
        }

        assert_eq!(ServerMessage::decode(r#"{"type":"ping"}"#).unwrap(), ServerMessage::Ping);
        assert_eq!(
            ServerMessage::decode(r#"{"type":"items","data":[]}"#).unwrap(),
            ServerMessage::Unknown
        );
        assert!(ServerMessage::decode("not json").is_err());
    }

    #[test]
    fn test_rejections() {
        let msg = ServerMessage::decode(
            r#"{"type":"auth","status":"error","error":{"code":"TOKEN_EXPIRED","message":"Token expired."}}"#,
        )
        .unwrap();
        assert_eq!(msg.rejection().as_deref(), Some("Token expired. (TOKEN_EXPIRED)"));

        let msg = ServerMessage::decode(r#"{"type":"subscribe","status":"error"}"#).unwrap();
        assert_eq!(msg.rejection().as_deref(), Some("no details"));

        let msg = ServerMessage::decode(r#"{"type":"auth","status":"ok"}"#).unwrap();
        assert_eq!(msg.rejection(), None);
    }

    #[test]
    fn test_entry_from_single_item() {
        let entry = entry_from_payload(&json!({"id": 7, "content": "hi"})).unwrap();
        assert_eq!(entry.id, EntryId::new("7"));
        assert_eq!(entry.content, "hi");
    }

    #[test]
    fn test_entry_from_batch_takes_first() {
        let entry = entry_from_payload(&json!([
            {"id": 1, "content": "first"},
            {"id": 2, "content": "second"}
        ]))
        .unwrap();
        assert_eq!(entry.content, "first");
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(entry_from_payload(&json!([])).is_none());
        assert!(entry_from_payload(&json!({"id": 1})).is_none());
        assert!(entry_from_payload(&json!({"content": "orphan"})).is_none());
        assert!(entry_from_payload(&json!("text")).is_none());
        assert!(entry_from_payload(&json!([{"id": 1}, {"id": 2, "content": "x"}])).is_none());
    }

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("https://cms.example.com/").unwrap(),
            "wss://cms.example.com/websocket"
        );
        assert_eq!(
            websocket_url("http://localhost:8055").unwrap(),
            "ws://localhost:8055/websocket"
        );
        assert_eq!(
            websocket_url("ws://localhost:9000/rt").unwrap(),
            "ws://localhost:9000/rt"
        );
        assert!(websocket_url("cms.example.com").is_err());
        assert!(websocket_url("https://").is_err());
    }
}
