use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A message as reported by the TLQ server.
///
/// Messages are only ever built from server responses. The server assigns the
/// identifier, tracks the state and counts retries; the client only sends the
/// body when enqueueing.
///
/// # Examples
///
/// ```
/// use tlq_client::{Message, MessageState};
/// use serde_json::json;
///
/// let value = json!({
///     "id": "0198fbd8-344e-7b70-841f-3fbd4b371e4c",
///     "body": "Hello, World!",
///     "state": "Ready",
///     "retry_count": 0
/// });
///
/// let message = Message::from_json(value.clone()).unwrap();
/// assert_eq!(message.state, MessageState::Ready);
/// assert_eq!(message.to_json(), value);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Server-assigned identifier
    pub id: String,
    /// The message content
    pub body: String,
    /// Processing state, as reported by the server
    pub state: MessageState,
    /// Number of times this message has been retried after failure
    pub retry_count: u32,
}

impl Message {
    /// Builds a message from one entry of a server response.
    ///
    /// # Errors
    ///
    /// Returns [`TlqError::Serialization`](crate::TlqError::Serialization) if
    /// any of `id`, `body`, `state` or `retry_count` is missing or mistyped.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Converts the message back into the server's JSON shape.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "body": self.body,
            "state": self.state.as_str(),
            "retry_count": self.retry_count,
        })
    }
}

/// Processing state of a message.
///
/// The server owns the state machine:
/// - `Ready` → `Processing` (when retrieved by a consumer)
/// - `Processing` → `Failed` (if processing fails)
/// - `Failed` → `Ready` (when retried)
///
/// Values the client does not know are kept verbatim in
/// [`MessageState::Other`] rather than rejected.
/// The wire value must still be a JSON string: a number, `null` or any other
/// non-string `state` fails deserialization with
/// [`TlqError::Serialization`](crate::TlqError::Serialization).
///
/// ```
/// use tlq_client::MessageState;
///
/// let state: MessageState = serde_json::from_str("\"Ready\"").unwrap();
/// assert_eq!(state, MessageState::Ready);
///
/// let state: MessageState = serde_json::from_str("\"Archived\"").unwrap();
/// assert_eq!(state, MessageState::Other("Archived".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum MessageState {
    Ready,
    Processing,
    Failed,
    Other(String),
}

impl MessageState {
    pub fn as_str(&self) -> &str {
        match self {
            MessageState::Ready => "Ready",
            MessageState::Processing => "Processing",
            MessageState::Failed => "Failed",
            MessageState::Other(state) => state,
        }
    }
}

impl From<String> for MessageState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "Ready" => MessageState::Ready,
            "Processing" => MessageState::Processing,
            "Failed" => MessageState::Failed,
            _ => MessageState::Other(state),
        }
    }
}

impl From<MessageState> for String {
    fn from(state: MessageState) -> Self {
        match state {
            MessageState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Wire records for the TLQ HTTP API

#[derive(Debug, Serialize)]
pub(crate) struct AddMessageRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddMessageResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetMessagesRequest {
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetMessagesResponse {
    pub messages: Vec<Message>,
}

/// Body of both `/delete` and `/retry`
#[derive(Debug, Serialize)]
pub(crate) struct MessageIdsRequest {
    pub ids: Vec<String>,
}
