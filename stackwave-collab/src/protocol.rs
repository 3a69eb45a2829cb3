//! JSON wire protocol for room events.
//!
//! Every frame is a text message carrying one named event:
//!
//! ```text
//! {"event": "codeChange", "data": {"roomId": "…", "newCode": "…"}}
//! ```
//!
//! Event identifiers are part of the server contract and must match
//! exactly: `joinRoom`, `codeChange`, `sendMessage`, `runCode` outbound;
//! `roomData`, `updateCode`, `newMessage`, `userJoined`, `userLeft`,
//! `codeOutput`, `error` inbound.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A room member as the server describes it.
///
/// The id field is `_id` on the wire (server-issued, opaque); `id` is
/// accepted as an alias when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar: None,
        }
    }
}

/// One chat transcript entry. Timestamps are server-formatted strings and
/// treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: Participant,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Initial (and re-sync) room snapshot sent after a join is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    #[serde(default)]
    pub participants_list: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Result of one remote code execution.
///
/// `compile_output` stays snake_case: that is how the execution engine
/// spells it on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionVerdict>,
}

/// `status` object inside a `codeOutput` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionVerdict {
    pub id: u32,
    pub description: String,
}

impl ExecutionOutput {
    /// Judge0 status id 3 is "Accepted".
    pub fn is_accepted(&self) -> bool {
        self.status.as_ref().map_or(false, |s| s.id == 3)
    }

    /// Synthesized result for a language with no execution engine id.
    /// Never sent on the wire; stored locally in place of a real verdict.
    pub fn unsupported_language(language: &str) -> Self {
        Self {
            stderr: Some(format!(
                "Execution for language \"{language}\" is not supported yet."
            )),
            ..Self::default()
        }
    }
}

/// Events the client emits to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom", rename_all = "camelCase")]
    JoinRoom { room_id: String, user: Participant },

    #[serde(rename = "codeChange", rename_all = "camelCase")]
    CodeChange { room_id: String, new_code: String },

    #[serde(rename = "sendMessage", rename_all = "camelCase")]
    SendMessage { room_id: String, text: String },

    #[serde(rename = "runCode", rename_all = "camelCase")]
    RunCode {
        room_id: String,
        language_id: u32,
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stdin: Option<String>,
    },
}

/// Events the server broadcasts to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "roomData")]
    RoomData(RoomSnapshot),

    /// Full replacement text for the shared code document.
    #[serde(rename = "updateCode")]
    UpdateCode(String),

    #[serde(rename = "newMessage")]
    NewMessage(ChatMessage),

    #[serde(rename = "userJoined")]
    UserJoined(Participant),

    /// Carries only the departing participant's id.
    #[serde(rename = "userLeft")]
    UserLeft(String),

    #[serde(rename = "codeOutput")]
    CodeOutput(ExecutionOutput),

    #[serde(rename = "error")]
    Error { message: String },
}

impl ClientEvent {
    /// Serialize to a wire frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse a wire frame (server side of the contract; used by tests).
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

impl ServerEvent {
    /// Serialize to a wire frame (server side of the contract; used by tests).
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse a wire frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Wire-level failures. Decode failures are tolerated by the session
/// (the frame is logged and skipped), never fatal.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}
