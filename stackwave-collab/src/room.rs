//! Room session state machine.
//!
//! [`RoomState`] owns everything a session mirrors locally: the shared
//! code document, the participant roster, the chat transcript, and the
//! latest execution result. It is synchronous and single-threaded; the
//! async client in [`crate::client`] drives it from one reader task, so
//! every inbound event and outbound action is applied in arrival order.
//!
//! The server is the sole source of truth: inbound events overwrite the
//! local mirror, and a disconnect clears all of it so the next connection
//! starts blank.

use std::collections::HashMap;

use crate::languages::{self, SyntaxProfile};
use crate::protocol::{ChatMessage, ExecutionOutput, Participant, ServerEvent};

/// Lifecycle of the room connection.
///
/// `Errored` is entered only on a server-sent `error` event; a failed
/// connect attempt and any transport close both land on `Disconnected`.
/// No state retries automatically — reconnection is caller policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

/// Notifications delivered to the caller's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Transport is up and the join intent has been sent.
    Connected,
    /// Transport closed; local mirror was cleared.
    Disconnected,
    /// Initial (or repeated) room snapshot applied.
    RoomSynced,
    /// The shared code document changed to this text.
    CodeUpdated(String),
    /// A chat message arrived (including echoes of our own).
    MessageReceived(ChatMessage),
    ParticipantJoined(Participant),
    /// Carries the departing participant's id.
    ParticipantLeft(String),
    /// An execution result arrived, or a run was rejected locally.
    ExecutionFinished(ExecutionOutput),
    /// Server-reported fatal error; the session is now `Errored`.
    SessionError { message: String },
}

const DEFAULT_LANGUAGE: &str = "javascript";

/// Locally mirrored room state.
#[derive(Debug)]
pub struct RoomState {
    connection: ConnectionState,
    code: String,
    language: String,
    syntax: Option<SyntaxProfile>,
    participants: HashMap<String, Participant>,
    messages: Vec<ChatMessage>,
    output: Option<ExecutionOutput>,
    running: bool,
}

impl Default for RoomState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            code: String::new(),
            language: DEFAULT_LANGUAGE.to_owned(),
            syntax: languages::syntax_profile(DEFAULT_LANGUAGE),
            participants: HashMap::new(),
            messages: Vec::new(),
            output: None,
            running: false,
        }
    }
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound server event. Returns the notification to forward
    /// to the caller, or `None` when the event caused no observable change.
    ///
    /// Events arriving after teardown are dropped: `leave()` clears the
    /// mirror while in-flight frames may still be decoding, and those
    /// frames must not repopulate it. Only a fresh connection (and its
    /// `roomData` snapshot) fills the state again.
    pub fn apply(&mut self, event: ServerEvent) -> Option<SessionEvent> {
        if self.connection == ConnectionState::Disconnected {
            log::debug!("dropping in-flight event after teardown");
            return None;
        }
        match event {
            ServerEvent::RoomData(snapshot) => {
                // Wholesale roster replacement; safe to apply repeatedly.
                self.participants = snapshot
                    .participants_list
                    .into_iter()
                    .map(|p| (p.id.clone(), p))
                    .collect();
                if let Some(code) = snapshot.current_code {
                    self.code = code;
                }
                if let Some(language) = snapshot.language {
                    self.syntax = languages::syntax_profile(&language);
                    self.language = language;
                }
                log::debug!(
                    "room snapshot applied: {} participants, language {}",
                    self.participants.len(),
                    self.language
                );
                Some(SessionEvent::RoomSynced)
            }
            ServerEvent::UpdateCode(new_code) => {
                // Byte-for-byte compare suppresses echoes of our own edits.
                if new_code == self.code {
                    return None;
                }
                self.code = new_code.clone();
                Some(SessionEvent::CodeUpdated(new_code))
            }
            ServerEvent::NewMessage(message) => {
                // Append-only, arrival order. Duplicate delivery duplicates
                // the entry: the payload carries no dedup key.
                self.messages.push(message.clone());
                Some(SessionEvent::MessageReceived(message))
            }
            ServerEvent::UserJoined(participant) => {
                self.participants
                    .insert(participant.id.clone(), participant.clone());
                Some(SessionEvent::ParticipantJoined(participant))
            }
            ServerEvent::UserLeft(id) => {
                if self.participants.remove(&id).is_none() {
                    return None;
                }
                Some(SessionEvent::ParticipantLeft(id))
            }
            ServerEvent::CodeOutput(output) => {
                // Latest wins; a late result for a superseded run simply
                // overwrites.
                self.output = Some(output.clone());
                self.running = false;
                Some(SessionEvent::ExecutionFinished(output))
            }
            ServerEvent::Error { message } => {
                self.connection = ConnectionState::Errored;
                Some(SessionEvent::SessionError { message })
            }
        }
    }

    /// Optimistic local edit of the code mirror.
    pub fn set_code_local(&mut self, code: String) {
        self.code = code;
    }

    /// Start an execution attempt: running flag on, previous result gone.
    pub fn begin_execution(&mut self) {
        self.running = true;
        self.output = None;
    }

    /// Store a locally synthesized result (e.g. unsupported language).
    pub fn finish_execution(&mut self, output: ExecutionOutput) {
        self.output = Some(output);
        self.running = false;
    }

    pub fn mark_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    pub fn mark_connected(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    pub fn mark_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
    }

    /// Disconnect cleanup. Returns `false` when the session was already
    /// torn down, so the cleanup and its notification fire exactly once
    /// whether the close came from `leave()` or from the transport.
    pub fn teardown(&mut self) -> bool {
        if self.connection == ConnectionState::Disconnected {
            return false;
        }
        self.connection = ConnectionState::Disconnected;
        self.clear();
        true
    }

    fn clear(&mut self) {
        self.code.clear();
        self.language = DEFAULT_LANGUAGE.to_owned();
        self.syntax = languages::syntax_profile(DEFAULT_LANGUAGE);
        self.participants.clear();
        self.messages.clear();
        self.output = None;
        self.running = false;
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn syntax(&self) -> Option<SyntaxProfile> {
        self.syntax
    }

    pub fn participants(&self) -> &HashMap<String, Participant> {
        &self.participants
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn output(&self) -> Option<&ExecutionOutput> {
        self.output.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
