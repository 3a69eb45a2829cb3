//! WebSocket room client.
//!
//! [`RoomSession`] owns one connection to a collaboration room:
//! - Connection lifecycle (connect, join, leave)
//! - Inbound event dispatch into [`RoomState`]
//! - Outbound actions (code edits, chat, remote execution)
//!
//! Outbound sends are fire-and-forget pushes onto a writer channel;
//! inbound frames are applied by a single reader task, so session state
//! mutates in arrival order. There is no automatic reconnection: after a
//! disconnect or a server error the caller decides whether to build a new
//! session.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;

use crate::languages::{self, SyntaxProfile};
use crate::protocol::{
    ChatMessage, ClientEvent, ExecutionOutput, Participant, ServerEvent,
};
use crate::room::{ConnectionState, RoomState, SessionEvent};

/// Client connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base WebSocket URL, e.g. `ws://localhost:3000/rooms`.
    pub server_url: String,
    /// Opaque bearer credential, passed as a connect-time query parameter.
    pub auth_token: String,
    /// Capacity of the caller-facing event channel.
    pub event_capacity: usize,
    /// Capacity of the outgoing send channel.
    pub outgoing_capacity: usize,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            auth_token: auth_token.into(),
            event_capacity: 256,
            outgoing_capacity: 256,
        }
    }
}

/// Connection-level failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("session is already connected")]
    AlreadyConnected,
    #[error("connection closed")]
    ConnectionClosed,
}

/// One room membership over one transport connection.
///
/// Created per room entry, destroyed on leave; state never carries over
/// between activations.
pub struct RoomSession {
    room_id: String,
    local_user: Participant,
    config: ClientConfig,

    /// Shared with the reader task.
    state: Arc<RwLock<RoomState>>,

    /// Send half of the writer channel; present only while connected.
    outgoing_tx: Option<mpsc::Sender<ClientEvent>>,

    /// Caller-facing notifications.
    event_tx: mpsc::Sender<SessionEvent>,
    event_rx: Option<mpsc::Receiver<SessionEvent>>,
}

impl RoomSession {
    pub fn new(config: ClientConfig, room_id: impl Into<String>, local_user: Participant) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        Self {
            room_id: room_id.into(),
            local_user,
            config,
            state: Arc::new(RwLock::new(RoomState::new())),
            outgoing_tx: None,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<SessionEvent>> {
        self.event_rx.take()
    }

    /// Open the transport and join the room.
    ///
    /// The session becomes `Connected` once the `joinRoom` intent is handed
    /// to the send channel; the server's confirmation arrives later as a
    /// `roomData` event. On failure the session stays `Disconnected`.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        if self.outgoing_tx.is_some() {
            return Err(ClientError::AlreadyConnected);
        }
        self.state.write().await.mark_connecting();

        let url = format!(
            "{}/{}?token={}",
            self.config.server_url, self.room_id, self.config.auth_token
        );
        let ws_stream = match tokio_tungstenite::connect_async(&url).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                self.state.write().await.mark_disconnected();
                return Err(ClientError::Connect(e.to_string()));
            }
        };
        let (mut ws_writer, mut ws_reader) = ws_stream.split();

        // Writer task: drain the outgoing channel into the socket. When the
        // channel closes (leave() drops the sender) the socket is closed,
        // which in turn ends the reader task.
        let (out_tx, mut out_rx) = mpsc::channel::<ClientEvent>(self.config.outgoing_capacity);
        self.outgoing_tx = Some(out_tx);
        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                match event.encode() {
                    Ok(text) => {
                        if ws_writer.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("dropping unencodable event: {e}"),
                }
            }
            let _ = ws_writer.close().await;
        });

        // Announce ourselves before reporting Connected.
        let join = ClientEvent::JoinRoom {
            room_id: self.room_id.clone(),
            user: self.local_user.clone(),
        };
        if let Some(tx) = &self.outgoing_tx {
            if tx.send(join).await.is_err() {
                // Writer died before the join went out; a failed connect
                // leaves the session Disconnected and reusable.
                self.outgoing_tx = None;
                self.state.write().await.mark_disconnected();
                return Err(ClientError::ConnectionClosed);
            }
        }
        self.state.write().await.mark_connected();
        let _ = self.event_tx.send(SessionEvent::Connected).await;
        log::info!(
            "joined room {} as {}",
            self.room_id,
            self.local_user.username
        );

        // Reader task: decode inbound frames, apply them to the shared
        // state, forward the resulting notifications.
        let state = self.state.clone();
        let event_tx = self.event_tx.clone();
        let room_id = self.room_id.clone();
        tokio::spawn(async move {
            while let Some(frame) = ws_reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ServerEvent::decode(text.as_str()) {
                        Ok(event) => {
                            let notification = { state.write().await.apply(event) };
                            if let Some(notification) = notification {
                                let _ = event_tx.send(notification).await;
                            }
                        }
                        Err(e) => log::warn!("skipping undecodable frame: {e}"),
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }

            // Transport gone: clear the mirror so a later session starts
            // blank. The teardown guard keeps this from double-firing when
            // leave() already ran.
            let torn_down = { state.write().await.teardown() };
            if torn_down {
                log::info!("disconnected from room {room_id}");
                let _ = event_tx.send(SessionEvent::Disconnected).await;
            }
        });

        Ok(())
    }

    /// Apply a local edit to the code mirror and, while connected,
    /// broadcast it. Disconnected edits stay local and are never queued
    /// for replay.
    pub async fn edit_code(&self, new_code: impl Into<String>) {
        let new_code = new_code.into();
        let connected = {
            let mut state = self.state.write().await;
            state.set_code_local(new_code.clone());
            state.is_connected()
        };
        if !connected {
            return;
        }
        self.emit(ClientEvent::CodeChange {
            room_id: self.room_id.clone(),
            new_code,
        })
        .await;
    }

    /// Send a chat message. Whitespace-only text and disconnected sessions
    /// are silent no-ops. The message is not appended locally; the
    /// transcript grows only when the server echoes it back.
    pub async fn send_chat(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() || !self.state.read().await.is_connected() {
            return;
        }
        self.emit(ClientEvent::SendMessage {
            room_id: self.room_id.clone(),
            text: text.to_owned(),
        })
        .await;
    }

    /// Request remote execution of `code`.
    ///
    /// Empty code and disconnected sessions are silent no-ops. A language
    /// without an execution id produces a locally synthesized rejection
    /// result instead of a wire event. Overlapping requests are tolerated:
    /// the latest `codeOutput` wins.
    pub async fn run_code(&self, code: &str, language_name: &str, stdin: Option<String>) {
        if code.is_empty() || !self.state.read().await.is_connected() {
            return;
        }
        self.state.write().await.begin_execution();

        let Some(language_id) = languages::execution_id(language_name) else {
            let output = ExecutionOutput::unsupported_language(language_name);
            self.state.write().await.finish_execution(output.clone());
            let _ = self
                .event_tx
                .send(SessionEvent::ExecutionFinished(output))
                .await;
            return;
        };
        self.emit(ClientEvent::RunCode {
            room_id: self.room_id.clone(),
            language_id,
            code: code.to_owned(),
            stdin,
        })
        .await;
    }

    /// Leave the room: close the transport and clear all mirrored state.
    ///
    /// Dropping the outgoing sender ends the writer task, which closes the
    /// socket; the reader task then sees the close but its teardown is a
    /// no-op because the cleanup already ran here.
    pub async fn leave(&mut self) {
        self.outgoing_tx = None;
        let torn_down = { self.state.write().await.teardown() };
        if torn_down {
            log::info!("left room {}", self.room_id);
            let _ = self.event_tx.send(SessionEvent::Disconnected).await;
        }
    }

    async fn emit(&self, event: ClientEvent) {
        if let Some(tx) = &self.outgoing_tx {
            if tx.send(event).await.is_err() {
                log::warn!("outgoing channel closed; event dropped");
            }
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn local_user(&self) -> &Participant {
        &self.local_user
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.read().await.connection()
    }

    pub async fn code(&self) -> String {
        self.state.read().await.code().to_owned()
    }

    pub async fn language(&self) -> String {
        self.state.read().await.language().to_owned()
    }

    pub async fn syntax(&self) -> Option<SyntaxProfile> {
        self.state.read().await.syntax()
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.state.read().await.participants().values().cloned().collect()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages().to_vec()
    }

    pub async fn execution_output(&self) -> Option<ExecutionOutput> {
        self.state.read().await.output().cloned()
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ExecutionVerdict;
    use tokio::sync::mpsc::error::TryRecvError;

    fn session() -> RoomSession {
        RoomSession::new(
            ClientConfig::new("ws://127.0.0.1:1", "test-token"),
            "room-1",
            Participant::new("u1", "alice"),
        )
    }

    /// Wire a session to a capture channel and mark it connected, without
    /// a real transport.
    async fn connected_session() -> (RoomSession, mpsc::Receiver<ClientEvent>) {
        let mut session = session();
        let (tx, rx) = mpsc::channel(16);
        session.outgoing_tx = Some(tx);
        session.state.write().await.mark_connected();
        (session, rx)
    }

    #[tokio::test]
    async fn disconnected_edits_stay_local() {
        let mut session = session();
        let (tx, mut outgoing) = mpsc::channel(16);
        session.outgoing_tx = Some(tx);
        // Still Disconnected: the channel exists but nothing may use it.

        session.edit_code("first").await;
        session.edit_code("second").await;

        assert_eq!(session.code().await, "second");
        assert!(matches!(outgoing.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn connected_edit_broadcasts_code_change() {
        let (session, mut outgoing) = connected_session().await;
        session.edit_code("let x = 1;").await;

        assert_eq!(session.code().await, "let x = 1;");
        assert_eq!(
            outgoing.try_recv().unwrap(),
            ClientEvent::CodeChange {
                room_id: "room-1".into(),
                new_code: "let x = 1;".into(),
            }
        );
    }

    #[tokio::test]
    async fn blank_chat_is_a_noop() {
        let (session, mut outgoing) = connected_session().await;
        session.send_chat("").await;
        session.send_chat("   ").await;

        assert!(matches!(outgoing.try_recv(), Err(TryRecvError::Empty)));
        assert!(session.messages().await.is_empty());
    }

    #[tokio::test]
    async fn chat_text_is_trimmed_before_sending() {
        let (session, mut outgoing) = connected_session().await;
        session.send_chat("  hello  ").await;

        assert_eq!(
            outgoing.try_recv().unwrap(),
            ClientEvent::SendMessage {
                room_id: "room-1".into(),
                text: "hello".into(),
            }
        );
        // Not appended optimistically; the server echo owns the transcript.
        assert!(session.messages().await.is_empty());
    }

    #[tokio::test]
    async fn chat_while_disconnected_is_a_noop() {
        let session = session();
        session.send_chat("hello").await;
        assert!(session.messages().await.is_empty());
    }

    #[tokio::test]
    async fn unsupported_language_synthesizes_rejection() {
        let (mut session, mut outgoing) = connected_session().await;
        let mut events = session.take_event_rx().unwrap();

        session.run_code("DISPLAY '1'.", "cobol", None).await;

        assert!(matches!(outgoing.try_recv(), Err(TryRecvError::Empty)));
        assert!(!session.is_running().await);
        let output = session.execution_output().await.unwrap();
        assert_eq!(
            output.stderr.as_deref(),
            Some("Execution for language \"cobol\" is not supported yet.")
        );
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::ExecutionFinished(_)
        ));
    }

    #[tokio::test]
    async fn run_code_emits_mapped_language_id() {
        let (session, mut outgoing) = connected_session().await;
        session.run_code("print(1)", "python", None).await;

        assert!(session.is_running().await);
        assert!(session.execution_output().await.is_none());
        assert_eq!(
            outgoing.try_recv().unwrap(),
            ClientEvent::RunCode {
                room_id: "room-1".into(),
                language_id: 109,
                code: "print(1)".into(),
                stdin: None,
            }
        );

        // Later verdict from the server clears the running flag.
        let verdict = ExecutionOutput {
            stdout: Some("1\n".into()),
            status: Some(ExecutionVerdict {
                id: 3,
                description: "Accepted".into(),
            }),
            ..ExecutionOutput::default()
        };
        session
            .state
            .write()
            .await
            .apply(ServerEvent::CodeOutput(verdict));

        assert!(!session.is_running().await);
        let output = session.execution_output().await.unwrap();
        assert_eq!(output.stdout.as_deref(), Some("1\n"));
        assert!(output.is_accepted());
    }

    #[tokio::test]
    async fn empty_code_run_is_a_noop() {
        let (session, mut outgoing) = connected_session().await;
        session.run_code("", "python", None).await;

        assert!(!session.is_running().await);
        assert!(matches!(outgoing.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn run_while_disconnected_is_a_noop() {
        let session = session();
        session.run_code("print(1)", "python", None).await;
        assert!(!session.is_running().await);
        assert!(session.execution_output().await.is_none());
    }

    #[tokio::test]
    async fn leave_clears_state_and_notifies_once() {
        let (mut session, _outgoing) = connected_session().await;
        let mut events = session.take_event_rx().unwrap();
        session
            .state
            .write()
            .await
            .apply(ServerEvent::UserJoined(Participant::new("u2", "bob")));
        session.edit_code("draft").await;

        session.leave().await;

        assert_eq!(
            session.connection_state().await,
            ConnectionState::Disconnected
        );
        assert!(session.participants().await.is_empty());
        assert!(session.messages().await.is_empty());
        assert_eq!(session.code().await, "");
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Disconnected);

        // A second leave produces no second notification.
        session.leave().await;
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn take_event_rx_is_single_use() {
        let mut session = session();
        assert!(session.take_event_rx().is_some());
        assert!(session.take_event_rx().is_none());
    }
}
