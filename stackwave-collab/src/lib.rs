//! # stackwave-collab — real-time room client for StackWave
//!
//! Client library for StackWave collaboration rooms: one WebSocket
//! session per room carrying code synchronization, chat, presence
//! (join/leave), and remote code execution.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   SessionEvent    ┌──────────────┐
//! │ Caller (UI)  │ ◄──────────────── │ RoomSession  │
//! │              │ ────────────────► │              │
//! └──────────────┘   edit/chat/run   └──────┬───────┘
//!                                           │ JSON events
//!                                           ▼
//!                                    ┌──────────────┐
//!                                    │ Room server  │
//!                                    │ (authority)  │
//!                                    └──────────────┘
//! ```
//!
//! The server owns the room: the client holds a local mirror that inbound
//! events overwrite (last-writer-wins, no CRDT merge), and every
//! disconnect clears the mirror so a new connection starts blank. There
//! is no automatic reconnection and no offline edit buffering — both are
//! caller policy.
//!
//! ## Modules
//!
//! - [`protocol`] — JSON wire events (names match the server contract)
//! - [`room`] — synchronous session state machine
//! - [`client`] — WebSocket client and connection lifecycle
//! - [`languages`] — syntax profile and execution engine id lookups

pub mod client;
pub mod languages;
pub mod protocol;
pub mod room;

// Re-exports for convenience
pub use client::{ClientConfig, ClientError, RoomSession};
pub use languages::{execution_id, syntax_profile, SyntaxProfile};
pub use protocol::{
    ChatMessage, ClientEvent, ExecutionOutput, ExecutionVerdict, Participant, ProtocolError,
    RoomSnapshot, ServerEvent,
};
pub use room::{ConnectionState, RoomState, SessionEvent};
