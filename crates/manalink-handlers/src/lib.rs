//! Domain handlers for manalink.
//!
//! Each handler owns a set of opcodes and turns their messages into calls
//! on collaborator traits, and offers typed methods for the requests of
//! its domain:
//!
//! - [`ChatHandler`]: public chat, whispers, GM broadcasts, channels,
//!   chat rooms.
//! - [`AdminHandler`]: GM requests and replies.
//! - [`GeneralHandler`]: connection problems reported by the server.
//!
//! Handlers are built from a [`HandlerContext`] and registered with a
//! [`manalink_protocol::Dispatcher`] behind an `Arc`.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod admin;
pub mod chat;
mod context;
mod error;
mod general;
mod recording;
mod sink;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use admin::AdminHandler;
pub use chat::{ChatHandler, MAX_PET_TALK, WhisperQueue};
pub use context::HandlerContext;
pub use error::ConnectionProblem;
pub use general::GeneralHandler;
pub use recording::{ChatEvent, RecordingSink};
pub use sink::{
    AccountStats, AdminSink, BeingInfo, BeingKind, BeingLookup, ChatMsgType, ChatRoom, ChatSink,
    GENERAL_CHANNEL, NoBeings, NullSink, Speaker, TileChange,
};
