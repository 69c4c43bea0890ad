//! # manalink
//!
//! Client framework for the binary wire protocols of eAthena-family
//! MMORPG servers.
//!
//! manalink connects to a game server, cuts the byte stream into messages
//! using the server family's length table, and hands each message to the
//! handler that owns its opcode. Handlers turn chat, whisper, GM and
//! connection messages into calls on sink traits you implement, and offer
//! typed methods for sending requests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use manalink::prelude::*;
//!
//! # async fn demo() -> Result<(), ManalinkError> {
//! manalink::init_tracing();
//!
//! let client = Client::builder()
//!     .session(SessionConfig::new(ServerType::EAthena, "Alice"))
//!     .chat_sink(Arc::new(RecordingSink::new()))
//!     .connect("127.0.0.1:5121")
//!     .await?;
//!
//! let chat = client.chat();
//! chat.whisper("Bob", "hello")?;
//! client.run().await
//! # }
//! ```
//!
//! ## Crates
//!
//! | crate                | layer                                        |
//! |----------------------|----------------------------------------------|
//! | `manalink-transport` | byte streams, outgoing frame queue           |
//! | `manalink-protocol`  | length tables, framing, reader/writer, dispatch |
//! | `manalink-session`   | session context, player relations            |
//! | `manalink-handlers`  | chat, admin and general handlers             |

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod client;
mod config;
mod error;
mod online;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, OnlineListConfig};
pub use error::ManalinkError;
pub use online::{
    FetchStatus, GroupedOnline, OnlineList, OnlineListSource, OnlineListWorker, OnlinePlayer,
};

pub use manalink_handlers as handlers;
pub use manalink_protocol as protocol;
pub use manalink_session as session;
pub use manalink_transport as transport;

/// Installs a `tracing` subscriber that logs to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling it
/// twice is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything a typical client needs in scope.
pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ManalinkError, OnlineList, OnlineListConfig,
        OnlineListSource, OnlineListWorker,
    };
    pub use manalink_handlers::{
        AdminHandler, AdminSink, BeingInfo, BeingKind, BeingLookup, ChatEvent, ChatHandler,
        ChatMsgType, ChatSink, ConnectionProblem, NullSink, RecordingSink, Speaker,
    };
    pub use manalink_protocol::{MessageHandler, MessageIn, MessageOut, ServerType};
    pub use manalink_session::{
        Permissions, PlayerRelations, Relation, RelationStore, Session, SessionConfig,
    };
}
