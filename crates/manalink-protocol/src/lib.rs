//! Wire protocol framework for manalink.
//!
//! This crate knows how the game's binary messages are shaped, but not what
//! any particular message means:
//!
//! - **Length tables** ([`PacketTable`], [`ServerType`]): how many bytes
//!   each opcode occupies, per server family.
//! - **Framing** ([`Framer`]): cutting the received byte stream into
//!   whole messages.
//! - **Reading / writing** ([`MessageIn`], [`MessageOut`]): typed,
//!   little-endian field access with fixed-width string rules.
//! - **Dispatch** ([`MessageHandler`], [`Dispatcher`]): routing each
//!   message to the handler registered for its opcode.
//!
//! ```text
//! Transport (bytes) → Framer → MessageIn → Dispatcher → MessageHandler
//! MessageHandler → MessageOut → Outbox → Transport (bytes)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod dispatch;
mod error;
mod framer;
pub mod opcodes;
mod reader;
mod tables;
mod writer;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use dispatch::{Dispatch, Dispatcher, MessageHandler};
pub use error::ProtocolError;
pub use framer::Framer;
pub use reader::{MessageIn, ReadError};
pub use tables::{PacketLength, PacketTable, ServerType};
pub use writer::{MessageOut, VARIABLE_HEADER};
