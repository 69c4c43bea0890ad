//! Session context and player relations for manalink.
//!
//! This crate holds the state that lives as long as one server connection
//! and that several handlers consult:
//!
//! 1. **Session** ([`Session`], [`SessionConfig`]): which server family we
//!    talk to, who the local player is, which optional server features are
//!    on, and where the connection is in its lifecycle.
//! 2. **Relations** ([`PlayerRelations`]): the user's friend / ignore /
//!    enemy classifications and the chat permissions each one grants.
//!
//! Handlers receive both through their constructors instead of reaching for
//! process-wide singletons.
//!
//! # How it fits in the stack
//!
//! ```text
//! Handlers (above)  ← read relations on every decode, read session config
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides ServerType
//! ```

mod error;
mod relations;
mod session;

pub use error::SessionError;
pub use relations::{Permissions, PlayerRelations, Relation, RelationStore};
pub use session::{NICK_LEN, Session, SessionConfig, SessionState};
