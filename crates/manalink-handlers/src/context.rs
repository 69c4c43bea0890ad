//! The per-connection context every handler is constructed with.

use std::sync::Arc;

use manalink_session::{PlayerRelations, RelationStore, Session};
use manalink_transport::Outbox;

use crate::{AdminSink, BeingLookup, ChatSink, NoBeings, NullSink};

/// Everything a handler needs from the rest of the client.
///
/// One context lives as long as one connection. Handlers clone the `Arc`s
/// they need out of it; there is no global "current handler" anywhere.
#[derive(Clone)]
pub struct HandlerContext {
    pub outbox: Outbox,
    pub session: Arc<Session>,
    pub relations: Arc<dyn RelationStore>,
    pub chat: Arc<dyn ChatSink>,
    pub admin: Arc<dyn AdminSink>,
    pub beings: Arc<dyn BeingLookup>,
}

impl HandlerContext {
    /// A context whose collaborators do nothing.
    ///
    /// Relations start empty with the session's default permissions.
    pub fn new(outbox: Outbox, session: Arc<Session>) -> Self {
        let relations = PlayerRelations::new(session.config().default_permissions);
        Self {
            outbox,
            session,
            relations: Arc::new(relations),
            chat: Arc::new(NullSink),
            admin: Arc::new(NullSink),
            beings: Arc::new(NoBeings),
        }
    }

    pub fn with_relations(mut self, relations: Arc<dyn RelationStore>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_chat_sink(mut self, chat: Arc<dyn ChatSink>) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_admin_sink(mut self, admin: Arc<dyn AdminSink>) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_beings(mut self, beings: Arc<dyn BeingLookup>) -> Self {
        self.beings = beings;
        self
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("session", &self.session)
            .field("outbox_closed", &self.outbox.is_closed())
            .finish_non_exhaustive()
    }
}
