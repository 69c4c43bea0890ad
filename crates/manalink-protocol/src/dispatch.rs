//! Opcode → handler routing.
//!
//! A [`MessageHandler`] declares the opcodes it decodes. The [`Dispatcher`]
//! maps each of those opcodes to the handler and hands every incoming
//! message to exactly one owner.
//!
//! Registering a handler for an opcode that already has an owner replaces
//! the owner: last registration wins. This is how a server variant swaps
//! in its own decoder for a message the default handler also declares.
//!
//! The dispatcher is used from a single task and takes `&mut self` to
//! change registrations, so registrations cannot change in the middle of a
//! dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::MessageIn;

/// Decodes a set of opcodes.
///
/// `handle_message` runs synchronously on the client loop, one message at a
/// time, and must consume each message's full wire layout even when the
/// content is discarded. Handlers take `&self`: any state they keep (such as
/// a queue of pending requests) lives behind their own interior mutability
/// so that user code can hold an `Arc` to the same handler and send
/// requests through it.
pub trait MessageHandler: Send + Sync + 'static {
    /// Opcodes this handler decodes.
    fn handled_messages(&self) -> &[u16];

    /// Decodes one message whose opcode is in [`handled_messages`](Self::handled_messages).
    fn handle_message(&self, msg: &mut MessageIn<'_>);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Outcome of [`Dispatcher::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A registered handler decoded the message.
    Handled,
    /// No handler owns the opcode; the message was dropped.
    Unregistered,
}

/// Routes incoming messages to their registered handler.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<u16, Arc<dyn MessageHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every opcode it declares, replacing any
    /// previous owner of those opcodes.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        let name = handler.name();
        for &opcode in handler.handled_messages() {
            if let Some(previous) = self.handlers.insert(opcode, Arc::clone(&handler)) {
                if !Arc::ptr_eq(&previous, &handler) {
                    tracing::debug!(
                        opcode,
                        previous = previous.name(),
                        handler = name,
                        "opcode handler replaced"
                    );
                }
            }
        }
        tracing::debug!(handler = name, count = handler.handled_messages().len(), "handler registered");
    }

    /// Removes every opcode currently owned by `handler`.
    ///
    /// Opcodes the handler declared but that another handler took over
    /// later stay with the new owner.
    pub fn unregister(&mut self, handler: &Arc<dyn MessageHandler>) {
        self.handlers.retain(|_, owner| !Arc::ptr_eq(owner, handler));
        tracing::debug!(handler = handler.name(), "handler unregistered");
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// The current owner of `opcode`.
    pub fn handler_for(&self, opcode: u16) -> Option<&Arc<dyn MessageHandler>> {
        self.handlers.get(&opcode)
    }

    /// Number of opcodes with an owner.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Hands `msg` to the owner of its opcode.
    pub fn dispatch(&self, msg: &mut MessageIn<'_>) -> Dispatch {
        let opcode = msg.id();
        let Some(handler) = self.handlers.get(&opcode) else {
            tracing::warn!(opcode, len = msg.len(), "no handler for opcode, message dropped");
            return Dispatch::Unregistered;
        };

        handler.handle_message(msg);

        if let Some(err) = msg.error() {
            tracing::debug!(
                opcode,
                handler = handler.name(),
                field = err.field,
                offset = err.offset,
                "malformed message"
            );
        } else if msg.remaining() > 0 {
            tracing::trace!(
                opcode,
                handler = handler.name(),
                unread = msg.remaining(),
                "handler left bytes unread"
            );
        }
        Dispatch::Handled
    }
}
