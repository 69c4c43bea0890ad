//! `Client` builder and connection loop.
//!
//! This is the entry point for talking to a game server. It ties together
//! all the layers: transport → framer → dispatcher → handlers, and the
//! handlers' outbox back into the transport.

use std::sync::Arc;

use manalink_handlers::{
    AdminHandler, AdminSink, BeingLookup, ChatHandler, ChatSink, GeneralHandler, HandlerContext,
};
use manalink_protocol::{Dispatcher, Framer, MessageHandler, MessageIn};
use manalink_session::{RelationStore, Session, SessionConfig, SessionState};
use manalink_transport::{
    Connection, ConnectionId, Connector, Outbox, OutboxReceiver, TcpConnection, TcpConnector,
    TransportError, outbox,
};

use crate::{ClientConfig, ManalinkError};

/// Builder for configuring a [`Client`].
///
/// # Example
///
/// ```rust,ignore
/// use manalink::prelude::*;
///
/// let client = Client::builder()
///     .session(SessionConfig::new(ServerType::EAthena, "Alice"))
///     .chat_sink(Arc::new(RecordingSink::new()))
///     .connect("127.0.0.1:5121")
///     .await?;
/// let chat = client.chat();
/// client.run().await
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    relations: Option<Arc<dyn RelationStore>>,
    chat_sink: Option<Arc<dyn ChatSink>>,
    admin_sink: Option<Arc<dyn AdminSink>>,
    beings: Option<Arc<dyn BeingLookup>>,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Sets whether framing errors end the connection.
    pub fn strict_framing(mut self, strict: bool) -> Self {
        self.config.strict_framing = strict;
        self
    }

    /// Uses `relations` for chat filtering. Keep a clone of the `Arc` to
    /// change relations while the client runs. Without it, every player
    /// gets the session's default permissions.
    pub fn relations(mut self, relations: Arc<dyn RelationStore>) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn chat_sink(mut self, sink: Arc<dyn ChatSink>) -> Self {
        self.chat_sink = Some(sink);
        self
    }

    pub fn admin_sink(mut self, sink: Arc<dyn AdminSink>) -> Self {
        self.admin_sink = Some(sink);
        self
    }

    pub fn beings(mut self, beings: Arc<dyn BeingLookup>) -> Self {
        self.beings = Some(beings);
        self
    }

    /// Connects over TCP and builds the client.
    ///
    /// # Errors
    /// [`ManalinkError::ConnectTimeout`] when the handshake takes longer
    /// than the configured timeout, [`ManalinkError::Transport`] when the
    /// connection is refused.
    pub async fn connect(self, addr: &str) -> Result<Client<TcpConnection>, ManalinkError> {
        let config = self.config.clone().validated();
        let conn = tokio::time::timeout(config.connect_timeout(), TcpConnector.connect(addr))
            .await
            .map_err(|_| ManalinkError::ConnectTimeout {
                addr: addr.to_string(),
                secs: config.connect_timeout_secs,
            })??;
        Ok(self.build(conn))
    }

    /// Builds the client around an already established connection.
    pub fn build<C: Connection>(self, conn: C) -> Client<C> {
        let config = self.config.validated();
        let session = Arc::new(Session::new(config.session.clone()));
        let (outbox, sent) = outbox();

        let mut ctx = HandlerContext::new(outbox.clone(), Arc::clone(&session));
        if let Some(relations) = self.relations {
            ctx = ctx.with_relations(relations);
        }
        if let Some(sink) = self.chat_sink {
            ctx = ctx.with_chat_sink(sink);
        }
        if let Some(sink) = self.admin_sink {
            ctx = ctx.with_admin_sink(sink);
        }
        if let Some(beings) = self.beings {
            ctx = ctx.with_beings(beings);
        }

        let general = Arc::new(GeneralHandler::new(ctx.clone()));
        let chat = Arc::new(ChatHandler::new(ctx.clone()));
        let admin = Arc::new(AdminHandler::new(ctx, Arc::clone(&chat)));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(general.clone());
        dispatcher.register(admin.clone());
        dispatcher.register(chat.clone());

        tracing::debug!(
            conn_id = %conn.id(),
            server = %session.server_type(),
            opcodes = dispatcher.len(),
            "client built"
        );

        Client {
            framer: Framer::new(session.server_type().packet_table()),
            conn,
            config,
            session,
            outbox,
            sent,
            dispatcher,
            general,
            chat,
            admin,
        }
    }
}

/// One connection to a game server.
///
/// Grab the handlers you need with [`chat`](Self::chat) and
/// [`admin`](Self::admin), then call [`run`](Self::run). Requests made
/// through the handlers are queued and written by the loop.
pub struct Client<C: Connection> {
    conn: C,
    config: ClientConfig,
    session: Arc<Session>,
    outbox: Outbox,
    sent: OutboxReceiver,
    framer: Framer,
    dispatcher: Dispatcher,
    general: Arc<GeneralHandler>,
    chat: Arc<ChatHandler>,
    admin: Arc<AdminHandler>,
}

/// What woke the loop up.
enum Step {
    Outgoing(Option<Vec<u8>>),
    Incoming(Result<Option<Vec<u8>>, TransportError>),
}

impl Client<TcpConnection> {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<C: Connection> Client<C> {
    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    pub fn chat(&self) -> Arc<ChatHandler> {
        Arc::clone(&self.chat)
    }

    pub fn admin(&self) -> Arc<AdminHandler> {
        Arc::clone(&self.admin)
    }

    /// A handle for queueing raw frames next to the handlers' requests.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Registers an extra handler. It takes over every opcode it declares,
    /// including opcodes a built-in handler owned so far.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        self.dispatcher.register(handler);
    }

    /// Runs the connection until the server closes it or a fatal error
    /// occurs.
    ///
    /// Received bytes are framed and dispatched strictly in arrival order.
    /// Queued requests are written between reads. On exit the dispatcher is
    /// cleared, the outbox stops accepting requests and the connection is
    /// closed.
    ///
    /// # Errors
    /// - [`ManalinkError::ConnectionProblem`] when the server reports one.
    /// - [`ManalinkError::Protocol`] on a framing error with
    ///   `strict_framing` on.
    /// - [`ManalinkError::Transport`] when reading or writing fails.
    pub async fn run(mut self) -> Result<(), ManalinkError> {
        let conn_id = self.conn.id();
        tracing::info!(%conn_id, server = %self.session.server_type(), "client loop started");

        let result = self.run_loop().await;
        self.shutdown(&result).await;

        match &result {
            Ok(()) => tracing::info!(%conn_id, "client loop stopped"),
            Err(e) => tracing::info!(%conn_id, error = %e, "client loop stopped with error"),
        }
        result
    }

    async fn run_loop(&mut self) -> Result<(), ManalinkError> {
        loop {
            let step = tokio::select! {
                biased;
                frame = self.sent.recv() => Step::Outgoing(frame),
                chunk = self.conn.recv() => Step::Incoming(chunk),
            };

            match step {
                Step::Outgoing(Some(frame)) => self.conn.send(&frame).await?,
                Step::Outgoing(None) => return Ok(()),
                Step::Incoming(chunk) => match chunk? {
                    Some(bytes) => self.process(&bytes)?,
                    None => {
                        tracing::info!(conn_id = %self.conn.id(), "server closed connection");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Frames and dispatches everything `bytes` completes.
    fn process(&mut self, bytes: &[u8]) -> Result<(), ManalinkError> {
        self.framer.push(bytes);
        loop {
            let frame = match self.framer.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(e) if self.config.strict_framing => {
                    tracing::error!(
                        conn_id = %self.conn.id(),
                        error = %e,
                        buffered = self.framer.buffered(),
                        "framing failed, closing connection"
                    );
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::warn!(
                        conn_id = %self.conn.id(),
                        error = %e,
                        discarded = self.framer.buffered(),
                        "framing failed, discarding buffered bytes"
                    );
                    self.framer.reset();
                    return Ok(());
                }
            };
            self.handle_frame(&frame)?;
        }
    }

    fn handle_frame(&mut self, frame: &[u8]) -> Result<(), ManalinkError> {
        let mut msg = MessageIn::new(frame);
        self.dispatcher.dispatch(&mut msg);

        if let Some(problem) = self.general.take_problem() {
            return Err(problem.into());
        }
        if self.session.state() == SessionState::Connecting {
            self.session.transition(SessionState::Online)?;
        }
        Ok(())
    }

    async fn shutdown(&mut self, result: &Result<(), ManalinkError>) {
        self.dispatcher.clear();
        self.sent.close();

        if let Err(e) = result {
            let failed = SessionState::Failed {
                reason: e.to_string(),
            };
            if let Err(err) = self.session.transition(failed) {
                tracing::debug!(error = %err, "session not marked failed");
            }
        }
        if let Err(err) = self.session.transition(SessionState::Closed) {
            tracing::debug!(error = %err, "session not marked closed");
        }
        if let Err(err) = self.conn.close().await {
            tracing::debug!(conn_id = %self.conn.id(), error = %err, "close failed");
        }
    }
}
