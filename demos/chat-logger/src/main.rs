//! Connects to a game server and prints every chat event as a JSON line.
//!
//! ```text
//! chat-logger 127.0.0.1:5121 --nick Alice --join '#trade' --ignore Spammer
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the level), events to stdout.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use manalink::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Server {
    Eathena,
    Tmwathena,
}

impl From<Server> for ServerType {
    fn from(server: Server) -> Self {
        match server {
            Server::Eathena => ServerType::EAthena,
            Server::Tmwathena => ServerType::TmwAthena,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chat-logger", version, about = "Print game chat as JSON lines")]
struct Cli {
    /// Map server address, `host:port`.
    addr: String,
    /// Name of the logged-in character.
    #[arg(long)]
    nick: String,
    /// Server family.
    #[arg(long, value_enum, default_value_t = Server::Eathena)]
    server: Server,
    /// The server understands native channel join requests.
    #[arg(long)]
    native_channels: bool,
    /// Keep reading after a framing error instead of disconnecting.
    #[arg(long)]
    lenient: bool,
    /// Channels to join after connecting.
    #[arg(long = "join")]
    channels: Vec<String>,
    /// Players whose chat is dropped.
    #[arg(long = "ignore")]
    ignored: Vec<String>,
    /// Players marked as friends.
    #[arg(long = "friend")]
    friends: Vec<String>,
    /// Milliseconds between flushes of recorded events.
    #[arg(long, default_value_t = 200)]
    flush_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    manalink::init_tracing();

    let mut session = SessionConfig::new(cli.server.into(), cli.nick.clone());
    session.join_channel_supported = cli.native_channels;

    let relations = Arc::new(PlayerRelations::new(session.default_permissions));
    for nick in &cli.ignored {
        relations
            .set_relation(nick, Relation::Ignored)
            .with_context(|| format!("ignore {nick}"))?;
    }
    for nick in &cli.friends {
        relations
            .set_relation(nick, Relation::Friend)
            .with_context(|| format!("befriend {nick}"))?;
    }

    let sink = Arc::new(RecordingSink::new());
    let client = ClientBuilder::new()
        .session(session)
        .strict_framing(!cli.lenient)
        .relations(relations)
        .chat_sink(sink.clone())
        .admin_sink(sink.clone())
        .connect(&cli.addr)
        .await
        .with_context(|| format!("connect to {}", cli.addr))?;

    tracing::info!(addr = %cli.addr, nick = %cli.nick, id = %client.id(), "connected");

    let chat = client.chat();
    for channel in &cli.channels {
        chat.join_channel(channel)
            .with_context(|| format!("join {channel}"))?;
    }

    let run = client.run();
    tokio::pin!(run);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut flush = tokio::time::interval(Duration::from_millis(cli.flush_ms.max(10)));

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break Ok(());
            }
            _ = flush.tick() => print_events(&sink)?,
        }
    };
    print_events(&sink)?;

    result.context("connection ended")
}

fn print_events(sink: &RecordingSink) -> Result<()> {
    let lines = sink.drain_json_lines().context("encode events")?;
    if lines.is_empty() {
        return Ok(());
    }
    let mut out = std::io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
