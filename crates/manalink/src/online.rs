//! Background fetch of the server's online-player list.
//!
//! Servers publish who is online as a plain text page, separate from the
//! game connection. The [`OnlineListWorker`] fetches it on its own tokio
//! task and never touches the client loop. The loop (or a UI tick) calls
//! [`OnlineListWorker::poll`] to pick up a fresh list when one is ready.
//!
//! The page format is one player per line, between an optional
//! `Online Players:` header and an optional `N users are online.` footer.
//! A `(GM)` suffix marks game masters.
//!
//! # Status
//!
//! ```text
//!   Idle ──→ Fetching ──→ Complete
//!               ↑  │
//!               │  └────→ Error
//!               └─ next refresh
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use manalink_session::{Relation, RelationStore};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ManalinkError, OnlineListConfig};

const GM_SUFFIX: &str = "(GM)";

// ---------------------------------------------------------------------------
// List model and parsing
// ---------------------------------------------------------------------------

/// One line of the online list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlinePlayer {
    pub nick: String,
    pub is_gm: bool,
}

/// A parsed online list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnlineList {
    pub players: Vec<OnlinePlayer>,
}

/// Online players split by the local user's relation to them.
///
/// Ignored players count as disregarded. Erased players are left out
/// entirely. Each group is sorted case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupedOnline {
    pub friends: Vec<String>,
    pub neutral: Vec<String>,
    pub disregarded: Vec<String>,
    pub enemies: Vec<String>,
}

impl OnlineList {
    /// Parses the text page served by the game server.
    pub fn parse(text: &str) -> Self {
        let players = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !is_header(line) && !is_footer(line))
            .map(|line| match line.strip_suffix(GM_SUFFIX) {
                Some(nick) => OnlinePlayer {
                    nick: nick.trim_end().to_string(),
                    is_gm: true,
                },
                None => OnlinePlayer {
                    nick: line.to_string(),
                    is_gm: false,
                },
            })
            .filter(|player| !player.nick.is_empty())
            .collect();
        Self { players }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether `nick` is in the list.
    pub fn contains(&self, nick: &str) -> bool {
        self.players.iter().any(|p| p.nick == nick)
    }

    /// Splits the list by relation.
    pub fn group_by_relation(&self, relations: &dyn RelationStore) -> GroupedOnline {
        let mut grouped = GroupedOnline::default();
        for player in &self.players {
            let nick = player.nick.clone();
            match relations.relation(&player.nick) {
                Relation::Friend => grouped.friends.push(nick),
                Relation::Neutral | Relation::Blacklisted => grouped.neutral.push(nick),
                Relation::Disregarded | Relation::Ignored => grouped.disregarded.push(nick),
                Relation::Enemy => grouped.enemies.push(nick),
                Relation::Erased => {}
            }
        }
        for group in [
            &mut grouped.friends,
            &mut grouped.neutral,
            &mut grouped.disregarded,
            &mut grouped.enemies,
        ] {
            group.sort_by_key(|nick| nick.to_lowercase());
        }
        grouped
    }
}

fn is_header(line: &str) -> bool {
    line.eq_ignore_ascii_case("online players:") || line.eq_ignore_ascii_case("online users:")
}

fn is_footer(line: &str) -> bool {
    line.ends_with("users are online.") || line.ends_with("user is online.")
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where the list text comes from.
///
/// Any `Fn() -> impl Future<Output = Result<String, ManalinkError>>` closure
/// is a source, which covers HTTP clients the host already has.
pub trait OnlineListSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<String, ManalinkError>> + Send;
}

impl<F, Fut> OnlineListSource for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ManalinkError>> + Send,
{
    fn fetch(&self) -> impl Future<Output = Result<String, ManalinkError>> + Send {
        self()
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// State of the most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FetchStatus {
    Idle = 0,
    Fetching = 1,
    Complete = 2,
    Error = 3,
}

impl FetchStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Fetching,
            2 => Self::Complete,
            3 => Self::Error,
            _ => Self::Idle,
        }
    }
}

/// What the worker task and its handle share.
#[derive(Debug)]
struct Shared {
    status: AtomicU8,
    updated: AtomicBool,
    latest: Mutex<Option<OnlineList>>,
}

impl Shared {
    fn set_status(&self, status: FetchStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn publish(&self, list: OnlineList) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(list);
        self.set_status(FetchStatus::Complete);
        self.updated.store(true, Ordering::Release);
    }
}

enum Command {
    Refresh,
    Shutdown,
}

/// Handle to the background fetch task.
///
/// Dropping the handle closes the command channel; the task stops once its
/// current fetch is over.
#[derive(Debug)]
pub struct OnlineListWorker {
    shared: Arc<Shared>,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl OnlineListWorker {
    /// Starts fetching from `source` immediately and then every
    /// `refresh_secs`.
    pub fn spawn<S: OnlineListSource>(source: S, config: OnlineListConfig) -> Self {
        let config = config.validated();
        let shared = Arc::new(Shared {
            status: AtomicU8::new(FetchStatus::Idle as u8),
            updated: AtomicBool::new(false),
            latest: Mutex::new(None),
        });
        let (commands, receiver) = mpsc::channel(4);
        let task = tokio::spawn(run_worker(source, config, Arc::clone(&shared), receiver));
        Self {
            shared,
            commands,
            task,
        }
    }

    /// Returns the list fetched since the last call, if any.
    pub fn poll(&self) -> Option<OnlineList> {
        if !self.shared.updated.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent list, whether or not it was polled already.
    pub fn latest(&self) -> Option<OnlineList> {
        self.shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> FetchStatus {
        FetchStatus::from_u8(self.shared.status.load(Ordering::Acquire))
    }

    /// Asks for a fetch now instead of waiting for the next refresh.
    /// Ignored if one is already queued.
    pub fn refresh(&self) {
        if self.commands.try_send(Command::Refresh).is_err() {
            tracing::trace!("online list refresh already pending");
        }
    }

    /// Stops the task and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::debug!(error = %e, "online list worker ended abnormally");
        }
    }
}

async fn run_worker<S: OnlineListSource>(
    source: S,
    config: OnlineListConfig,
    shared: Arc<Shared>,
    mut commands: mpsc::Receiver<Command>,
) {
    tracing::debug!(refresh_secs = config.refresh_secs, "online list worker started");
    loop {
        shared.set_status(FetchStatus::Fetching);
        match tokio::time::timeout(config.fetch_timeout(), source.fetch()).await {
            Ok(Ok(text)) => {
                let list = OnlineList::parse(&text);
                tracing::debug!(players = list.len(), "online list updated");
                shared.publish(list);
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "online list fetch failed");
                shared.set_status(FetchStatus::Error);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = config.fetch_timeout_secs,
                    "online list fetch timed out"
                );
                shared.set_status(FetchStatus::Error);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(config.refresh_interval()) => {}
            cmd = commands.recv() => match cmd {
                Some(Command::Refresh) => {}
                Some(Command::Shutdown) | None => break,
            },
        }
    }
    tracing::debug!("online list worker stopped");
}
