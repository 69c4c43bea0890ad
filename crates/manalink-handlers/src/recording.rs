//! A sink that remembers every event, for tests and logging hosts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::{AccountStats, AdminSink, ChatMsgType, ChatRoom, ChatSink, Speaker, TileChange};

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    ChatLog {
        line: String,
        kind: ChatMsgType,
        channel: String,
    },
    LocalChatLog {
        line: String,
        kind: ChatMsgType,
    },
    ChannelChatLog {
        channel: String,
        line: String,
        kind: ChatMsgType,
    },
    Whisper {
        nick: String,
        text: String,
        kind: ChatMsgType,
    },
    GlobalMessage {
        text: String,
    },
    ChannelTab {
        channel: String,
    },
    Speech {
        #[serde(flatten)]
        speaker: Speaker,
        text: String,
    },
    WhisperDelivered {
        nick: String,
    },
    ChatRoomDisplayed {
        room: ChatRoom,
    },
    KickResult {
        account_id: i32,
        succeeded: bool,
    },
    LoginOf {
        account_id: i32,
        login: String,
    },
    TileTypeChanged {
        change: TileChange,
    },
    AccountStats {
        stats: AccountStats,
    },
}

/// Records every call in order.
///
/// `chat_log` answers `true` unless [`suppress_chat_log`](Self::suppress_chat_log)
/// was switched on, which lets tests exercise the "line suppressed" path.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChatEvent>>,
    suppress: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChatEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: ChatEvent) {
        self.lock().push(event);
    }

    /// Makes `chat_log` report every line as suppressed.
    pub fn suppress_chat_log(&self, suppress: bool) {
        self.suppress.store(suppress, Ordering::Relaxed);
    }

    /// A copy of everything recorded so far.
    pub fn events(&self) -> Vec<ChatEvent> {
        self.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<ChatEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drains the recorded events as JSON, one object per line.
    pub fn drain_json_lines(&self) -> Result<Vec<String>, serde_json::Error> {
        self.take().iter().map(serde_json::to_string).collect()
    }
}

impl ChatSink for RecordingSink {
    fn chat_log(&self, line: &str, kind: ChatMsgType, channel: &str) -> bool {
        self.record(ChatEvent::ChatLog {
            line: line.to_string(),
            kind,
            channel: channel.to_string(),
        });
        !self.suppress.load(Ordering::Relaxed)
    }

    fn local_chat_log(&self, line: &str, kind: ChatMsgType) {
        self.record(ChatEvent::LocalChatLog {
            line: line.to_string(),
            kind,
        });
    }

    fn channel_chat_log(&self, channel: &str, line: &str, kind: ChatMsgType) {
        self.record(ChatEvent::ChannelChatLog {
            channel: channel.to_string(),
            line: line.to_string(),
            kind,
        });
    }

    fn add_whisper(&self, nick: &str, text: &str, kind: ChatMsgType) {
        self.record(ChatEvent::Whisper {
            nick: nick.to_string(),
            text: text.to_string(),
            kind,
        });
    }

    fn add_global_message(&self, text: &str) {
        self.record(ChatEvent::GlobalMessage {
            text: text.to_string(),
        });
    }

    fn add_channel_tab(&self, channel: &str) {
        self.record(ChatEvent::ChannelTab {
            channel: channel.to_string(),
        });
    }

    fn set_speech(&self, speaker: Speaker, text: &str) {
        self.record(ChatEvent::Speech {
            speaker,
            text: text.to_string(),
        });
    }

    fn whisper_delivered(&self, nick: &str) {
        self.record(ChatEvent::WhisperDelivered {
            nick: nick.to_string(),
        });
    }

    fn chat_room_displayed(&self, room: &ChatRoom) {
        self.record(ChatEvent::ChatRoomDisplayed { room: room.clone() });
    }
}

impl AdminSink for RecordingSink {
    fn kick_result(&self, account_id: i32, succeeded: bool) {
        self.record(ChatEvent::KickResult {
            account_id,
            succeeded,
        });
    }

    fn login_of(&self, account_id: i32, login: &str) {
        self.record(ChatEvent::LoginOf {
            account_id,
            login: login.to_string(),
        });
    }

    fn tile_type_changed(&self, change: &TileChange) {
        self.record(ChatEvent::TileTypeChanged {
            change: change.clone(),
        });
    }

    fn account_stats(&self, stats: &AccountStats) {
        self.record(ChatEvent::AccountStats {
            stats: stats.clone(),
        });
    }
}
