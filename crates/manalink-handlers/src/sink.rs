//! Collaborator traits: where decoded events go and what handlers may ask.
//!
//! Handlers never draw anything. They turn messages into calls on these
//! traits, and the host (a GUI, a bot, a logger) decides what to do with
//! them. Every method takes `&self`; implementations that record state use
//! their own interior mutability, as handlers share them behind an `Arc`.

use serde::Serialize;

/// Name of the default chat channel.
pub const GENERAL_CHANNEL: &str = "";

// ---------------------------------------------------------------------------
// Shared event types
// ---------------------------------------------------------------------------

/// Who a chat line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMsgType {
    /// The local player.
    ByPlayer,
    /// Another player or being.
    ByOther,
    /// The server itself.
    ByServer,
    /// A game master.
    ByGm,
    /// Origin cannot be told from the message.
    ByUnknown,
}

/// Whose speech bubble a line goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "speaker", rename_all = "snake_case")]
pub enum Speaker {
    LocalPlayer,
    Being { id: i32 },
}

/// A chat room advertised above its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRoom {
    pub owner_id: i32,
    pub chat_id: i32,
    pub max_users: i16,
    pub current_users: i16,
    pub kind: u8,
    pub title: String,
}

/// A map tile whose walkability a GM changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileChange {
    pub x: i16,
    pub y: i16,
    pub kind: i16,
    pub map: String,
}

/// One player's stats as reported to a GM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountStats {
    /// str, agi, vit, int, dex, luk.
    pub base: [u8; 6],
    /// Points needed to raise each of `base`.
    pub needed: [u8; 6],
    pub attack_base: i16,
    pub attack_mod: i16,
    pub matk_max: i16,
    pub matk_min: i16,
    pub def: i16,
    pub def_mod: i16,
    pub mdef: i16,
    pub mdef_mod: i16,
    pub hit: i16,
    pub flee: i16,
    pub flee2: i16,
    pub critical: i16,
    pub karma: i16,
    pub manner: i16,
}

// ---------------------------------------------------------------------------
// ChatSink
// ---------------------------------------------------------------------------

/// Receives everything the chat handler decodes.
pub trait ChatSink: Send + Sync {
    /// Files a line in the chat log of `channel` ([`GENERAL_CHANNEL`] for
    /// the main tab).
    ///
    /// Returns `false` when the host suppressed the line; the handler then
    /// skips the matching speech bubble too.
    fn chat_log(&self, line: &str, kind: ChatMsgType, channel: &str) -> bool;

    /// Writes a line into the local tab only.
    fn local_chat_log(&self, line: &str, kind: ChatMsgType);

    /// Writes a line into a channel's tab.
    fn channel_chat_log(&self, channel: &str, line: &str, kind: ChatMsgType);

    /// A whisper conversation line with `nick`.
    fn add_whisper(&self, nick: &str, text: &str, kind: ChatMsgType);

    /// A server-wide announcement.
    fn add_global_message(&self, text: &str);

    /// The player is now in `channel` (name includes the leading `#`).
    fn add_channel_tab(&self, channel: &str);

    /// Shows `text` as a speech bubble.
    fn set_speech(&self, speaker: Speaker, text: &str);

    /// The server confirmed delivery of a whisper to `nick`.
    fn whisper_delivered(&self, _nick: &str) {}

    /// A chat room is now shown above its owner.
    fn chat_room_displayed(&self, _room: &ChatRoom) {}
}

// ---------------------------------------------------------------------------
// AdminSink
// ---------------------------------------------------------------------------

/// Receives GM replies. Everything defaults to a no-op.
pub trait AdminSink: Send + Sync {
    fn kick_result(&self, _account_id: i32, _succeeded: bool) {}

    fn login_of(&self, _account_id: i32, _login: &str) {}

    fn tile_type_changed(&self, _change: &TileChange) {}

    fn account_stats(&self, _stats: &AccountStats) {}
}

// ---------------------------------------------------------------------------
// BeingLookup
// ---------------------------------------------------------------------------

/// Kind of an on-screen being.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BeingKind {
    Player,
    Npc,
    Monster,
    Other,
}

/// What handlers need to know about a being.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeingInfo {
    pub name: String,
    pub kind: BeingKind,
}

impl BeingInfo {
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BeingKind::Player,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == BeingKind::Player
    }
}

/// Looks up beings currently known to the client by id.
pub trait BeingLookup: Send + Sync {
    fn find_being(&self, id: i32) -> Option<BeingInfo>;
}

/// A lookup that knows no beings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBeings;

impl BeingLookup for NoBeings {
    fn find_being(&self, _id: i32) -> Option<BeingInfo> {
        None
    }
}

/// A sink that drops everything after a trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChatSink for NullSink {
    fn chat_log(&self, line: &str, kind: ChatMsgType, channel: &str) -> bool {
        tracing::trace!(%line, ?kind, %channel, "chat line dropped");
        true
    }

    fn local_chat_log(&self, line: &str, kind: ChatMsgType) {
        tracing::trace!(%line, ?kind, "local line dropped");
    }

    fn channel_chat_log(&self, channel: &str, line: &str, kind: ChatMsgType) {
        tracing::trace!(%channel, %line, ?kind, "channel line dropped");
    }

    fn add_whisper(&self, nick: &str, text: &str, kind: ChatMsgType) {
        tracing::trace!(%nick, %text, ?kind, "whisper dropped");
    }

    fn add_global_message(&self, text: &str) {
        tracing::trace!(%text, "global message dropped");
    }

    fn add_channel_tab(&self, channel: &str) {
        tracing::trace!(%channel, "channel tab dropped");
    }

    fn set_speech(&self, speaker: Speaker, text: &str) {
        tracing::trace!(?speaker, %text, "speech dropped");
    }
}

impl AdminSink for NullSink {}
