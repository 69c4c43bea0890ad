//! Player relations: the user's classification of other players.
//!
//! Each relation grants a set of [`Permissions`] that gate what another
//! player's actions may do on this client (show their chat in the log,
//! float it above their head, deliver their whispers, ...).
//!
//! | relation    | permissions                                    |
//! |-------------|------------------------------------------------|
//! | Neutral     | the configured defaults                        |
//! | Friend      | EMOTE, SPEECH_FLOAT, SPEECH_LOG, WHISPER, TRADE, plus defaults |
//! | Disregarded | EMOTE, SPEECH_FLOAT                            |
//! | Ignored     | none                                           |
//! | Erased      | INVISIBLE                                      |
//! | Blacklisted | SPEECH_LOG, WHISPER                            |
//! | Enemy       | EMOTE, SPEECH_FLOAT, SPEECH_LOG, WHISPER, TRADE |
//!
//! Friends are widened by the defaults; every other explicit relation is
//! narrowed by them, so turning a default off also turns it off for
//! disregarded, blacklisted and enemy players.

use std::collections::HashMap;
use std::sync::RwLock;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{NICK_LEN, SessionError};

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

bitflags! {
    /// A set of permission bits.
    ///
    /// Serialized as flag names (`"SPEECH_LOG | WHISPER"`) in text formats.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Permissions: u8 {
        const EMOTE = 1;
        const SPEECH_FLOAT = 1 << 1;
        const SPEECH_LOG = 1 << 2;
        const WHISPER = 1 << 3;
        const TRADE = 1 << 4;
        const INVISIBLE = 1 << 5;
    }
}

impl Permissions {
    pub const NONE: Self = Self::empty();

    /// What an unclassified player gets out of the box.
    pub const DEFAULT: Self = Self::EMOTE
        .union(Self::SPEECH_FLOAT)
        .union(Self::SPEECH_LOG)
        .union(Self::WHISPER)
        .union(Self::TRADE);
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// How the user classified another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    #[default]
    Neutral,
    Friend,
    Disregarded,
    Ignored,
    Erased,
    Blacklisted,
    Enemy,
}

impl Relation {
    pub const ALL: [Relation; 7] = [
        Relation::Neutral,
        Relation::Friend,
        Relation::Disregarded,
        Relation::Ignored,
        Relation::Erased,
        Relation::Blacklisted,
        Relation::Enemy,
    ];

    /// Permissions this relation grants before defaults are applied.
    pub fn base_permissions(self) -> Permissions {
        match self {
            Relation::Neutral | Relation::Friend | Relation::Enemy => Permissions::DEFAULT,
            Relation::Disregarded => Permissions::EMOTE | Permissions::SPEECH_FLOAT,
            Relation::Ignored => Permissions::NONE,
            Relation::Erased => Permissions::INVISIBLE,
            Relation::Blacklisted => Permissions::SPEECH_LOG | Permissions::WHISPER,
        }
    }

    /// Permissions after combining with the configured defaults.
    pub fn effective_permissions(self, defaults: Permissions) -> Permissions {
        match self {
            Relation::Neutral => defaults,
            Relation::Friend => self.base_permissions() | defaults,
            _ => self.base_permissions() & defaults,
        }
    }
}

// ---------------------------------------------------------------------------
// RelationStore
// ---------------------------------------------------------------------------

/// Read side of the relation table, as handlers see it.
pub trait RelationStore: Send + Sync {
    /// The relation set for `nick`, `Neutral` if none.
    fn relation(&self, nick: &str) -> Relation;

    /// `true` iff every flag in `flags` is granted to `nick`.
    fn has_permission(&self, nick: &str, flags: Permissions) -> bool;
}

// ---------------------------------------------------------------------------
// PlayerRelations
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Inner {
    relations: HashMap<String, Relation>,
    defaults: Permissions,
}

/// The process-wide relation table.
///
/// Shared behind an `Arc`; user commands mutate it while the client loop
/// reads it on every decode. The lock is held only for the lookup, so an
/// update is visible to the very next message.
#[derive(Debug)]
pub struct PlayerRelations {
    inner: RwLock<Inner>,
}

impl Default for PlayerRelations {
    fn default() -> Self {
        Self::new(Permissions::DEFAULT)
    }
}

impl PlayerRelations {
    /// Creates an empty table with the given default permissions.
    pub fn new(defaults: Permissions) -> Self {
        Self {
            inner: RwLock::new(Inner {
                relations: HashMap::new(),
                defaults,
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Classifies `nick`. Setting `Neutral` removes the entry.
    ///
    /// Returns the previous explicit relation, if any.
    ///
    /// # Errors
    /// [`SessionError::EmptyNick`] or [`SessionError::NickTooLong`] for
    /// names that can never appear on the wire.
    pub fn set_relation(
        &self,
        nick: &str,
        relation: Relation,
    ) -> Result<Option<Relation>, SessionError> {
        if nick.is_empty() {
            return Err(SessionError::EmptyNick);
        }
        if nick.len() > NICK_LEN {
            return Err(SessionError::NickTooLong(nick.to_string()));
        }
        let mut inner = self.write();
        let previous = if relation == Relation::Neutral {
            inner.relations.remove(nick)
        } else {
            inner.relations.insert(nick.to_string(), relation)
        };
        tracing::info!(%nick, ?relation, "player relation set");
        Ok(previous)
    }

    /// Forgets `nick`, making it neutral again.
    pub fn remove(&self, nick: &str) -> Option<Relation> {
        self.write().relations.remove(nick)
    }

    /// Effective permissions for `nick`.
    pub fn permissions_for(&self, nick: &str) -> Permissions {
        let inner = self.read();
        let relation = inner.relations.get(nick).copied().unwrap_or_default();
        relation.effective_permissions(inner.defaults)
    }

    /// All nicks with the given explicit relation, sorted.
    pub fn names_with(&self, relation: Relation) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .relations
            .iter()
            .filter(|(_, r)| **r == relation)
            .map(|(nick, _)| nick.clone())
            .collect();
        names.sort();
        names
    }

    pub fn default_permissions(&self) -> Permissions {
        self.read().defaults
    }

    pub fn set_default_permissions(&self, defaults: Permissions) {
        tracing::info!(?defaults, "default permissions changed");
        self.write().defaults = defaults;
    }

    /// Number of explicit (non-neutral) relations.
    pub fn len(&self) -> usize {
        self.read().relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().relations.is_empty()
    }

    pub fn clear(&self) {
        self.write().relations.clear();
    }
}

impl RelationStore for PlayerRelations {
    fn relation(&self, nick: &str) -> Relation {
        self.read().relations.get(nick).copied().unwrap_or_default()
    }

    fn has_permission(&self, nick: &str, flags: Permissions) -> bool {
        self.permissions_for(nick).contains(flags)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Permission table
    // =====================================================================

    #[test]
    fn test_unknown_nick_is_neutral_with_defaults() {
        let rel = PlayerRelations::default();
        assert_eq!(rel.relation("stranger"), Relation::Neutral);
        assert_eq!(rel.permissions_for("stranger"), Permissions::DEFAULT);
        assert!(rel.has_permission("stranger", Permissions::SPEECH_FLOAT));
    }

    #[test]
    fn test_ignored_is_denied_everything() {
        let rel = PlayerRelations::default();
        rel.set_relation("troll", Relation::Ignored).unwrap();
        for flag in [
            Permissions::EMOTE,
            Permissions::SPEECH_FLOAT,
            Permissions::SPEECH_LOG,
            Permissions::WHISPER,
            Permissions::TRADE,
        ] {
            assert!(!rel.has_permission("troll", flag), "{flag:?}");
        }
    }

    #[test]
    fn test_friend_passes_even_with_narrow_defaults() {
        let rel = PlayerRelations::new(Permissions::NONE);
        rel.set_relation("pal", Relation::Friend).unwrap();
        assert!(rel.has_permission("pal", Permissions::SPEECH_FLOAT));
        assert!(rel.has_permission("pal", Permissions::SPEECH_LOG | Permissions::WHISPER));
        assert!(!rel.has_permission("neutral", Permissions::SPEECH_LOG));
    }

    #[test]
    fn test_disregarded_floats_but_is_not_logged() {
        let rel = PlayerRelations::default();
        rel.set_relation("meh", Relation::Disregarded).unwrap();
        assert!(rel.has_permission("meh", Permissions::SPEECH_FLOAT));
        assert!(!rel.has_permission("meh", Permissions::SPEECH_LOG));
        assert!(!rel.has_permission("meh", Permissions::WHISPER));
    }

    #[test]
    fn test_blacklisted_is_logged_but_does_not_float() {
        let rel = PlayerRelations::default();
        rel.set_relation("spammer", Relation::Blacklisted).unwrap();
        assert!(rel.has_permission("spammer", Permissions::SPEECH_LOG));
        assert!(rel.has_permission("spammer", Permissions::WHISPER));
        assert!(!rel.has_permission("spammer", Permissions::SPEECH_FLOAT));
    }

    #[test]
    fn test_enemy_is_narrowed_by_defaults() {
        let rel = PlayerRelations::new(Permissions::SPEECH_LOG);
        rel.set_relation("foe", Relation::Enemy).unwrap();
        assert!(rel.has_permission("foe", Permissions::SPEECH_LOG));
        assert!(!rel.has_permission("foe", Permissions::SPEECH_FLOAT));
    }

    #[test]
    fn test_erased_only_has_invisible_when_defaults_allow() {
        assert_eq!(
            Relation::Erased.effective_permissions(Permissions::DEFAULT),
            Permissions::NONE
        );
        assert_eq!(
            Relation::Erased.effective_permissions(Permissions::DEFAULT | Permissions::INVISIBLE),
            Permissions::INVISIBLE
        );
    }

    #[test]
    fn test_has_permission_requires_all_requested_flags() {
        let rel = PlayerRelations::default();
        rel.set_relation("meh", Relation::Disregarded).unwrap();
        assert!(rel.has_permission("meh", Permissions::EMOTE | Permissions::SPEECH_FLOAT));
        assert!(!rel.has_permission("meh", Permissions::EMOTE | Permissions::WHISPER));
    }

    // =====================================================================
    // Table maintenance
    // =====================================================================

    #[test]
    fn test_update_is_visible_immediately() {
        let rel = PlayerRelations::default();
        assert!(rel.has_permission("bob", Permissions::SPEECH_FLOAT));
        rel.set_relation("bob", Relation::Ignored).unwrap();
        assert!(!rel.has_permission("bob", Permissions::SPEECH_FLOAT));
        rel.remove("bob");
        assert!(rel.has_permission("bob", Permissions::SPEECH_FLOAT));
    }

    #[test]
    fn test_set_neutral_removes_entry_and_returns_previous() {
        let rel = PlayerRelations::default();
        assert_eq!(rel.set_relation("bob", Relation::Enemy).unwrap(), None);
        assert_eq!(
            rel.set_relation("bob", Relation::Neutral).unwrap(),
            Some(Relation::Enemy)
        );
        assert!(rel.is_empty());
    }

    #[test]
    fn test_set_relation_rejects_unusable_nicks() {
        let rel = PlayerRelations::default();
        assert!(matches!(
            rel.set_relation("", Relation::Friend),
            Err(SessionError::EmptyNick)
        ));
        assert!(matches!(
            rel.set_relation(&"x".repeat(25), Relation::Friend),
            Err(SessionError::NickTooLong(_))
        ));
    }

    #[test]
    fn test_names_with_is_sorted() {
        let rel = PlayerRelations::default();
        rel.set_relation("zed", Relation::Friend).unwrap();
        rel.set_relation("amy", Relation::Friend).unwrap();
        rel.set_relation("bob", Relation::Enemy).unwrap();
        assert_eq!(rel.names_with(Relation::Friend), vec!["amy", "zed"]);
        assert_eq!(rel.len(), 3);
    }

    #[test]
    fn test_permissions_serde_uses_flag_names() {
        let perms = Permissions::SPEECH_LOG | Permissions::WHISPER;
        let json = serde_json::to_string(&perms).unwrap();
        assert_eq!(json, "\"SPEECH_LOG | WHISPER\"");
        let back: Permissions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, perms);
    }

    #[test]
    fn test_permissions_from_bits_truncate_drops_unknown_bits() {
        assert_eq!(Permissions::from_bits_truncate(0xff), Permissions::all());
        assert_eq!(Permissions::all().bits(), 0x3f);
        assert!(Permissions::NONE.is_empty());
        assert!(Permissions::DEFAULT.contains(Permissions::SPEECH_LOG | Permissions::TRADE));
        assert!(!Permissions::DEFAULT.contains(Permissions::INVISIBLE));
    }

    #[test]
    fn test_relation_serde_lowercase() {
        let json = serde_json::to_string(&Relation::Blacklisted).unwrap();
        assert_eq!(json, "\"blacklisted\"");
    }
}
