//! GM requests and their replies.
//!
//! Requests with a dedicated opcode are built here. Name-based actions the
//! protocol has no opcode for are typed as `@` commands through the chat
//! handler, which is why this handler holds one.

use std::sync::Arc;

use manalink_protocol::opcodes::{cmsg, smsg};
use manalink_protocol::{MessageHandler, MessageIn, MessageOut, ProtocolError, ServerType};
use manalink_session::NICK_LEN;

use crate::{AccountStats, ChatHandler, HandlerContext, TileChange};

/// Decodes GM replies and sends GM requests.
#[derive(Debug)]
pub struct AdminHandler {
    ctx: HandlerContext,
    chat: Arc<ChatHandler>,
    messages: Vec<u16>,
}

impl AdminHandler {
    pub fn new(ctx: HandlerContext, chat: Arc<ChatHandler>) -> Self {
        let mut messages = vec![
            smsg::ADMIN_KICK_ACK,
            smsg::ADMIN_GET_LOGIN_ACK,
            smsg::ADMIN_SET_TILE_TYPE,
        ];
        // tmwAthena frames this opcode with a different, shorter layout.
        if ctx.session.server_type() == ServerType::EAthena {
            messages.push(smsg::ADMIN_ACCOUNT_STATS);
        }
        Self {
            ctx,
            chat,
            messages,
        }
    }

    // -----------------------------------------------------------------------
    // Requests with an opcode
    // -----------------------------------------------------------------------

    /// Broadcasts `text` to the whole server.
    pub fn announce(&self, text: &str) -> Result<(), ProtocolError> {
        self.text_request(cmsg::ADMIN_ANNOUNCE, text)
    }

    /// Broadcasts `text` to the current map.
    pub fn local_announce(&self, text: &str) -> Result<(), ProtocolError> {
        self.text_request(cmsg::ADMIN_LOCAL_ANNOUNCE, text)
    }

    fn text_request(&self, opcode: u16, text: &str) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::variable(opcode);
        msg.write_string(text, text.len(), "message");
        msg.send(&self.ctx.outbox)
    }

    pub fn hide(&self, hide: bool) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::ADMIN_HIDE);
        msg.write_i32(i32::from(hide), "hide");
        msg.send(&self.ctx.outbox)
    }

    pub fn kick(&self, account_id: i32) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::ADMIN_KICK);
        msg.write_i32(account_id, "account id");
        msg.send(&self.ctx.outbox)
    }

    pub fn kick_all(&self) -> Result<(), ProtocolError> {
        MessageOut::new(cmsg::ADMIN_KICK_ALL).send(&self.ctx.outbox)
    }

    pub fn reset_stats(&self) -> Result<(), ProtocolError> {
        self.reset_player(0)
    }

    pub fn reset_skills(&self) -> Result<(), ProtocolError> {
        self.reset_player(1)
    }

    fn reset_player(&self, kind: i16) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::ADMIN_RESET_PLAYER);
        msg.write_i16(kind, "flag");
        msg.send(&self.ctx.outbox)
    }

    /// Warps the GM to the player `name`.
    pub fn goto_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.name_request(cmsg::ADMIN_GOTO, name)
    }

    /// Summons the player `name` to the GM.
    pub fn recall_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.name_request(cmsg::ADMIN_RECALL, name)
    }

    pub fn mute_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.name_request(cmsg::ADMIN_MUTE_NAME, name)
    }

    fn name_request(&self, opcode: u16, name: &str) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(opcode);
        msg.write_string(name, NICK_LEN, "name");
        msg.send(&self.ctx.outbox)
    }

    /// Mutes a player for `limit` minutes.
    pub fn mute(&self, account_id: i32, kind: i8, limit: i16) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::ADMIN_MUTE);
        msg.write_i32(account_id, "account id");
        msg.write_i8(kind, "type");
        msg.write_i16(limit, "value");
        msg.send(&self.ctx.outbox)
    }

    /// Asks for the login name behind an account id.
    pub fn request_login(&self, account_id: i32) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::ADMIN_ID_TO_LOGIN);
        msg.write_i32(account_id, "account id");
        msg.send(&self.ctx.outbox)
    }

    pub fn set_tile_type(&self, x: i16, y: i16, kind: i16) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::ADMIN_SET_TILE_TYPE);
        msg.write_i16(x, "x");
        msg.write_i16(y, "y");
        msg.write_i16(kind, "type");
        msg.send(&self.ctx.outbox)
    }

    // -----------------------------------------------------------------------
    // @ commands
    // -----------------------------------------------------------------------

    pub fn ban_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@ban {name}"))
    }

    pub fn unban_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@unban {name}"))
    }

    pub fn kick_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@kick {name}"))
    }

    pub fn warp(&self, map: &str, x: i32, y: i32) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@warp {map} {x} {y}"))
    }

    pub fn create_items(&self, item_id: i32, amount: i32) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@item {item_id} {amount}"))
    }

    pub fn revive_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@revive {name}"))
    }

    pub fn ipcheck_name(&self, name: &str) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@ipcheck {name}"))
    }

    pub fn request_stats(&self, name: &str) -> Result<(), ProtocolError> {
        self.chat.talk(&format!("@stats {name}"))
    }

    // -----------------------------------------------------------------------
    // Replies
    // -----------------------------------------------------------------------

    fn process_kick_ack(&self, msg: &mut MessageIn<'_>) {
        let account_id = msg.read_i32("account id");
        self.ctx.admin.kick_result(account_id, account_id != 0);
    }

    fn process_get_login_ack(&self, msg: &mut MessageIn<'_>) {
        let account_id = msg.read_i32("account id");
        let login = msg.read_string(24, "login");
        self.ctx.admin.login_of(account_id, &login);
    }

    fn process_set_tile_type(&self, msg: &mut MessageIn<'_>) {
        let change = TileChange {
            x: msg.read_i16("x"),
            y: msg.read_i16("y"),
            kind: msg.read_i16("type"),
            map: msg.read_string(16, "map name"),
        };
        self.ctx.admin.tile_type_changed(&change);
    }

    fn process_account_stats(&self, msg: &mut MessageIn<'_>) {
        const NAMES: [(&str, &str); 6] = [
            ("str", "need str"),
            ("agi", "need agi"),
            ("vit", "need vit"),
            ("int", "need int"),
            ("dex", "need dex"),
            ("luk", "need luk"),
        ];
        let mut stats = AccountStats::default();
        for (i, (base, need)) in NAMES.into_iter().enumerate() {
            stats.base[i] = msg.read_u8(base);
            stats.needed[i] = msg.read_u8(need);
        }
        stats.attack_base = msg.read_i16("attack base");
        stats.attack_mod = msg.read_i16("attack mod");
        stats.matk_max = msg.read_i16("matk max");
        stats.matk_min = msg.read_i16("matk min");
        stats.def = msg.read_i16("def");
        stats.def_mod = msg.read_i16("def mod");
        stats.mdef = msg.read_i16("mdef");
        stats.mdef_mod = msg.read_i16("mdef mod");
        stats.hit = msg.read_i16("hit");
        stats.flee = msg.read_i16("flee");
        stats.flee2 = msg.read_i16("flee2");
        stats.critical = msg.read_i16("critical");
        stats.karma = msg.read_i16("karma");
        stats.manner = msg.read_i16("manner");
        self.ctx.admin.account_stats(&stats);
    }
}

impl MessageHandler for AdminHandler {
    fn handled_messages(&self) -> &[u16] {
        &self.messages
    }

    fn handle_message(&self, msg: &mut MessageIn<'_>) {
        match msg.id() {
            smsg::ADMIN_KICK_ACK => self.process_kick_ack(msg),
            smsg::ADMIN_GET_LOGIN_ACK => self.process_get_login_ack(msg),
            smsg::ADMIN_SET_TILE_TYPE => self.process_set_tile_type(msg),
            smsg::ADMIN_ACCOUNT_STATS => self.process_account_stats(msg),
            opcode => tracing::debug!(opcode, "admin handler got a foreign opcode"),
        }
    }

    fn name(&self) -> &'static str {
        "admin"
    }
}
