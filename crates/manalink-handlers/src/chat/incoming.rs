//! Decoding of server → client chat messages.

use manalink_protocol::MessageIn;
use manalink_protocol::opcodes::smsg;
use manalink_session::Permissions;

use super::ChatHandler;
use super::text::{self, WhisperBody};
use crate::{ChatMsgType, ChatRoom, GENERAL_CHANNEL, Speaker};

/// Bytes left for the text of a variable message once `header` bytes of
/// fixed fields are accounted for. `None` when nothing is left.
pub(crate) fn payload_len(declared: i16, header: usize) -> Option<usize> {
    let len = i32::from(declared) - header as i32;
    usize::try_from(len).ok().filter(|&n| n > 0)
}

/// Logs a message decoded only to keep the stream aligned.
fn unimplemented(msg: &MessageIn<'_>) {
    tracing::debug!(opcode = msg.id(), len = msg.len(), "unimplemented message");
}

impl ChatHandler {
    // -----------------------------------------------------------------------
    // Public chat
    // -----------------------------------------------------------------------

    pub(super) fn process_chat(&self, msg: &mut MessageIn<'_>) {
        let Some(len) = payload_len(msg.read_i16("len"), 4) else {
            return;
        };
        let line = msg.read_raw_string(len, "message");
        if msg.is_malformed() {
            return;
        }
        self.process_chat_continue(&line, ChatMsgType::ByPlayer);
    }

    /// Logs a line for the local player and floats it above their head.
    fn process_chat_continue(&self, line: &str, kind: ChatMsgType) {
        let (channel, line) = text::extract_channel(line);
        let allow = self.ctx.chat.chat_log(line, kind, &channel);
        let speech = text::strip_sender(line);
        if allow && !self.ctx.session.local_nick().is_empty() {
            self.ctx.chat.set_speech(Speaker::LocalPlayer, speech);
        }
    }

    pub(super) fn process_being_chat(&self, msg: &mut MessageIn<'_>) {
        let declared = msg.read_i16("len");
        let being_id = msg.read_i32("being id");
        let being = self.ctx.beings.find_being(being_id);
        let Some(len) = payload_len(declared, 8) else {
            return;
        };
        let line = msg.read_raw_string(len, "message");
        if msg.is_malformed() {
            return;
        }

        let split = text::split_sender(&line);
        let mut sender = split.map_or("", |(sender, _)| sender).to_string();
        let mut message = line.as_str();
        match &being {
            Some(info) if info.is_player() && sender != info.name => {
                if !info.name.is_empty() {
                    sender = info.name.clone();
                }
            }
            _ => {
                if let Some((_, rest)) = split {
                    message = rest;
                }
            }
        }
        let message = message.trim();

        let relations = &self.ctx.relations;
        let mut allow = true;
        if relations.has_permission(&sender, Permissions::SPEECH_LOG) {
            let logged = if sender.is_empty() {
                message.to_string()
            } else {
                format!("{}{}{message}", text::remove_colors(&sender), text::SENDER_SEPARATOR)
            };
            allow = self.ctx.chat.chat_log(&logged, ChatMsgType::ByOther, GENERAL_CHANNEL);
        }
        if allow && being.is_some() && relations.has_permission(&sender, Permissions::SPEECH_FLOAT) {
            self.ctx.chat.set_speech(Speaker::Being { id: being_id }, message);
        }
    }

    // -----------------------------------------------------------------------
    // Whispers
    // -----------------------------------------------------------------------

    pub(super) fn process_whisper(&self, msg: &mut MessageIn<'_>) {
        let declared = msg.read_i16("len");
        let nick = msg.read_string(24, "nick");
        msg.read_i32("admin flag");
        let Some(len) = payload_len(declared, 32) else {
            return;
        };
        let body = msg.read_string(len, "message");
        // A cut-off whisper has no trustworthy sender.
        if msg.is_malformed() {
            return;
        }
        self.process_whisper_continue(&nick, &body);
    }

    fn process_whisper_continue(&self, nick: &str, body: &str) {
        let WhisperBody::Visible(body) = text::classify_whisper(body) else {
            tracing::trace!(%nick, "marker whisper hidden");
            return;
        };
        if nick == "Server" {
            self.ctx.chat.local_chat_log(body, ChatMsgType::ByServer);
        } else if self.ctx.relations.has_permission(nick, Permissions::WHISPER) {
            self.ctx.chat.add_whisper(nick, body, ChatMsgType::ByOther);
        }
    }

    pub(super) fn process_whisper_response(&self, msg: &mut MessageIn<'_>) {
        let kind = msg.read_u8("response");
        if msg.id() == smsg::WHISPER_RESPONSE {
            msg.read_i32("unknown");
        }

        if kind == 1 {
            if let Some(head) = self.whispers.front() {
                if head.len() > 1 && head.starts_with('#') {
                    self.ctx.chat.channel_chat_log(
                        &head,
                        &format!("Message could not be sent, channel {head} is not exists."),
                        ChatMsgType::ByServer,
                    );
                    self.whispers.pop();
                    return;
                }
            }
        }

        let Some(nick) = self.whispers.pop() else {
            tracing::debug!(response = kind, "whisper response with nothing pending");
            return;
        };
        match kind {
            0 => self.ctx.chat.whisper_delivered(&nick),
            1 => self.ctx.chat.add_whisper(
                &nick,
                &format!("Whisper could not be sent, {nick} is offline."),
                ChatMsgType::ByServer,
            ),
            2 => self.ctx.chat.add_whisper(
                &nick,
                &format!("Whisper could not be sent, ignored by {nick}."),
                ChatMsgType::ByServer,
            ),
            other => tracing::debug!(response = other, %nick, "unknown whisper response"),
        }
    }

    // -----------------------------------------------------------------------
    // GM and server messages
    // -----------------------------------------------------------------------

    pub(super) fn process_gm_chat(&self, msg: &mut MessageIn<'_>) {
        let Some(len) = payload_len(msg.read_i16("len"), 4) else {
            return;
        };
        let line = msg.read_raw_string(len, "message");
        self.ctx.chat.add_global_message(text::strip_gm_color(&line));
    }

    pub(super) fn process_gm_chat2(&self, msg: &mut MessageIn<'_>) {
        let declared = msg.read_i16("len");
        msg.read_i32("font color");
        msg.read_i16("font type");
        msg.read_i16("font size");
        msg.read_i16("font align");
        msg.read_i16("font y");
        let Some(len) = payload_len(declared, 16) else {
            return;
        };
        let line = msg.read_raw_string(len, "message");
        self.ctx.chat.add_global_message(&line);
    }

    pub(super) fn process_color_chat(&self, msg: &mut MessageIn<'_>) {
        let declared = msg.read_i16("len");
        msg.read_i32("unused");
        msg.read_i32("chat color");
        let Some(len) = payload_len(declared, 12) else {
            return;
        };
        let line = msg.read_raw_string(len, "message");
        if msg.is_malformed() {
            return;
        }

        if line.starts_with("You're now in the '#") && line.ends_with('\'') {
            if let Some(channel) = text::channel_announcement(&line) {
                self.ctx.chat.add_channel_tab(&channel);
                return;
            }
        } else if let Some(head) = self.whispers.front() {
            if head.len() > 1 && head.starts_with('#') {
                let echo = text::channel_join_echo(&head, self.ctx.session.local_nick());
                if line == echo {
                    self.whispers.pop();
                }
            }
        }
        self.process_chat_continue(&line, ChatMsgType::ByUnknown);
    }

    pub(super) fn process_format_message(&self, msg: &mut MessageIn<'_>) {
        let msg_id = msg.read_i16("msg id");
        if let Some(notice) = text::mercenary_notice(msg_id) {
            self.ctx.chat.local_chat_log(notice, ChatMsgType::ByServer);
            return;
        }
        let line = text::format_message_text(msg_id);
        self.process_chat_continue(&line, ChatMsgType::ByServer);
    }

    pub(super) fn process_format_message_number(&self, msg: &mut MessageIn<'_>) {
        let msg_id = msg.read_i16("msg id");
        let value = msg.read_i32("value");
        let line = format!("Message #{msg_id}, value: {value}");
        self.process_chat_continue(&line, ChatMsgType::ByServer);
    }

    pub(super) fn process_format_message_skill(&self, msg: &mut MessageIn<'_>) {
        let skill_id = msg.read_i16("skill id");
        let msg_id = msg.read_i32("msg id");
        let line = format!("Message #{msg_id}, skill: {skill_id}");
        self.process_chat_continue(&line, ChatMsgType::ByServer);
    }

    pub(super) fn process_mvp_effect(&self, msg: &mut MessageIn<'_>) {
        let id = msg.read_i32("being id");
        if !self.ctx.session.show_mvp() {
            return;
        }
        let line = match self.ctx.beings.find_being(id) {
            Some(being) => format!("MVP player: {}", being.name),
            None => "MVP player.".to_string(),
        };
        self.ctx.chat.local_chat_log(&line, ChatMsgType::ByServer);
    }

    pub(super) fn process_ignore_all_response(&self, msg: &mut MessageIn<'_>) {
        let action = msg.read_u8("action");
        let failed = msg.read_u8("fail") != 0;
        let line = match (action, failed) {
            (0, false) => "All whispers ignored.",
            (0, true) => "All whispers ignore failed.",
            (1, false) => "All whispers unignored.",
            (1, true) => "All whispers unignore failed.",
            (action, _) => {
                tracing::debug!(action, "unknown ignore-all action");
                return;
            }
        };
        self.ctx.chat.local_chat_log(line, ChatMsgType::ByServer);
    }

    // -----------------------------------------------------------------------
    // Channels and chat rooms
    // -----------------------------------------------------------------------

    pub(super) fn process_join_channel(&self, msg: &mut MessageIn<'_>) {
        let channel = msg.read_string(24, "channel name");
        let flag = msg.read_u8("flag");
        if channel.len() < 2 {
            return;
        }
        match flag {
            1 | 2 => {
                let name = channel.get(1..).unwrap_or_default();
                self.ctx.chat.add_channel_tab(&format!("#{name}"));
            }
            _ => self.ctx.chat.channel_chat_log(
                &channel,
                &format!("Can't open channel. Channel {channel} is not exists."),
                ChatMsgType::ByServer,
            ),
        }
    }

    pub(super) fn process_chat_display(&self, msg: &mut MessageIn<'_>) {
        let declared = msg.read_i16("len");
        let room = ChatRoom {
            owner_id: msg.read_i32("owner account id"),
            chat_id: msg.read_i32("chat id"),
            max_users: msg.read_i16("max users"),
            current_users: msg.read_i16("current users"),
            kind: msg.read_u8("type"),
            title: payload_len(declared, 17)
                .map(|len| msg.read_string(len, "title"))
                .unwrap_or_default(),
        };
        if self.ctx.beings.find_being(room.owner_id).is_some() {
            self.ctx.chat.chat_room_displayed(&room);
        } else {
            tracing::trace!(owner = room.owner_id, "chat room owner not visible");
        }
    }

    // -----------------------------------------------------------------------
    // Decoded for alignment only
    // -----------------------------------------------------------------------

    pub(super) fn process_mvp_item(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i16("item id");
    }

    pub(super) fn process_mvp_exp(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i32("exp");
    }

    pub(super) fn process_mvp_no_item(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
    }

    pub(super) fn process_chat_ignore_list(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        let count = payload_len(msg.read_i16("len"), 4).unwrap_or(0) / 24;
        for _ in 0..count {
            msg.read_string(24, "nick");
        }
    }

    pub(super) fn process_chat_join_ack(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        let count = payload_len(msg.read_i16("len"), 8).unwrap_or(0) / 28;
        msg.read_i32("chat id");
        for _ in 0..count {
            msg.read_i32("role");
            msg.read_string(24, "name");
        }
    }

    pub(super) fn process_chat_leave(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i16("users");
        msg.read_string(24, "name");
        msg.read_u8("flag");
    }

    pub(super) fn process_ignore_nick_ack(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_u8("type");
        msg.read_u8("flag");
    }

    pub(super) fn process_chat_create_ack(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_u8("flag");
    }

    pub(super) fn process_chat_destroy(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i32("chat id");
    }

    pub(super) fn process_chat_join_failed(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_u8("flag");
    }

    pub(super) fn process_chat_add_member(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i16("users");
        msg.read_string(24, "name");
    }

    pub(super) fn process_chat_settings(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        let title_len = payload_len(msg.read_i16("len"), 17).unwrap_or(0);
        msg.read_i32("owner id");
        msg.read_i32("chat id");
        msg.read_i16("limit");
        msg.read_i16("users");
        msg.read_u8("type");
        msg.read_string(title_len, "title");
    }

    pub(super) fn process_chat_role_change(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i32("role");
        msg.read_string(24, "name");
    }

    pub(super) fn process_manner_message(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i32("type");
    }

    pub(super) fn process_chat_silence(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_u8("type");
        msg.read_string(24, "gm name");
    }

    pub(super) fn process_chat_talkie_box(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        msg.read_i32("being id");
        msg.read_string(80, "message");
    }

    pub(super) fn process_battle_chat_message(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        let len = payload_len(msg.read_i16("len"), 32).unwrap_or(0);
        msg.read_i32("account id");
        msg.read_string(24, "nick");
        msg.read_string(len, "message");
    }

    pub(super) fn process_script_message(&self, msg: &mut MessageIn<'_>) {
        unimplemented(msg);
        let len = payload_len(msg.read_i16("len"), 8).unwrap_or(0);
        msg.read_i32("being id");
        msg.read_string(len, "message");
    }
}
