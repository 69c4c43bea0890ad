//! The chat handler: player, whisper, GM, channel and chat room messages.
//!
//! One [`ChatHandler`] serves one connection. The dispatcher calls it for
//! incoming messages; user code holds an `Arc` to the same instance to send
//! requests. The only state it keeps across messages is the
//! [`WhisperQueue`] correlating whisper responses with their recipients.

mod incoming;
mod outgoing;
pub mod text;
mod whisper;

use manalink_protocol::opcodes::smsg;
use manalink_protocol::{MessageHandler, MessageIn, ServerType};

use crate::HandlerContext;

pub use outgoing::MAX_PET_TALK;
pub use whisper::WhisperQueue;

/// Opcodes decoded on every server family.
const COMMON_MESSAGES: &[u16] = &[
    smsg::BEING_CHAT,
    smsg::PLAYER_CHAT,
    smsg::WHISPER,
    smsg::GM_CHAT,
    smsg::GM_CHAT2,
    smsg::MVP_EFFECT,
    smsg::MVP_ITEM,
    smsg::MVP_EXP,
    smsg::MVP_NO_ITEM,
    smsg::IGNORE_ALL_RESPONSE,
    smsg::COLOR_MESSAGE,
    smsg::CHAT_IGNORE_LIST,
    smsg::FORMAT_MESSAGE,
    smsg::FORMAT_MESSAGE_NUMBER,
    smsg::FORMAT_MESSAGE_SKILL,
    smsg::CHAT_DISPLAY,
    smsg::CHAT_JOIN_ACK,
    smsg::CHAT_LEAVE,
    smsg::CHAT_JOIN_CHANNEL,
    smsg::IGNORE_NICK_ACK,
    smsg::CHAT_CREATE_ACK,
    smsg::CHAT_DESTROY,
    smsg::CHAT_JOIN_FAILED,
    smsg::CHAT_ADD_MEMBER,
    smsg::CHAT_SETTINGS,
    smsg::CHAT_ROLE_CHANGE,
    smsg::MANNER_MESSAGE,
    smsg::CHAT_SILENCE,
    smsg::CHAT_TALKIE_BOX,
    // The eAthena length table has no entry for these two, so a live
    // connection never frames them. They stay registered for hosts that
    // dispatch frames themselves.
    smsg::BATTLE_CHAT_MESSAGE,
    smsg::SCRIPT_MESSAGE,
];

/// Decodes chat messages and sends chat requests.
#[derive(Debug)]
pub struct ChatHandler {
    ctx: HandlerContext,
    whispers: WhisperQueue,
    messages: Vec<u16>,
}

impl ChatHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        let mut messages = COMMON_MESSAGES.to_vec();
        messages.push(Self::whisper_response_opcode(ctx.session.server_type()));
        Self {
            ctx,
            whispers: WhisperQueue::new(),
            messages,
        }
    }

    /// The whisper response opcode differs between server families.
    pub fn whisper_response_opcode(server: ServerType) -> u16 {
        match server {
            ServerType::EAthena => smsg::WHISPER_RESPONSE,
            ServerType::TmwAthena => smsg::TMWA_WHISPER_RESPONSE,
        }
    }

    /// Recipients of whispers still waiting for a response, oldest first.
    pub fn pending_whispers(&self) -> Vec<String> {
        self.whispers.snapshot()
    }

    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }
}

impl MessageHandler for ChatHandler {
    fn handled_messages(&self) -> &[u16] {
        &self.messages
    }

    fn handle_message(&self, msg: &mut MessageIn<'_>) {
        match msg.id() {
            smsg::WHISPER_RESPONSE | smsg::TMWA_WHISPER_RESPONSE => {
                self.process_whisper_response(msg)
            }
            smsg::WHISPER => self.process_whisper(msg),
            smsg::BEING_CHAT => self.process_being_chat(msg),
            smsg::PLAYER_CHAT => self.process_chat(msg),
            smsg::FORMAT_MESSAGE => self.process_format_message(msg),
            smsg::FORMAT_MESSAGE_NUMBER => self.process_format_message_number(msg),
            smsg::FORMAT_MESSAGE_SKILL => self.process_format_message_skill(msg),
            smsg::COLOR_MESSAGE => self.process_color_chat(msg),
            smsg::GM_CHAT => self.process_gm_chat(msg),
            smsg::GM_CHAT2 => self.process_gm_chat2(msg),
            smsg::MVP_EFFECT => self.process_mvp_effect(msg),
            smsg::MVP_ITEM => self.process_mvp_item(msg),
            smsg::MVP_EXP => self.process_mvp_exp(msg),
            smsg::MVP_NO_ITEM => self.process_mvp_no_item(msg),
            smsg::IGNORE_ALL_RESPONSE => self.process_ignore_all_response(msg),
            smsg::CHAT_IGNORE_LIST => self.process_chat_ignore_list(msg),
            smsg::CHAT_DISPLAY => self.process_chat_display(msg),
            smsg::CHAT_JOIN_ACK => self.process_chat_join_ack(msg),
            smsg::CHAT_LEAVE => self.process_chat_leave(msg),
            smsg::CHAT_JOIN_CHANNEL => self.process_join_channel(msg),
            smsg::IGNORE_NICK_ACK => self.process_ignore_nick_ack(msg),
            smsg::CHAT_CREATE_ACK => self.process_chat_create_ack(msg),
            smsg::CHAT_DESTROY => self.process_chat_destroy(msg),
            smsg::CHAT_JOIN_FAILED => self.process_chat_join_failed(msg),
            smsg::CHAT_ADD_MEMBER => self.process_chat_add_member(msg),
            smsg::CHAT_SETTINGS => self.process_chat_settings(msg),
            smsg::CHAT_ROLE_CHANGE => self.process_chat_role_change(msg),
            smsg::MANNER_MESSAGE => self.process_manner_message(msg),
            smsg::CHAT_SILENCE => self.process_chat_silence(msg),
            smsg::CHAT_TALKIE_BOX => self.process_chat_talkie_box(msg),
            smsg::BATTLE_CHAT_MESSAGE => self.process_battle_chat_message(msg),
            smsg::SCRIPT_MESSAGE => self.process_script_message(msg),
            opcode => tracing::debug!(opcode, "chat handler got a foreign opcode"),
        }
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}
