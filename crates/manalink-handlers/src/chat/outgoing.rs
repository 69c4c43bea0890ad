//! Client → server chat requests.
//!
//! Every request is queued on the connection's outbox and fails only when
//! the message cannot be built or the connection has stopped.

use manalink_protocol::opcodes::cmsg;
use manalink_protocol::{MessageOut, ProtocolError};
use manalink_session::NICK_LEN;

use super::ChatHandler;
use super::text::{self, CHANNEL_JOIN_MARKER, RawField, SENDER_SEPARATOR};

/// Longest pet speech the server accepts, in bytes.
pub const MAX_PET_TALK: usize = 500;

const PASSWORD_LEN: usize = 8;
const ROOM_TITLE_LEN: usize = 36;

impl ChatHandler {
    /// Says `text` in public as the local player.
    ///
    /// The line goes out as `<nick> : <text>` with a trailing NUL, which
    /// the server needs to recognise `@` commands. Does nothing while no
    /// local player is set.
    pub fn talk(&self, text: &str) -> Result<(), ProtocolError> {
        self.say(cmsg::CHAT_MESSAGE, text)
    }

    /// Sends `line` as a public chat message exactly as given.
    pub fn talk_raw(&self, line: &str) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::variable(cmsg::CHAT_MESSAGE);
        msg.write_string(line, line.len(), "message");
        msg.send(&self.ctx.outbox)
    }

    /// Says `text` in the battleground chat.
    pub fn battle_talk(&self, text: &str) -> Result<(), ProtocolError> {
        self.say(cmsg::BATTLE_CHAT_MESSAGE, text)
    }

    fn say(&self, opcode: u16, text: &str) -> Result<(), ProtocolError> {
        let nick = self.ctx.session.local_nick();
        if nick.is_empty() {
            tracing::debug!(opcode, "no local player, chat not sent");
            return Ok(());
        }
        let line = format!("{nick}{SENDER_SEPARATOR}{text}");
        let mut msg = MessageOut::variable(opcode);
        msg.write_string(&line, line.len() + 1, "message");
        msg.send(&self.ctx.outbox)
    }

    /// Whispers `text` to `recipient`.
    ///
    /// The recipient is queued so that the server's response can be
    /// matched to it.
    pub fn whisper(&self, recipient: &str, text: &str) -> Result<(), ProtocolError> {
        self.private_message(recipient, text.as_bytes())
    }

    /// Sends `text` to a `#channel`. Channels are addressed like players.
    pub fn channel_message(&self, channel: &str, text: &str) -> Result<(), ProtocolError> {
        self.private_message(channel, text.as_bytes())
    }

    fn private_message(&self, recipient: &str, text: &[u8]) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::variable(cmsg::CHAT_WHISPER);
        msg.write_string(recipient, NICK_LEN, "recipient nick");
        msg.write_bytes(text, "message");
        msg.write_u8(0, "null char");
        msg.send(&self.ctx.outbox)?;
        // The server only ever sees the first NICK_LEN bytes.
        self.whispers.push(&wire_nick(recipient));
        Ok(())
    }

    /// Asks for the number of players online.
    pub fn who(&self) -> Result<(), ProtocolError> {
        MessageOut::new(cmsg::WHO_REQUEST).send(&self.ctx.outbox)
    }

    // -----------------------------------------------------------------------
    // Ignore lists
    // -----------------------------------------------------------------------

    pub fn ignore(&self, nick: &str) -> Result<(), ProtocolError> {
        self.ignore_nick(nick, 0)
    }

    pub fn unignore(&self, nick: &str) -> Result<(), ProtocolError> {
        self.ignore_nick(nick, 1)
    }

    fn ignore_nick(&self, nick: &str, flag: u8) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::IGNORE_NICK);
        msg.write_string(nick, NICK_LEN, "nick");
        msg.write_u8(flag, "flag");
        msg.send(&self.ctx.outbox)
    }

    pub fn ignore_all(&self) -> Result<(), ProtocolError> {
        self.ignore_all_flag(0)
    }

    pub fn unignore_all(&self) -> Result<(), ProtocolError> {
        self.ignore_all_flag(1)
    }

    fn ignore_all_flag(&self, flag: u8) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::IGNORE_ALL);
        msg.write_u8(flag, "flag");
        msg.send(&self.ctx.outbox)
    }

    pub fn request_ignore_list(&self) -> Result<(), ProtocolError> {
        MessageOut::new(cmsg::REQUEST_IGNORE_LIST).send(&self.ctx.outbox)
    }

    // -----------------------------------------------------------------------
    // Chat rooms
    // -----------------------------------------------------------------------

    /// Opens a chat room above the local player.
    ///
    /// The title field is 36 bytes; longer titles are cut.
    pub fn create_chat_room(
        &self,
        title: &str,
        password: &str,
        limit: i16,
        public: bool,
    ) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::variable(cmsg::CREATE_CHAT_ROOM);
        msg.write_i16(limit, "limit");
        msg.write_i8(i8::from(public), "public");
        msg.write_string(password, PASSWORD_LEN, "password");
        msg.write_string(title, ROOM_TITLE_LEN, "title");
        msg.send(&self.ctx.outbox)
    }

    pub fn join_chat(&self, chat_id: i32, password: &str) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::CHAT_JOIN);
        msg.write_i32(chat_id, "chat id");
        msg.write_string(password, PASSWORD_LEN, "password");
        msg.send(&self.ctx.outbox)
    }

    pub fn leave_chat_room(&self) -> Result<(), ProtocolError> {
        MessageOut::new(cmsg::LEAVE_CHAT_ROOM).send(&self.ctx.outbox)
    }

    pub fn set_chat_room_options(
        &self,
        limit: i16,
        public: bool,
        password: &str,
        title: &str,
    ) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::variable(cmsg::SET_CHAT_ROOM_OPTIONS);
        msg.write_i16(limit, "limit");
        msg.write_i8(i8::from(public), "type");
        msg.write_string(password, PASSWORD_LEN, "password");
        msg.write_string(title, title.len(), "title");
        msg.send(&self.ctx.outbox)
    }

    pub fn set_chat_room_owner(&self, nick: &str) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::SET_CHAT_ROOM_OWNER);
        msg.write_i32(0, "role (unused)");
        msg.write_string(nick, NICK_LEN, "nick");
        msg.send(&self.ctx.outbox)
    }

    pub fn kick_from_chat_room(&self, nick: &str) -> Result<(), ProtocolError> {
        let mut msg = MessageOut::new(cmsg::KICK_FROM_CHAT_ROOM);
        msg.write_string(nick, NICK_LEN, "nick");
        msg.send(&self.ctx.outbox)
    }

    // -----------------------------------------------------------------------
    // Pets and channels
    // -----------------------------------------------------------------------

    /// Makes the local player's pet say `text`, cut to [`MAX_PET_TALK`]
    /// bytes. Empty text sends nothing.
    pub fn talk_pet(&self, text: &str) -> Result<(), ProtocolError> {
        if text.is_empty() {
            return Ok(());
        }
        let mut msg = MessageOut::variable(cmsg::PET_TALK);
        msg.write_string(text, text.len().min(MAX_PET_TALK), "message");
        msg.write_u8(0, "zero byte");
        msg.send(&self.ctx.outbox)
    }

    /// Joins `channel`.
    ///
    /// Uses the native request when the server supports it. Otherwise a
    /// marker whisper to the channel asks the server's channel bot.
    pub fn join_channel(&self, channel: &str) -> Result<(), ProtocolError> {
        if self.ctx.session.join_channel_supported() {
            let mut msg = MessageOut::new(cmsg::CHAT_JOIN_CHANNEL);
            msg.write_string(channel, NICK_LEN, "channel name");
            msg.send(&self.ctx.outbox)
        } else {
            self.private_message(channel, CHANNEL_JOIN_MARKER)
        }
    }

    /// Leaves `channel`. Servers without native channels have nothing to
    /// leave, so nothing is sent.
    pub fn part_channel(&self, channel: &str) -> Result<(), ProtocolError> {
        if !self.ctx.session.join_channel_supported() {
            tracing::debug!(%channel, "server has no channel requests, part skipped");
            return Ok(());
        }
        let mut msg = MessageOut::new(cmsg::CHAT_PART_CHANNEL);
        msg.write_string(channel, NICK_LEN, "channel name");
        msg.send(&self.ctx.outbox)
    }

    // -----------------------------------------------------------------------
    // Raw packets
    // -----------------------------------------------------------------------

    /// Builds and sends a packet from `<opcode> b<n> w<n> l<n> ...`.
    ///
    /// `b`, `w` and `l` write an 8, 16 or 32-bit field. Malformed tokens
    /// are skipped; a line without a valid opcode sends nothing.
    pub fn send_raw(&self, line: &str) -> Result<(), ProtocolError> {
        let Some(cmd) = text::parse_raw_command(line) else {
            tracing::debug!(%line, "raw command without opcode ignored");
            return Ok(());
        };
        let mut msg = MessageOut::new(cmd.opcode);
        for field in cmd.fields {
            match field {
                RawField::Byte(v) => msg.write_u8(v, "raw"),
                RawField::Word(v) => msg.write_i16(v, "raw"),
                RawField::Long(v) => msg.write_i32(v, "raw"),
            }
        }
        msg.send(&self.ctx.outbox)
    }
}

/// `nick` as it reads back out of a fixed-width nick field.
fn wire_nick(nick: &str) -> String {
    let bytes = nick.as_bytes();
    String::from_utf8_lossy(&bytes[..bytes.len().min(NICK_LEN)]).into_owned()
}
