//! Opcode constants.
//!
//! `smsg` holds server → client messages, `cmsg` client → server requests.
//! Numbering follows the eAthena family; where tmwAthena uses a different
//! number for the same message the constant carries a `TMWA_` prefix.

/// Server → client opcodes.
pub mod smsg {
    pub const CONNECTION_PROBLEM: u16 = 0x0081;

    // Chat
    pub const BEING_CHAT: u16 = 0x008d;
    pub const PLAYER_CHAT: u16 = 0x008e;
    pub const WHISPER: u16 = 0x0097;
    pub const WHISPER_RESPONSE: u16 = 0x09df;
    pub const TMWA_WHISPER_RESPONSE: u16 = 0x0098;
    pub const GM_CHAT: u16 = 0x009a;
    pub const GM_CHAT2: u16 = 0x01c3;
    pub const MVP_EFFECT: u16 = 0x010c;
    pub const MVP_ITEM: u16 = 0x010a;
    pub const MVP_EXP: u16 = 0x010b;
    pub const MVP_NO_ITEM: u16 = 0x010d;
    pub const IGNORE_ALL_RESPONSE: u16 = 0x00d2;
    pub const COLOR_MESSAGE: u16 = 0x02c1;
    pub const CHAT_IGNORE_LIST: u16 = 0x00d4;
    pub const FORMAT_MESSAGE: u16 = 0x0291;
    pub const FORMAT_MESSAGE_NUMBER: u16 = 0x07e2;
    pub const FORMAT_MESSAGE_SKILL: u16 = 0x07e6;
    pub const CHAT_DISPLAY: u16 = 0x00d7;
    pub const CHAT_JOIN_ACK: u16 = 0x00db;
    pub const CHAT_LEAVE: u16 = 0x00dd;
    pub const CHAT_JOIN_CHANNEL: u16 = 0x0b08;
    pub const IGNORE_NICK_ACK: u16 = 0x00d1;
    pub const CHAT_CREATE_ACK: u16 = 0x00d6;
    pub const CHAT_DESTROY: u16 = 0x00d8;
    pub const CHAT_JOIN_FAILED: u16 = 0x00da;
    pub const CHAT_ADD_MEMBER: u16 = 0x00dc;
    pub const CHAT_SETTINGS: u16 = 0x00df;
    pub const CHAT_ROLE_CHANGE: u16 = 0x00e1;
    pub const MANNER_MESSAGE: u16 = 0x014a;
    pub const CHAT_SILENCE: u16 = 0x014b;
    pub const CHAT_TALKIE_BOX: u16 = 0x0191;
    pub const BATTLE_CHAT_MESSAGE: u16 = 0x02dc;
    pub const SCRIPT_MESSAGE: u16 = 0x08b3;

    // Admin
    pub const ADMIN_KICK_ACK: u16 = 0x00cd;
    pub const ADMIN_GET_LOGIN_ACK: u16 = 0x01e0;
    pub const ADMIN_SET_TILE_TYPE: u16 = 0x0192;
    pub const ADMIN_ACCOUNT_STATS: u16 = 0x0214;
}

/// Client → server opcodes.
pub mod cmsg {
    // Chat
    pub const CHAT_MESSAGE: u16 = 0x008c;
    pub const CHAT_WHISPER: u16 = 0x0096;
    pub const WHO_REQUEST: u16 = 0x00c1;
    pub const IGNORE_NICK: u16 = 0x00cf;
    pub const IGNORE_ALL: u16 = 0x00d0;
    pub const REQUEST_IGNORE_LIST: u16 = 0x00d3;
    pub const CREATE_CHAT_ROOM: u16 = 0x00d5;
    pub const CHAT_JOIN: u16 = 0x00d9;
    pub const SET_CHAT_ROOM_OPTIONS: u16 = 0x00de;
    pub const SET_CHAT_ROOM_OWNER: u16 = 0x00e0;
    pub const KICK_FROM_CHAT_ROOM: u16 = 0x00e2;
    pub const LEAVE_CHAT_ROOM: u16 = 0x00e3;
    pub const BATTLE_CHAT_MESSAGE: u16 = 0x02db;
    pub const CHAT_JOIN_CHANNEL: u16 = 0x0b07;
    pub const CHAT_PART_CHANNEL: u16 = 0x0b09;
    pub const PET_TALK: u16 = 0x0b0c;

    // Admin
    pub const ADMIN_ANNOUNCE: u16 = 0x0099;
    pub const ADMIN_KICK: u16 = 0x00cc;
    pub const ADMIN_KICK_ALL: u16 = 0x00ce;
    pub const ADMIN_MUTE: u16 = 0x0149;
    pub const ADMIN_RESET_PLAYER: u16 = 0x0197;
    pub const ADMIN_SET_TILE_TYPE: u16 = 0x0198;
    pub const ADMIN_LOCAL_ANNOUNCE: u16 = 0x019c;
    pub const ADMIN_HIDE: u16 = 0x019d;
    pub const ADMIN_GOTO: u16 = 0x01bb;
    pub const ADMIN_RECALL: u16 = 0x01bd;
    pub const ADMIN_ID_TO_LOGIN: u16 = 0x01df;
    pub const ADMIN_MUTE_NAME: u16 = 0x0212;
}
