//! Text rules for chat lines.
//!
//! Chat content carries its structure inline: `[ #channel ] ` prefixes,
//! `sender : message` separators, colour prefixes, and invisible marker
//! characters bots use to talk to each other. Everything here is a pure
//! function over `&str` so the rules can be tested without a handler.

use std::borrow::Cow;

use crate::GENERAL_CHANNEL;

/// Separator between a sender's name and the message.
pub const SENDER_SEPARATOR: &str = " : ";

/// Payload whispered to a channel to join it when the server has no
/// native join request.
pub const CHANNEL_JOIN_MARKER: &[u8] = b"\xC2\x82\xC2";

/// Invisible character that starts a marker whisper.
const MARKER: char = '\u{82}';

/// Splits a `[ #name ] rest` line into its channel and the rest.
///
/// Lines without a complete channel prefix belong to [`GENERAL_CHANNEL`]
/// and come back unchanged.
pub fn extract_channel(line: &str) -> (String, &str) {
    if let Some(after) = line.strip_prefix("[ #") {
        if let Some(idx) = after.find(" ] ") {
            return (format!("#{}", &after[..idx]), &after[idx + 3..]);
        }
    }
    (GENERAL_CHANNEL.to_string(), line)
}

/// Splits `sender : message` at the first separator.
pub fn split_sender(line: &str) -> Option<(&str, &str)> {
    line.find(SENDER_SEPARATOR)
        .map(|pos| (&line[..pos], &line[pos + SENDER_SEPARATOR.len()..]))
}

/// Drops everything up to and including the first separator, then trims.
pub fn strip_sender(line: &str) -> &str {
    split_sender(line).map_or(line, |(_, message)| message).trim()
}

/// Removes the `##x` colour codes players put in their names.
pub fn remove_colors(text: &str) -> Cow<'_, str> {
    if !text.contains("##") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("##") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        match after.chars().next() {
            Some(code) => rest = &after[code.len_utf8()..],
            None => {
                out.push_str("##");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Strips the colour prefix servers put on GM broadcasts.
pub fn strip_gm_color(text: &str) -> &str {
    text.strip_prefix("ssss")
        .or_else(|| text.strip_prefix("eulb"))
        .unwrap_or(text)
}

/// How an incoming whisper body should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperBody<'a> {
    /// A bot-to-bot marker whisper; never shown.
    Hidden,
    /// Text to show, with any command marker removed.
    Visible(&'a str),
}

/// Classifies a whisper by its leading marker.
///
/// `\u{82}G` and `\u{82}A` hide the whisper. `\u{82}!` marks a whisper
/// command; the marker character is dropped and the `!` kept.
pub fn classify_whisper(text: &str) -> WhisperBody<'_> {
    let Some(after) = text.strip_prefix(MARKER) else {
        return WhisperBody::Visible(text);
    };
    if after.starts_with('G') || after.starts_with('A') {
        WhisperBody::Hidden
    } else if after.starts_with('!') {
        WhisperBody::Visible(after)
    } else {
        WhisperBody::Visible(text)
    }
}

/// Recognises `You're now in the '#name' channel for 'topic'` and returns
/// `#name`.
pub fn channel_announcement(text: &str) -> Option<String> {
    let inner = text.strip_prefix("You're now in the '#")?.strip_suffix('\'')?;
    let idx = inner.find("' channel for '")?;
    Some(format!("#{}", &inner[..idx]))
}

/// The line a server echoes back after a marker whisper to `channel`.
///
/// Built from the same bytes the reader would see, so it compares equal to
/// the decoded message even though the marker is not valid UTF-8 alone.
pub fn channel_join_echo(channel: &str, local_nick: &str) -> String {
    let mut bytes = format!("[ {channel} ] {local_nick}{SENDER_SEPARATOR}").into_bytes();
    bytes.extend_from_slice(CHANNEL_JOIN_MARKER);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Notices for format message ids 1266..=1269.
pub fn mercenary_notice(msg_id: i16) -> Option<&'static str> {
    match msg_id {
        1266 => Some("Mercenary soldier's duty hour is over."),
        1267 => Some("Your mercenary soldier has been killed."),
        1268 => Some("Your mercenary soldier has been fired."),
        1269 => Some("Your mercenary soldier has ran away."),
        _ => None,
    }
}

/// Text for a numbered server message.
pub fn format_message_text(msg_id: i16) -> Cow<'static, str> {
    match msg_id {
        1334 => Cow::Borrowed("Can't cast skill in this area."),
        1335 => Cow::Borrowed("Can't use item in this area."),
        1773 => Cow::Borrowed("Can't equip. Wrong level."),
        1774 => Cow::Borrowed("Can't use. Wrong level."),
        1923 => Cow::Borrowed("Work in progress."),
        id => Cow::Owned(format!("Message #{id}")),
    }
}

// ---------------------------------------------------------------------------
// Raw packet commands
// ---------------------------------------------------------------------------

/// One typed field of a raw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawField {
    Byte(u8),
    Word(i16),
    Long(i32),
}

/// A parsed `send_raw` line: `<opcode> [b<n>|w<n>|l<n>]...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub opcode: u16,
    pub fields: Vec<RawField>,
}

/// Parses a number in decimal, or hex with a `0x`, `x` or `h` prefix.
///
/// Values wrap to the width of the field they are written into.
pub fn parse_number(text: &str) -> Option<u32> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix('x'))
        .or_else(|| text.strip_prefix('h'));
    match hex {
        Some(digits) => u32::from_str_radix(digits, 16).ok(),
        None => text
            .parse::<u32>()
            .ok()
            .or_else(|| text.parse::<i32>().ok().map(|v| v as u32)),
    }
}

/// Parses a raw command line.
///
/// Returns `None` for an empty line or an unparsable opcode. Tokens
/// shorter than two characters, with an unknown type letter, or with a
/// bad number are skipped.
pub fn parse_raw_command(line: &str) -> Option<RawCommand> {
    let mut tokens = line.split(' ').filter(|t| !t.is_empty());
    let opcode = parse_number(tokens.next()?)? as u16;
    let fields = tokens
        .filter_map(|token| {
            let mut chars = token.chars();
            let kind = chars.next()?.to_ascii_lowercase();
            let value = parse_number(chars.as_str())?;
            match kind {
                'b' => Some(RawField::Byte(value as u8)),
                'w' => Some(RawField::Word(value as i16)),
                'l' => Some(RawField::Long(value as i32)),
                _ => None,
            }
        })
        .collect();
    Some(RawCommand { opcode, fields })
}
