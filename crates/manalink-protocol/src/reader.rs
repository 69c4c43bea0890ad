//! Cursor-based decoder for one incoming message.
//!
//! [`MessageIn`] has two layers:
//!
//! - `try_read_*` return `Result` and are what the rest of this module is
//!   built on.
//! - `read_*` return the value or its default (`0`, `""`). Handlers use
//!   these so a decode routine reads top to bottom without a `?` on every
//!   field.
//!
//! The first read that runs past the end of the message records a
//! [`ReadError`] and exhausts the cursor. Every later read fails too and
//! yields its default, so a corrupt field degrades the rest of that one
//! message instead of crashing the handler or the connection.
//!
//! Every read carries a field tag. Tags only feed `trace`/`debug` logs and
//! the recorded error; no decode logic depends on them.

use crate::ProtocolError;

/// Details of the first failed read on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    /// Tag of the field being read.
    pub field: &'static str,
    /// Cursor position when the read was attempted.
    pub offset: usize,
    /// Bytes the read needed.
    pub wanted: usize,
    /// Bytes that were left.
    pub remaining: usize,
}

/// An incoming message: opcode, bytes and a read cursor.
#[derive(Debug)]
pub struct MessageIn<'a> {
    data: &'a [u8],
    pos: usize,
    id: u16,
    error: Option<ReadError>,
}

impl<'a> MessageIn<'a> {
    /// Wraps one complete frame and consumes its opcode.
    ///
    /// A frame shorter than the opcode field yields id `0` and is marked
    /// malformed.
    pub fn new(data: &'a [u8]) -> Self {
        let mut msg = Self {
            data,
            pos: 0,
            id: 0,
            error: None,
        };
        msg.id = msg.read_u16("opcode");
        msg
    }

    /// The message's opcode.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Total length of the frame, opcode included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` for an empty frame.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current cursor offset from the start of the frame.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// `true` once any read has run out of bounds.
    pub fn is_malformed(&self) -> bool {
        self.error.is_some()
    }

    /// The first failed read, if any.
    pub fn error(&self) -> Option<&ReadError> {
        self.error.as_ref()
    }

    // -----------------------------------------------------------------------
    // Strict layer
    // -----------------------------------------------------------------------

    fn take(&mut self, wanted: usize, field: &'static str) -> Result<&'a [u8], ProtocolError> {
        let remaining = self.remaining();
        if wanted > remaining {
            let offset = self.pos;
            if self.error.is_none() {
                tracing::debug!(
                    opcode = self.id,
                    field,
                    offset,
                    wanted,
                    remaining,
                    "read past end of message"
                );
                self.error = Some(ReadError {
                    field,
                    offset,
                    wanted,
                    remaining,
                });
            }
            self.pos = self.data.len();
            return Err(ProtocolError::ReadOutOfBounds {
                opcode: self.id,
                field,
                offset,
                wanted,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + wanted];
        self.pos += wanted;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ProtocolError> {
        let bytes = self.take(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads one unsigned byte.
    pub fn try_read_u8(&mut self, field: &'static str) -> Result<u8, ProtocolError> {
        let [b] = self.take_array::<1>(field)?;
        tracing::trace!(opcode = self.id, field, value = b, "read u8");
        Ok(b)
    }

    /// Reads one signed byte.
    pub fn try_read_i8(&mut self, field: &'static str) -> Result<i8, ProtocolError> {
        let value = i8::from_le_bytes(self.take_array(field)?);
        tracing::trace!(opcode = self.id, field, value, "read i8");
        Ok(value)
    }

    /// Reads a little-endian `i16`.
    pub fn try_read_i16(&mut self, field: &'static str) -> Result<i16, ProtocolError> {
        let value = i16::from_le_bytes(self.take_array(field)?);
        tracing::trace!(opcode = self.id, field, value, "read i16");
        Ok(value)
    }

    /// Reads a little-endian `u16`.
    pub fn try_read_u16(&mut self, field: &'static str) -> Result<u16, ProtocolError> {
        let value = u16::from_le_bytes(self.take_array(field)?);
        tracing::trace!(opcode = self.id, field, value, "read u16");
        Ok(value)
    }

    /// Reads a little-endian `i32`.
    pub fn try_read_i32(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        let value = i32::from_le_bytes(self.take_array(field)?);
        tracing::trace!(opcode = self.id, field, value, "read i32");
        Ok(value)
    }

    /// Reads a little-endian `u32`.
    pub fn try_read_u32(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        let value = u32::from_le_bytes(self.take_array(field)?);
        tracing::trace!(opcode = self.id, field, value, "read u32");
        Ok(value)
    }

    /// Reads a fixed `len`-byte string field, ending at the first NUL.
    ///
    /// The whole field is consumed even when the text is shorter.
    pub fn try_read_string(
        &mut self,
        len: usize,
        field: &'static str,
    ) -> Result<String, ProtocolError> {
        let bytes = self.take(len, field)?;
        let text = match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        let value = String::from_utf8_lossy(text).into_owned();
        tracing::trace!(opcode = self.id, field, value = %value, "read string");
        Ok(value)
    }

    /// Reads a fixed `len`-byte string field without dropping what follows
    /// the first NUL.
    ///
    /// Text up to the first NUL is returned as is. If the rest of the field
    /// holds another non-empty segment (up to the next NUL), it is appended
    /// after a `|`. Some servers hide data behind the terminator this way.
    pub fn try_read_raw_string(
        &mut self,
        len: usize,
        field: &'static str,
    ) -> Result<String, ProtocolError> {
        let bytes = self.take(len, field)?;
        let value = match bytes.iter().position(|&b| b == 0) {
            None => String::from_utf8_lossy(bytes).into_owned(),
            Some(end) => {
                let mut value = String::from_utf8_lossy(&bytes[..end]).into_owned();
                let rest = &bytes[end + 1..];
                let hidden = match rest.iter().position(|&b| b == 0) {
                    Some(end2) => &rest[..end2],
                    None => rest,
                };
                if !hidden.is_empty() {
                    value.push('|');
                    value.push_str(&String::from_utf8_lossy(hidden));
                }
                value
            }
        };
        tracing::trace!(opcode = self.id, field, value = %value, "read raw string");
        Ok(value)
    }

    /// Skips `len` bytes.
    pub fn try_skip(&mut self, len: usize, field: &'static str) -> Result<(), ProtocolError> {
        self.take(len, field).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Default-returning layer
    // -----------------------------------------------------------------------

    /// Reads one unsigned byte, `0` on failure.
    pub fn read_u8(&mut self, field: &'static str) -> u8 {
        self.try_read_u8(field).unwrap_or_default()
    }

    /// Reads one signed byte, `0` on failure.
    pub fn read_i8(&mut self, field: &'static str) -> i8 {
        self.try_read_i8(field).unwrap_or_default()
    }

    /// Reads a little-endian `i16`, `0` on failure.
    pub fn read_i16(&mut self, field: &'static str) -> i16 {
        self.try_read_i16(field).unwrap_or_default()
    }

    /// Reads a little-endian `u16`, `0` on failure.
    pub fn read_u16(&mut self, field: &'static str) -> u16 {
        self.try_read_u16(field).unwrap_or_default()
    }

    /// Reads a little-endian `i32`, `0` on failure.
    pub fn read_i32(&mut self, field: &'static str) -> i32 {
        self.try_read_i32(field).unwrap_or_default()
    }

    /// Reads a little-endian `u32`, `0` on failure.
    pub fn read_u32(&mut self, field: &'static str) -> u32 {
        self.try_read_u32(field).unwrap_or_default()
    }

    /// NUL-terminated fixed string, empty on failure.
    pub fn read_string(&mut self, len: usize, field: &'static str) -> String {
        self.try_read_string(len, field).unwrap_or_default()
    }

    /// Fixed string keeping the hidden segment, empty on failure.
    pub fn read_raw_string(&mut self, len: usize, field: &'static str) -> String {
        self.try_read_raw_string(len, field).unwrap_or_default()
    }

    /// Skips `len` bytes; a short message just gets marked malformed.
    pub fn skip(&mut self, len: usize, field: &'static str) {
        let _ = self.try_skip(len, field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(opcode: u16, body: &[u8]) -> Vec<u8> {
        let mut data = opcode.to_le_bytes().to_vec();
        data.extend_from_slice(body);
        data
    }

    // =====================================================================
    // Integers
    // =====================================================================

    #[test]
    fn test_new_reads_opcode_little_endian() {
        let data = [0x8e, 0x00];
        let msg = MessageIn::new(&data);
        assert_eq!(msg.id(), 0x008e);
        assert_eq!(msg.position(), 2);
        assert!(!msg.is_malformed());
    }

    #[test]
    fn test_read_integers_in_order() {
        let data = frame(
            0x0001,
            &[0xff, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xfe, 0xff, 0xff, 0xff],
        );
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_u8("a"), 0xff);
        assert_eq!(msg.read_i16("b"), 0x1234);
        assert_eq!(msg.read_i32("c"), 0x1234_5678);
        assert_eq!(msg.read_i32("d"), -2);
        assert_eq!(msg.remaining(), 0);
        assert!(!msg.is_malformed());
    }

    #[test]
    fn test_signed_and_unsigned_views_of_same_bytes() {
        let data = frame(0x0001, &[0xff, 0xff, 0xff, 0xff]);
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_i8("a"), -1);
        assert_eq!(msg.read_u8("b"), 0xff);
        assert_eq!(msg.read_u16("c"), 0xffff);
    }

    // =====================================================================
    // Bounds safety
    // =====================================================================

    #[test]
    fn test_short_buffer_for_each_primitive_returns_default_and_flags() {
        type DefaultCheck = fn(&mut MessageIn<'_>) -> bool;
        let checks: [(&str, DefaultCheck); 8] = [
            ("u8", |m| m.read_u8("x") == 0),
            ("i8", |m| m.read_i8("x") == 0),
            ("i16", |m| m.read_i16("x") == 0),
            ("u16", |m| m.read_u16("x") == 0),
            ("i32", |m| m.read_i32("x") == 0),
            ("u32", |m| m.read_u32("x") == 0),
            ("string", |m| m.read_string(24, "x").is_empty()),
            ("raw string", |m| m.read_raw_string(24, "x").is_empty()),
        ];
        for (name, check) in checks {
            // Opcode only: every primitive above needs at least one more byte.
            let data = [0x01, 0x00];
            let mut msg = MessageIn::new(&data);
            assert!(check(&mut msg), "{name} did not return its default");
            assert!(msg.is_malformed(), "{name} did not flag the message");
        }
    }

    #[test]
    fn test_partial_field_is_not_consumed_piecewise() {
        let data = frame(0x0001, &[0x01, 0x02, 0x03]);
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_i32("needs four"), 0);
        let err = msg.error().unwrap();
        assert_eq!(err.field, "needs four");
        assert_eq!(err.offset, 2);
        assert_eq!(err.wanted, 4);
        assert_eq!(err.remaining, 3);
    }

    #[test]
    fn test_error_is_sticky_and_keeps_first_failure() {
        let data = frame(0x0001, &[0x01, 0x02, 0x03]);
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_i32("first"), 0);
        // Would have fit before the failure, but the cursor is exhausted now.
        assert_eq!(msg.read_u8("second"), 0);
        assert_eq!(msg.error().unwrap().field, "first");
        assert_eq!(msg.remaining(), 0);
    }

    #[test]
    fn test_try_read_reports_out_of_bounds() {
        let data = [0x01, 0x00];
        let mut msg = MessageIn::new(&data);
        let err = msg.try_read_i16("len").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ReadOutOfBounds { opcode: 1, field: "len", .. }
        ));
    }

    #[test]
    fn test_frame_shorter_than_opcode_is_malformed() {
        let data = [0x8e];
        let msg = MessageIn::new(&data);
        assert_eq!(msg.id(), 0);
        assert!(msg.is_malformed());
    }

    // =====================================================================
    // Strings
    // =====================================================================

    #[test]
    fn test_read_string_stops_at_nul_and_consumes_field() {
        let mut body = b"bob".to_vec();
        body.resize(24, 0);
        body.push(7);
        let data = frame(0x0001, &body);
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_string(24, "nick"), "bob");
        assert_eq!(msg.read_u8("after"), 7);
    }

    #[test]
    fn test_read_string_without_terminator_stays_inside_field() {
        let data = frame(0x0001, b"abcdefgh-tail");
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_string(8, "password"), "abcdefgh");
        assert_eq!(msg.remaining(), 5);
    }

    #[test]
    fn test_read_raw_string_keeps_hidden_segment() {
        let data = frame(0x0001, b"visible\0hidden\0\0");
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_raw_string(16, "message"), "visible|hidden");
    }

    #[test]
    fn test_read_string_drops_hidden_segment() {
        let data = frame(0x0001, b"visible\0hidden\0\0");
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_string(16, "message"), "visible");
    }

    #[test]
    fn test_read_raw_string_single_trailing_nul() {
        let data = frame(0x0001, b"Alice : hi\0");
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_raw_string(11, "message"), "Alice : hi");
    }

    #[test]
    fn test_read_zero_length_string_is_empty_and_valid() {
        let data = [0x01, 0x00];
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_string(0, "empty"), "");
        assert!(!msg.is_malformed());
    }

    #[test]
    fn test_read_string_preserves_control_marker_bytes() {
        let data = frame(0x0001, b"\xC2\x82Gbot");
        let mut msg = MessageIn::new(&data);
        assert_eq!(msg.read_string(6, "message"), "\u{82}Gbot");
    }
}
