//! Splits the received byte stream into complete messages.

use crate::{PacketLength, PacketTable, ProtocolError, VARIABLE_HEADER};

/// Accumulates received chunks and yields whole frames.
///
/// The transport hands over arbitrary chunks; a message can arrive split
/// over several of them, or several messages in one. The framer keeps the
/// leftover bytes between calls.
#[derive(Debug)]
pub struct Framer {
    table: &'static PacketTable,
    buf: Vec<u8>,
}

impl Framer {
    pub fn new(table: &'static PacketTable) -> Self {
        Self {
            table,
            buf: Vec::with_capacity(4096),
        }
    }

    /// The length table used for framing.
    pub fn table(&self) -> &'static PacketTable {
        self.table
    }

    /// Appends received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discards everything buffered.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Returns the next complete frame, or `Ok(None)` if more bytes are
    /// needed.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownOpcode`] when the table has no entry for the
    /// next opcode, [`ProtocolError::InvalidLength`] when a variable message
    /// declares fewer bytes than its own header. Both leave the buffer
    /// untouched; the stream cannot be resynchronised.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        if self.buf.len() < 2 {
            return Ok(None);
        }
        let opcode = u16::from_le_bytes([self.buf[0], self.buf[1]]);
        let size = match self.table.length_of(opcode) {
            PacketLength::Unknown => return Err(ProtocolError::UnknownOpcode { opcode }),
            PacketLength::Fixed(n) => usize::from(n),
            PacketLength::Variable => {
                if self.buf.len() < VARIABLE_HEADER {
                    return Ok(None);
                }
                let declared = u16::from_le_bytes([self.buf[2], self.buf[3]]);
                if usize::from(declared) < VARIABLE_HEADER {
                    return Err(ProtocolError::InvalidLength { opcode, declared });
                }
                usize::from(declared)
            }
        };
        if self.buf.len() < size {
            return Ok(None);
        }
        let rest = self.buf.split_off(size);
        let frame = std::mem::replace(&mut self.buf, rest);
        tracing::trace!(opcode, size, "framed message");
        Ok(Some(frame))
    }
}
