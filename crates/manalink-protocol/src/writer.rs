//! Sequential encoder for one outgoing message.
//!
//! A [`MessageOut`] starts with its opcode already written. Fixed-size
//! messages are created with [`MessageOut::new`]. Variable-size messages are
//! created with [`MessageOut::variable`], which reserves the 16-bit length
//! field and fills it in on [`finish`](MessageOut::finish) with the real
//! size: opcode (2) + length field (2) + payload. Computing the length from
//! the bytes actually written keeps it in step with the `len - 4` that every
//! decoder subtracts.
//!
//! [`send`](MessageOut::send) consumes the writer, so one instance can be
//! transmitted at most once.

use manalink_transport::Outbox;

use crate::ProtocolError;

/// Size of the opcode plus the length field of a variable message.
pub const VARIABLE_HEADER: usize = 4;

/// An outgoing message under construction.
#[derive(Debug, Clone)]
pub struct MessageOut {
    id: u16,
    data: Vec<u8>,
    variable: bool,
}

impl MessageOut {
    /// Starts a fixed-size message.
    pub fn new(id: u16) -> Self {
        let mut data = Vec::with_capacity(32);
        data.extend_from_slice(&id.to_le_bytes());
        Self {
            id,
            data,
            variable: false,
        }
    }

    /// Starts a variable-size message with a placeholder length field.
    pub fn variable(id: u16) -> Self {
        let mut msg = Self::new(id);
        msg.data.extend_from_slice(&[0, 0]);
        msg.variable = true;
        msg
    }

    /// The message's opcode.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Bytes written so far, header included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Never true: the opcode is always present.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes written so far. The length field of a variable message is
    /// still zero here.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn write_u8(&mut self, value: u8, field: &'static str) {
        tracing::trace!(opcode = self.id, field, value, "write u8");
        self.data.push(value);
    }

    pub fn write_i8(&mut self, value: i8, field: &'static str) {
        tracing::trace!(opcode = self.id, field, value, "write i8");
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16, field: &'static str) {
        tracing::trace!(opcode = self.id, field, value, "write i16");
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16, field: &'static str) {
        tracing::trace!(opcode = self.id, field, value, "write u16");
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32, field: &'static str) {
        tracing::trace!(opcode = self.id, field, value, "write i32");
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32, field: &'static str) {
        tracing::trace!(opcode = self.id, field, value, "write u32");
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes `value` into a field of exactly `width` bytes.
    ///
    /// Shorter values are padded with zero bytes; longer values are cut at
    /// `width` bytes without complaint. The cut is byte-based and may split
    /// a multi-byte character, as the server expects raw bytes.
    pub fn write_string(&mut self, value: &str, width: usize, field: &'static str) {
        let bytes = value.as_bytes();
        let kept = bytes.len().min(width);
        if kept < bytes.len() {
            tracing::trace!(opcode = self.id, field, width, len = bytes.len(), "string truncated");
        } else {
            tracing::trace!(opcode = self.id, field, width, value, "write string");
        }
        self.data.extend_from_slice(&bytes[..kept]);
        self.data.resize(self.data.len() + (width - kept), 0);
    }

    /// Writes raw bytes as they are.
    pub fn write_bytes(&mut self, bytes: &[u8], field: &'static str) {
        tracing::trace!(opcode = self.id, field, len = bytes.len(), "write bytes");
        self.data.extend_from_slice(bytes);
    }

    /// Completes the message and returns its bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MessageTooLong`] if a variable message does
    /// not fit its 16-bit length field.
    pub fn finish(mut self) -> Result<Vec<u8>, ProtocolError> {
        if self.variable {
            let len = u16::try_from(self.data.len()).map_err(|_| ProtocolError::MessageTooLong {
                opcode: self.id,
                len: self.data.len(),
            })?;
            self.data[2..4].copy_from_slice(&len.to_le_bytes());
        }
        Ok(self.data)
    }

    /// Completes the message and queues it for the connection.
    pub fn send(self, outbox: &Outbox) -> Result<(), ProtocolError> {
        let id = self.id;
        let frame = self.finish()?;
        tracing::debug!(opcode = id, len = frame.len(), "queueing message");
        outbox.push(frame)?;
        Ok(())
    }
}
