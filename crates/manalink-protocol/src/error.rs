//! Error types for the protocol layer.
//!
//! Framing errors ([`ProtocolError::UnknownOpcode`],
//! [`ProtocolError::InvalidLength`]) are fatal for the connection: once the
//! client cannot tell where a message ends, every byte after it is garbage.
//! Read errors are not fatal; they are recorded on the message and surface
//! here only through the strict `try_read_*` layer of
//! [`MessageIn`](crate::MessageIn).

use manalink_transport::TransportError;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The length table has no entry for this opcode, so the stream cannot
    /// be framed any further.
    #[error("unknown opcode {opcode:#06x}: cannot frame the stream")]
    UnknownOpcode { opcode: u16 },

    /// A variable-length message declared a size smaller than its own
    /// header.
    #[error("opcode {opcode:#06x} declares invalid length {declared}")]
    InvalidLength { opcode: u16, declared: u16 },

    /// A read went past the end of the message.
    #[error(
        "read of `{field}` in opcode {opcode:#06x} at offset {offset} wants {wanted} bytes, {remaining} left"
    )]
    ReadOutOfBounds {
        opcode: u16,
        field: &'static str,
        offset: usize,
        wanted: usize,
        remaining: usize,
    },

    /// An outgoing message grew past what a 16-bit length field can carry.
    #[error("outgoing opcode {opcode:#06x} is {len} bytes, larger than a length field allows")]
    MessageTooLong { opcode: u16, len: usize },

    /// Handing a finished message to the transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
