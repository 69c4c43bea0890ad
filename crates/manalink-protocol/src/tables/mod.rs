//! Packet length tables.
//!
//! Every server message starts with a 16-bit opcode. To find where one
//! message ends and the next begins, the client looks the opcode up in a
//! static table:
//!
//! - a positive entry is the exact size of the message, opcode included;
//! - `-1` means the size is self-declared in a 16-bit field right after the
//!   opcode (counted from the opcode itself);
//! - `0` means the opcode is unknown and the stream can no longer be framed.
//!
//! The two server families ship different tables. They agree on most cells
//! but not all (see [`PacketTable::divergences`]); a connection picks one
//! through [`ServerType`] at session start and keeps it.

mod eathena;
mod tmwa;

use std::fmt;

use serde::{Deserialize, Serialize};

/// How many bytes a message occupies on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketLength {
    /// Exactly this many bytes, opcode included.
    Fixed(u16),
    /// Size carried in the length field after the opcode.
    Variable,
    /// The table does not know this opcode.
    Unknown,
}

impl PacketLength {
    fn from_raw(raw: i16) -> Self {
        match raw {
            -1 => Self::Variable,
            n if n >= 2 => Self::Fixed(n as u16),
            _ => Self::Unknown,
        }
    }
}

/// The server families this client can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// eAthena / rAthena / Hercules derived servers.
    #[default]
    EAthena,
    /// The Mana World's tmwAthena fork.
    TmwAthena,
}

impl ServerType {
    /// Returns the immutable length table for this server family.
    pub fn packet_table(self) -> &'static PacketTable {
        match self {
            Self::EAthena => &EATHENA,
            Self::TmwAthena => &TMWA,
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EAthena => f.write_str("eathena"),
            Self::TmwAthena => f.write_str("tmwathena"),
        }
    }
}

/// An immutable opcode → length table for one server family.
#[derive(Debug)]
pub struct PacketTable {
    server: ServerType,
    lengths: &'static [i16],
}

static EATHENA: PacketTable = PacketTable {
    server: ServerType::EAthena,
    lengths: &eathena::EATHENA_LENGTHS,
};

static TMWA: PacketTable = PacketTable {
    server: ServerType::TmwAthena,
    lengths: &tmwa::TMWA_LENGTHS,
};

impl PacketTable {
    /// The server family this table belongs to.
    pub fn server_type(&self) -> ServerType {
        self.server
    }

    /// Number of opcodes covered. Opcodes at or above this are unknown.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Always `false`; both tables are populated.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Looks up how an opcode is framed. Out-of-range opcodes are `Unknown`.
    pub fn length_of(&self, opcode: u16) -> PacketLength {
        self.lengths
            .get(usize::from(opcode))
            .map_or(PacketLength::Unknown, |&raw| PacketLength::from_raw(raw))
    }

    /// Returns `true` if the opcode can be framed with this table.
    pub fn is_known(&self, opcode: u16) -> bool {
        self.length_of(opcode) != PacketLength::Unknown
    }

    /// Iterates over every known opcode and its framing.
    pub fn known(&self) -> impl Iterator<Item = (u16, PacketLength)> + '_ {
        (0..self.lengths.len()).filter_map(|i| {
            let opcode = i as u16;
            match self.length_of(opcode) {
                PacketLength::Unknown => None,
                len => Some((opcode, len)),
            }
        })
    }

    /// Lists every opcode (within either table's range) whose framing
    /// differs between `self` and `other`, as `(opcode, ours, theirs)`.
    pub fn divergences(&self, other: &PacketTable) -> Vec<(u16, PacketLength, PacketLength)> {
        let range = self.len().max(other.len());
        (0..range)
            .filter_map(|i| {
                let opcode = i as u16;
                let ours = self.length_of(opcode);
                let theirs = other.length_of(opcode);
                (ours != theirs).then_some((opcode, ours, theirs))
            })
            .collect()
    }
}
