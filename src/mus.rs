// mus.rs
//! MUS score layout: the fixed header, event bytes and controller numbers.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ConvertError, Result};

pub const MUS_MAGIC: &[u8; 4] = b"MUS\x1A";
pub const MUS_HEADER_SIZE: usize = 16;
/// MUS channel 15 is percussion and never counts as a primary channel.
pub const MAX_PRIMARY_CHANNELS: u16 = 15;

/// Fixed 16-byte MUS header. All fields are little-endian on disk.
///
/// The instrument list that follows it is not needed for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusHeader {
    pub id: [u8; 4],
    pub score_len: u16,
    pub score_start: u16,
    pub channels: u16,
    pub sec_channels: u16,
    pub instr_count: u16,
    pub reserved: u16,
}

impl MusHeader {
    pub fn parse(mus: &[u8]) -> Result<Self> {
        if mus.len() < MUS_HEADER_SIZE {
            return Err(ConvertError::BufferExhausted {
                offset: mus.len(),
                needed: MUS_HEADER_SIZE - mus.len(),
            });
        }

        let mut id = [0u8; 4];
        id.copy_from_slice(&mus[0..4]);
        if &id != MUS_MAGIC {
            return Err(ConvertError::BadMagic { found: id });
        }

        let field = |at: usize| LittleEndian::read_u16(&mus[at..at + 2]);
        let header = Self {
            id,
            score_len: field(4),
            score_start: field(6),
            channels: field(8),
            sec_channels: field(10),
            instr_count: field(12),
            reserved: field(14),
        };

        if header.channels > MAX_PRIMARY_CHANNELS {
            return Err(ConvertError::TooManyChannels { channels: header.channels });
        }
        Ok(header)
    }

    /// Absolute `[start, end)` of the score region.
    pub fn score_range(&self) -> (usize, usize) {
        let start = self.score_start as usize;
        (start, start + self.score_len as usize)
    }
}

/// The three-bit event kind carried in bits 4..6 of a MUS event byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusEventKind {
    ReleaseNote,
    PlayNote,
    PitchWheel,
    SystemEvent,
    Controller,
    EndOfMeasure,
    ScoreEnd,
    Unused,
}

impl From<u8> for MusEventKind {
    fn from(kind: u8) -> Self {
        match kind & 0x07 {
            0 => MusEventKind::ReleaseNote,
            1 => MusEventKind::PlayNote,
            2 => MusEventKind::PitchWheel,
            3 => MusEventKind::SystemEvent,
            4 => MusEventKind::Controller,
            5 => MusEventKind::EndOfMeasure,
            6 => MusEventKind::ScoreEnd,
            _ => MusEventKind::Unused,
        }
    }
}

/// A decoded MUS event byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventByte {
    pub channel: u8,
    pub kind: MusEventKind,
    /// Bit 7: a delta-time follows this event's operands.
    pub has_delta: bool,
}

impl From<u8> for EventByte {
    fn from(b: u8) -> Self {
        Self {
            channel: b & 0x0F,
            kind: MusEventKind::from((b >> 4) & 0x07),
            has_delta: b & 0x80 != 0,
        }
    }
}

/// MUS controller index of the "mono mode" system event.
pub const MONO_MODE: u8 = 12;

/// MUS controller index -> MIDI controller number.
const CONTROLLERS: [u8; 15] = [
    0,    // program change (handled separately)
    0,    // bank select
    0x01, // modulation
    0x07, // volume
    0x0A, // pan
    0x0B, // expression
    0x5B, // reverb depth
    0x5D, // chorus depth
    0x40, // sustain pedal
    0x43, // soft pedal
    0x78, // all sounds off
    0x7B, // all notes off
    0x7E, // mono
    0x7F, // poly
    0x79, // reset all controllers
];

/// Translate a MUS controller index, or `None` if it is outside the table.
pub fn map_controller(index: u8) -> Option<u8> {
    CONTROLLERS.get(index as usize).copied()
}
