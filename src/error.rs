use thiserror::Error;

/// Everything that can stop a MUS score from becoming a MIDI file.
///
/// Offsets are byte positions into the MUS input buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("unsupported channel count: {channels} primary channels (max 15)")]
    TooManyChannels { channels: u16 },

    #[error("not a MUS score (identifier {found:02X?})")]
    BadMagic { found: [u8; 4] },

    #[error("input exhausted at offset {offset}: needed {needed} more byte(s)")]
    BufferExhausted { offset: usize, needed: usize },

    #[error("controller index {index} out of range at offset {offset}")]
    ControllerOutOfRange { offset: usize, index: u8 },

    #[error("end of score at offset {offset}, but score region ends at {end}")]
    ScoreEndMismatch { offset: usize, end: usize },

    #[error("delta time at offset {offset} does not fit a MIDI variable-length quantity")]
    DeltaOutOfRange { offset: usize },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
