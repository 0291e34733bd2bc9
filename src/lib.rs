//! DOOM MUS to Standard MIDI File conversion.
//!
//! [`mus_to_midi`] takes a whole MUS lump and returns a format-0 MIDI file
//! built in memory. The [`wad`] and [`inspect`] modules are the helpers the
//! command-line tool uses around it.

pub mod buffer;
pub mod channels;
pub mod convert;
pub mod error;
pub mod inspect;
pub mod mus;
pub mod transcode;
pub mod varlen;
pub mod wad;

pub use convert::mus_to_midi;
pub use error::{ConvertError, Result};
