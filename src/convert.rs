//! MIDI container assembly around the transcoded score.

use log::debug;

use crate::buffer::MidiBuffer;
use crate::channels::PERCUSSION_MIDI;
use crate::error::{ConvertError, Result};
use crate::mus::MusHeader;
use crate::transcode::{CC_VOLUME, FULL_VOLUME, MIDI_CTRLCHANGE, Step, Transcoder};

/// Ticks per quarter note written to the MIDI header.
pub const DIVISION: u16 = 0x0059;
/// Tempo meta event at delta 0: 0x09A31A µs per quarter note, which with
/// DIVISION approximates the 140 Hz MUS tick.
const TEMPO_EVENT: [u8; 7] = [0x00, 0xFF, 0x51, 0x03, 0x09, 0xA3, 0x1A];
/// "MTrk" plus its 32-bit length.
pub const TRACK_HEADER_SIZE: usize = 8;

/// Convert a complete MUS lump into a format-0 Standard MIDI File.
///
/// The result is all-or-nothing: on error no partial output is returned.
pub fn mus_to_midi(mus: &[u8]) -> Result<Vec<u8>> {
    let header = MusHeader::parse(mus)?;
    let (start, end) = header.score_range();
    if end > mus.len() {
        return Err(ConvertError::BufferExhausted { offset: mus.len(), needed: end - mus.len() });
    }
    debug!(
        "MUS score {start}..{end}, {} primary / {} secondary channels, {} instruments",
        header.channels, header.sec_channels, header.instr_count
    );

    let mut out = MidiBuffer::new();

    out.write_bytes(b"MThd");
    out.write_u32(6);
    out.write_u16(0); // format 0
    out.write_u16(1); // one track
    out.write_u16(DIVISION);

    let track_start = out.current_offset();
    out.write_bytes(b"MTrk");
    let length_slot = out.current_offset();
    out.skip(4);

    out.write_bytes(&TEMPO_EVENT);
    out.write_bytes(&[0x00, MIDI_CTRLCHANGE | PERCUSSION_MIDI, CC_VOLUME, FULL_VOLUME]);

    let mut transcoder = Transcoder::new(mus, start, end, header.channels);
    let mut ended = false;
    while !transcoder.at_end() {
        if transcoder.step(&mut out)? == Step::End {
            ended = true;
            break;
        }
    }
    if !ended {
        transcoder.finish(&mut out);
    }

    let body_end = out.current_offset();
    let track_len = body_end - track_start - TRACK_HEADER_SIZE;
    out.seek(length_slot);
    out.write_u32(track_len as u32);
    out.seek(body_end);

    let (bytes, len) = out.finalize();
    debug!("wrote {len} bytes of MIDI ({track_len} byte track)");
    Ok(bytes)
}
