//! One-event-at-a-time translation of a MUS score into MIDI track events.
//!
//! Each MUS event is stamped with the delta-time read after the event before
//! it, then rewritten as a MIDI channel message on the mapped channel.

use log::{trace, warn};

use crate::buffer::MidiBuffer;
use crate::channels::{ChannelMapper, VolumeTable};
use crate::error::{ConvertError, Result};
use crate::mus::{EventByte, MONO_MODE, MusEventKind, map_controller};
use crate::varlen::{MAX_VARLEN, decode_mus_delta, encode_varlen};

pub const MIDI_NOTEOFF: u8 = 0x80;
pub const MIDI_NOTEON: u8 = 0x90;
pub const MIDI_CTRLCHANGE: u8 = 0xB0;
pub const MIDI_PRGMCHANGE: u8 = 0xC0;
pub const MIDI_PITCHBEND: u8 = 0xE0;

pub const CC_VOLUME: u8 = 0x07;
pub const FULL_VOLUME: u8 = 127;
const NOTEOFF_VELOCITY: u8 = 0x40;

/// End-of-track meta event, minus its delta-time.
pub const END_OF_TRACK: [u8; 3] = [0xFF, 0x2F, 0x00];

/// Outcome of a single [`Transcoder::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    End,
}

/// Per-conversion state: source cursor, channel tables and the pending delta.
#[derive(Debug)]
pub struct Transcoder<'a> {
    mus: &'a [u8],
    cursor: usize,
    end: usize,
    primary_channels: u16,
    mapper: ChannelMapper,
    volumes: VolumeTable,
    pending_delta: u32,
}

impl<'a> Transcoder<'a> {
    /// `start..end` is the score region inside `mus`; it must already be known
    /// to lie within the buffer.
    pub fn new(mus: &'a [u8], start: usize, end: usize, primary_channels: u16) -> Self {
        debug_assert!(start <= end && end <= mus.len());
        Self {
            mus,
            cursor: start,
            end,
            primary_channels,
            mapper: ChannelMapper::new(),
            volumes: VolumeTable::default(),
            pending_delta: 0,
        }
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.end
    }

    fn next_byte(&mut self) -> Result<u8> {
        if self.cursor >= self.end {
            return Err(ConvertError::BufferExhausted { offset: self.cursor, needed: 1 });
        }
        let b = self.mus[self.cursor];
        self.cursor += 1;
        Ok(b)
    }

    fn peek(&self) -> Option<u8> {
        (self.cursor < self.end).then(|| self.mus[self.cursor])
    }

    fn controller(&mut self) -> Result<(u8, u8)> {
        let offset = self.cursor;
        let index = self.next_byte()?;
        let cc = map_controller(index)
            .ok_or(ConvertError::ControllerOutOfRange { offset, index })?;
        Ok((index, cc))
    }

    /// Emit the pending delta-time and clear it.
    fn write_delta(&mut self, out: &mut MidiBuffer) {
        let (bytes, len) = encode_varlen(self.pending_delta);
        out.write_bytes(&bytes[..len]);
        self.pending_delta = 0;
    }

    /// Transcode the event under the cursor.
    pub fn step(&mut self, out: &mut MidiBuffer) -> Result<Step> {
        let at = self.cursor;
        let event = EventByte::from(self.next_byte()?);
        trace!("{at:#06x}: {:?} on MUS channel {}", event.kind, event.channel);

        match event.kind {
            MusEventKind::EndOfMeasure | MusEventKind::Unused => {
                warn!("skipping reserved MUS event {:?} at offset {at}", event.kind);
            }
            MusEventKind::ScoreEnd => {
                if self.cursor != self.end {
                    return Err(ConvertError::ScoreEndMismatch { offset: at, end: self.end });
                }
                self.write_delta(out);
                out.write_bytes(&END_OF_TRACK);
                return Ok(Step::End);
            }
            kind => {
                let (ch, fresh) = self.mapper.resolve(event.channel);
                self.write_delta(out);
                if fresh {
                    // MUS channels start out at full volume; MIDI ones do not.
                    out.write_bytes(&[MIDI_CTRLCHANGE | ch, CC_VOLUME, FULL_VOLUME, 0x00]);
                }
                self.channel_event(kind, ch, out)?;
            }
        }

        if event.has_delta {
            let (delta, used) = decode_mus_delta(&self.mus[..self.end], self.cursor, 0)?;
            self.cursor += used;
            self.pending_delta = self
                .pending_delta
                .checked_add(delta)
                .filter(|&d| d <= MAX_VARLEN)
                .ok_or(ConvertError::DeltaOutOfRange { offset: self.cursor - used })?;
        }
        Ok(Step::Continue)
    }

    fn channel_event(&mut self, kind: MusEventKind, ch: u8, out: &mut MidiBuffer) -> Result<()> {
        match kind {
            MusEventKind::ReleaseNote => {
                let note = self.next_byte()? & 0x7F;
                out.write_bytes(&[MIDI_NOTEOFF | ch, note, NOTEOFF_VELOCITY]);
            }
            MusEventKind::PlayNote => {
                let raw = self.next_byte()?;
                if raw & 0x80 != 0 {
                    let volume = self.next_byte()? & 0x7F;
                    self.volumes.set(ch, volume);
                }
                out.write_bytes(&[MIDI_NOTEON | ch, raw & 0x7F, self.volumes.get(ch)]);
            }
            MusEventKind::PitchWheel => {
                // 8-bit MUS bend, 128 = centre; spread over MIDI's 14 bits.
                let bend = self.next_byte()?;
                out.write_bytes(&[MIDI_PITCHBEND | ch, (bend & 1) << 6, bend >> 1]);
            }
            MusEventKind::SystemEvent => {
                let (index, cc) = self.controller()?;
                let value = if index == MONO_MODE { self.primary_channels as u8 + 1 } else { 0 };
                out.write_bytes(&[MIDI_CTRLCHANGE | ch, cc, value]);
            }
            MusEventKind::Controller => {
                if self.peek() == Some(0) {
                    self.cursor += 1;
                    let program = self.next_byte()? & 0x7F;
                    out.write_bytes(&[MIDI_PRGMCHANGE | ch, program]);
                } else {
                    let (_, cc) = self.controller()?;
                    let value = self.next_byte()? & 0x7F;
                    out.write_bytes(&[MIDI_CTRLCHANGE | ch, cc, value]);
                }
            }
            MusEventKind::EndOfMeasure | MusEventKind::ScoreEnd | MusEventKind::Unused => {
                unreachable!("handled by step")
            }
        }
        Ok(())
    }

    /// Close the track when the score region ran out without an end event.
    pub fn finish(&mut self, out: &mut MidiBuffer) {
        warn!("score region ended at offset {} without an end-of-score event", self.end);
        self.write_delta(out);
        out.write_bytes(&END_OF_TRACK);
    }
}
