//! MUS to MIDI channel bookkeeping.
//!
//! MUS channels get MIDI channels in order of first appearance. MIDI channel 9
//! is the General MIDI percussion channel and belongs to MUS channel 15 only.

use log::debug;

pub const MIDI_CHANNELS: usize = 16;
pub const PERCUSSION_MUS: u8 = 15;
pub const PERCUSSION_MIDI: u8 = 9;
/// Key-on velocity used until a channel's first explicit volume.
pub const DEFAULT_VOLUME: u8 = 0x40;

#[derive(Debug, Clone)]
pub struct ChannelMapper {
    map: [Option<u8>; MIDI_CHANNELS],
    next: u8,
}

impl Default for ChannelMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelMapper {
    pub fn new() -> Self {
        let mut map = [None; MIDI_CHANNELS];
        map[PERCUSSION_MUS as usize] = Some(PERCUSSION_MIDI);
        Self { map, next: 0 }
    }

    /// Current assignment for `mus_channel`, if any.
    pub fn get(&self, mus_channel: u8) -> Option<u8> {
        self.map[(mus_channel & 0x0F) as usize]
    }

    /// Resolve `mus_channel`, assigning the next free MIDI channel on first sight.
    ///
    /// The flag is `true` when the assignment was made by this call, in which
    /// case the caller owes the new channel its full-volume preamble.
    pub fn resolve(&mut self, mus_channel: u8) -> (u8, bool) {
        let slot = (mus_channel & 0x0F) as usize;
        if let Some(ch) = self.map[slot] {
            return (ch, false);
        }

        let ch = self.next;
        self.map[slot] = Some(ch);
        self.next += 1;
        if self.next == PERCUSSION_MIDI {
            self.next += 1;
        }
        debug!("MUS channel {mus_channel} -> MIDI channel {ch}");
        (ch, true)
    }
}

/// Last key-on volume seen on each MIDI channel.
#[derive(Debug, Clone)]
pub struct VolumeTable([u8; MIDI_CHANNELS]);

impl Default for VolumeTable {
    fn default() -> Self {
        Self([DEFAULT_VOLUME; MIDI_CHANNELS])
    }
}

impl VolumeTable {
    pub fn get(&self, midi_channel: u8) -> u8 {
        self.0[(midi_channel & 0x0F) as usize]
    }

    pub fn set(&mut self, midi_channel: u8, volume: u8) {
        self.0[(midi_channel & 0x0F) as usize] = volume;
    }
}
