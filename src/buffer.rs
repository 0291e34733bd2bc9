//! Growable output buffer for the MIDI file being built.
//!
//! Writes are big-endian (MIDI byte order). The cursor can be moved back to
//! patch a field written earlier, which is how the track length gets filled
//! in once the body is known.

use byteorder::{BigEndian, ByteOrder};

/// Capacity is added in steps of this many bytes.
pub const GROW_CHUNK: usize = 8192;

#[derive(Debug)]
pub struct MidiBuffer {
    data: Vec<u8>,
    pos: usize,
    // Highest offset ever written or skipped to; the logical length.
    high: usize,
}

impl Default for MidiBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiBuffer {
    pub fn new() -> Self {
        Self { data: vec![0; GROW_CHUNK], pos: 0, high: 0 }
    }

    /// Allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn current_offset(&self) -> usize {
        self.pos
    }

    /// Make sure `[pos, pos + extra)` is backed by storage.
    fn reserve(&mut self, extra: usize) {
        let want = self.pos + extra;
        while self.data.len() < want {
            let grown = self.data.len() + GROW_CHUNK;
            self.data.resize(grown, 0);
        }
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
        self.high = self.high.max(self.pos);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.reserve(1);
        self.data[self.pos] = value;
        self.advance(1);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.reserve(2);
        BigEndian::write_u16(&mut self.data[self.pos..], value);
        self.advance(2);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.reserve(4);
        BigEndian::write_u32(&mut self.data[self.pos..], value);
        self.advance(4);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.advance(bytes.len());
    }

    /// Move the cursor to `offset`. Nothing already written is cleared.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
        self.reserve(0);
    }

    /// Advance the cursor by `count` bytes without writing them.
    pub fn skip(&mut self, count: usize) {
        self.reserve(count);
        self.advance(count);
    }

    /// Hand over the written bytes, cut down to the logical length.
    pub fn finalize(mut self) -> (Vec<u8>, usize) {
        self.data.truncate(self.high);
        let len = self.data.len();
        (self.data, len)
    }
}
