//! inspect.rs
//!
//! Reads a finished MIDI file back with `midly` and summarizes it, as a check
//! that the converter produced something a real MIDI parser accepts.
//!
//! Ticks are turned into wall-clock time with the header's pulses per quarter
//! note (PPQ) and the tempo meta events met along the track.

use anyhow::{Context, Result, bail};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

/// Default tempo when a track never sets one: 500,000 µs per quarter note.
const DEFAULT_US_PER_QN: u32 = 500_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Pulses per quarter note from the header
    pub ppq: u16,
    /// First tempo seen, in microseconds per quarter note
    pub us_per_qn: u32,
    pub events: usize,
    pub total_ticks: u64,
    pub duration_us: u64,
    /// Note-ons with non-zero velocity, per MIDI channel
    pub note_ons: [usize; 16],
    /// (channel, program) in track order
    pub programs: Vec<(u8, u8)>,
    pub ends_with_eot: bool,
}

/// Parse `midi` and walk its single track.
pub fn summarize(midi: &[u8]) -> Result<Summary> {
    let smf = Smf::parse(midi).context("parsing MIDI output")?;
    if smf.header.format != Format::SingleTrack || smf.tracks.len() != 1 {
        bail!("expected a single-track MIDI file, got {} tracks", smf.tracks.len());
    }
    let ppq = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(..) => bail!("timecode division is not produced by this converter"),
    };

    let track = &smf.tracks[0];
    let mut summary = Summary {
        ppq,
        us_per_qn: DEFAULT_US_PER_QN,
        events: track.len(),
        total_ticks: 0,
        duration_us: 0,
        note_ons: [0; 16],
        programs: Vec::new(),
        ends_with_eot: false,
    };

    let mut us_per_qn = None;
    let mut t_us: u64 = 0;
    for ev in track {
        let delta = u64::from(ev.delta.as_int());
        summary.total_ticks += delta;
        t_us += delta * u64::from(us_per_qn.unwrap_or(DEFAULT_US_PER_QN)) / u64::from(ppq.max(1));

        match ev.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(tp)) => {
                // Tempo applies from this event onwards.
                if us_per_qn.is_none() {
                    summary.us_per_qn = tp.as_int();
                }
                us_per_qn = Some(tp.as_int());
            }
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                match message {
                    MidiMessage::NoteOn { vel, .. } if vel.as_int() > 0 => {
                        summary.note_ons[ch as usize] += 1;
                    }
                    MidiMessage::ProgramChange { program } => {
                        summary.programs.push((ch, program.as_int()));
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    summary.duration_us = t_us;
    summary.ends_with_eot = matches!(
        track.last().map(|e| e.kind),
        Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
    );
    Ok(summary)
}

/// Format a microsecond timestamp as MM:SS string.
pub fn format_duration(us: u64) -> String {
    let total_secs = us / 1_000_000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
