// MIDI output for generated melodies.
//
// The generator talks to a `TrackWriter`: one program change, one tempo,
// then every note as (channel, pitch, start, duration, velocity) in beats.
// `SmfTrackWriter` collects those calls and encodes a single-track Standard
// MIDI File (format 0) with the `midly` crate. Notes are flattened into
// absolute-tick note-on/note-off pairs, sorted (offs before ons at the same
// tick), then delta-encoded. A note that starts while an earlier note on the
// same channel and key is still sounding ends that earlier note at its own
// start, so the later note keeps its full length (see `resolve_overlaps`).
//
// `render_melody` drives a writer in the boundary order. `write_file` owns
// the output file for the duration of one call: create, write, flush, close.

use crate::beats::Beats;
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::melody::Melody;
use crate::timing::NoteEvent;
use log::info;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Largest tempo value the 24-bit meta event can hold (microseconds/quarter).
const MAX_TEMPO_MICROS: u32 = 0xff_ffff;

/// Sink for one melody's track data.
pub trait TrackWriter {
    fn track_name(&mut self, name: &str);
    fn program_change(&mut self, channel: u8, program: u8);
    fn tempo(&mut self, bpm: u32);
    fn note(&mut self, channel: u8, event: &NoteEvent);
}

/// Feed `melody` to `writer`: name, program change, tempo, then every event
/// including the silent tail.
pub fn render_melody(melody: &Melody, config: &GeneratorConfig, writer: &mut impl TrackWriter) {
    writer.track_name(&format!("{} melody", melody.mood()));
    writer.program_change(config.channel, melody.params().instrument);
    writer.tempo(melody.tempo());
    for event in melody.events() {
        writer.note(config.channel, event);
    }
}

/// Convenience: render `melody` to an SMF file at `path`.
pub fn write_melody(melody: &Melody, config: &GeneratorConfig, path: &Path) -> Result<()> {
    let mut writer = SmfTrackWriter::new(config.ticks_per_quarter);
    render_melody(melody, config, &mut writer);
    writer.write_file(path)
}

/// Ordering rank within a tick: setup first, then note-offs, then note-ons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Setup,
    Off,
    On,
}

/// One note flattened to absolute ticks.
#[derive(Debug, Clone, Copy)]
struct Span {
    channel: u8,
    pitch: u8,
    velocity: u8,
    on: u32,
    off: u32,
}

/// Collects track data and encodes it as a format-0 SMF.
#[derive(Debug, Clone)]
pub struct SmfTrackWriter {
    ticks_per_quarter: u16,
    name: Option<String>,
    program: Option<(u8, u8)>,
    tempo_bpm: Option<u32>,
    notes: Vec<(u8, NoteEvent)>,
}

impl SmfTrackWriter {
    pub fn new(ticks_per_quarter: u16) -> Self {
        SmfTrackWriter {
            ticks_per_quarter,
            name: None,
            program: None,
            tempo_bpm: None,
            notes: Vec::new(),
        }
    }

    /// Build the in-memory SMF. Borrows the track name from `self`.
    pub fn to_smf(&self) -> Smf<'_> {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(self.ticks_per_quarter)),
        ));

        let mut timed: Vec<(u32, Rank, TrackEventKind<'_>)> = Vec::new();

        if let Some(name) = &self.name {
            timed.push((0, Rank::Setup, TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes()))));
        }
        if let Some(bpm) = self.tempo_bpm {
            timed.push((
                0,
                Rank::Setup,
                TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_micros(bpm)))),
            ));
        }
        if let Some((channel, program)) = self.program {
            timed.push((
                0,
                Rank::Setup,
                TrackEventKind::Midi {
                    channel: u4::new(channel),
                    message: MidiMessage::ProgramChange {
                        program: u7::new(program),
                    },
                },
            ));
        }

        for span in self.resolve_overlaps() {
            let channel = u4::new(span.channel);
            let key = u7::new(span.pitch);
            timed.push((
                span.on,
                Rank::On,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key,
                        vel: u7::new(span.velocity),
                    },
                },
            ));
            timed.push((
                span.off,
                Rank::Off,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key,
                        vel: u7::new(0),
                    },
                },
            ));
        }

        // Stable: equal (tick, rank) keeps insertion order.
        timed.sort_by_key(|&(tick, rank, _)| (tick, rank));

        let mut track: Track<'_> = Vec::with_capacity(timed.len() + 1);
        let mut last_tick = 0;
        for (tick, _, kind) in timed {
            track.push(TrackEvent {
                delta: u28::new(tick - last_tick),
                kind,
            });
            last_tick = tick;
        }
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);

        smf
    }

    /// Encode to SMF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.to_smf().write_std(&mut buf)?;
        Ok(buf)
    }

    /// Encode and write to `path`, replacing any existing file.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.to_smf().write_std(&mut out)?;
        out.flush()?;
        info!("wrote {} notes to {}", self.notes.len(), path.display());
        Ok(())
    }

    /// Notes as tick spans, with each note cut short where the next note on
    /// the same channel and key begins. Notes left with no length are dropped.
    fn resolve_overlaps(&self) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .notes
            .iter()
            .map(|&(channel, event)| Span {
                channel,
                pitch: event.pitch,
                velocity: event.velocity,
                on: self.ticks(event.start),
                off: self.ticks(event.end()),
            })
            .collect();

        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by_key(|&i| (spans[i].channel, spans[i].pitch, spans[i].on));
        for pair in order.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if spans[earlier].channel == spans[later].channel
                && spans[earlier].pitch == spans[later].pitch
                && spans[later].on < spans[earlier].off
            {
                spans[earlier].off = spans[later].on;
            }
        }

        spans.retain(|span| span.off > span.on);
        spans
    }

    fn ticks(&self, beats: Beats) -> u32 {
        beats.to_ticks(self.ticks_per_quarter)
    }
}

impl TrackWriter for SmfTrackWriter {
    fn track_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.program = Some((channel, program));
    }

    fn tempo(&mut self, bpm: u32) {
        self.tempo_bpm = Some(bpm);
    }

    fn note(&mut self, channel: u8, event: &NoteEvent) {
        self.notes.push((channel, *event));
    }
}

/// Microseconds per quarter note, clamped to what the meta event can hold.
fn tempo_micros(bpm: u32) -> u32 {
    (60_000_000 / bpm.max(1)).clamp(1, MAX_TEMPO_MICROS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start_halves: u32, beats: u32, velocity: u8) -> NoteEvent {
        NoteEvent {
            pitch,
            start: Beats::from_half_beats(start_halves),
            duration: Beats::whole(beats),
            velocity,
        }
    }

    #[test]
    fn test_tempo_micros() {
        assert_eq!(tempo_micros(120), 500_000);
        assert_eq!(tempo_micros(90), 666_666);
        assert_eq!(tempo_micros(1), MAX_TEMPO_MICROS);
        assert_eq!(tempo_micros(0), MAX_TEMPO_MICROS);
    }

    #[test]
    fn test_smf_layout() {
        let mut writer = SmfTrackWriter::new(480);
        writer.track_name("sad melody");
        writer.program_change(0, 42);
        writer.tempo(120);
        writer.note(0, &note(60, 0, 1, 100));
        writer.note(0, &note(62, 1, 1, 100));
        writer.note(0, &note(1, 2, 2, 0));

        let smf = writer.to_smf();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);
        let track = &smf.tracks[0];
        // name + tempo + program + 3 * (on + off) + end of track
        assert_eq!(track.len(), 3 + 6 + 1);
        assert!(matches!(
            track[0].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(b"sad melody"))
        ));
        assert!(matches!(
            track.last().unwrap().kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        ));
    }

    #[test]
    fn test_half_beat_push_lands_on_tick() {
        let mut writer = SmfTrackWriter::new(480);
        writer.note(0, &note(60, 0, 1, 100));
        writer.note(0, &note(64, 1, 1, 100)); // starts at 0.5 beats

        let smf = writer.to_smf();
        let mut tick = 0u32;
        let mut on_ticks = Vec::new();
        for ev in &smf.tracks[0] {
            tick += ev.delta.as_int();
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } = ev.kind
            {
                on_ticks.push((key.as_int(), tick));
            }
        }
        assert_eq!(on_ticks, vec![(60, 0), (64, 240)]);
    }

    #[test]
    fn test_note_off_precedes_note_on_at_same_tick() {
        let mut writer = SmfTrackWriter::new(480);
        writer.note(0, &note(60, 0, 1, 100));
        writer.note(0, &note(60, 2, 1, 100));

        let smf = writer.to_smf();
        let kinds: Vec<&str> = smf.tracks[0]
            .iter()
            .filter_map(|ev| match ev.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                } => Some("on"),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { .. },
                    ..
                } => Some("off"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["on", "off", "on", "off"]);
    }

    /// Collect (tick, "on"/"off", key) for every note message.
    fn note_messages(smf: &Smf<'_>) -> Vec<(u32, &'static str, u8)> {
        let mut tick = 0u32;
        let mut out = Vec::new();
        for ev in &smf.tracks[0] {
            tick += ev.delta.as_int();
            match ev.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => out.push((tick, "on", key.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { key, .. },
                    ..
                } => out.push((tick, "off", key.as_int())),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_pushed_repeat_ends_previous_note() {
        let config = GeneratorConfig::default();
        let events = crate::timing::schedule_events(&[60, 60], &config, |i| i == 1).unwrap();
        let mut writer = SmfTrackWriter::new(480);
        for event in &events[..2] {
            writer.note(0, event);
        }

        let smf = writer.to_smf();
        assert_eq!(
            note_messages(&smf),
            vec![(0, "on", 60), (240, "off", 60), (240, "on", 60), (720, "off", 60)]
        );
    }

    #[test]
    fn test_overlap_on_other_key_is_untouched() {
        let mut writer = SmfTrackWriter::new(480);
        writer.note(0, &note(60, 0, 1, 100));
        writer.note(0, &note(62, 1, 1, 100));

        let smf = writer.to_smf();
        assert_eq!(
            note_messages(&smf),
            vec![(0, "on", 60), (240, "on", 62), (480, "off", 60), (720, "off", 62)]
        );
    }

    #[test]
    fn test_bytes_parse_back() {
        let mut writer = SmfTrackWriter::new(480);
        writer.program_change(0, 7);
        writer.tempo(90);
        writer.note(0, &note(72, 0, 1, 100));
        let bytes = writer.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        let has_program = smf.tracks[0].iter().any(|ev| {
            matches!(
                ev.kind,
                TrackEventKind::Midi {
                    message: MidiMessage::ProgramChange { program },
                    ..
                } if program.as_int() == 7
            )
        });
        assert!(has_program);
    }
}
