use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use log::info;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use num_rational::Ratio;

use crate::constants::{DEFAULT_VELOCITY, TICKS_PER_BEAT};
use crate::error::DecodeError;
use crate::notation::key::Mode;
use crate::notation::meter::QuarterLength;
use crate::notation::stream::{Part, Score};

/// MIDI channel reserved for percussion.
const DRUM_CHANNEL: u8 = 9;

#[derive(Debug, Clone)]
struct TrackEventAbsolute<'a> {
    tick: u32,
    // meta before note-off before note-on at the same tick
    order: u8,
    kind: TrackEventKind<'a>,
}

fn quarter_length_to_ticks(length: QuarterLength) -> u32 {
    (length * u32::from(TICKS_PER_BEAT)).round().to_integer()
}

/// Start of every measure number in quarter lengths, shared by all parts.
///
/// Measure numbers missing from every part still take up time: they are given the
/// bar length of the closest preceding measure, so parts stay aligned.
fn measure_starts(score: &Score) -> BTreeMap<u32, QuarterLength> {
    let last = score.parts.iter().map(Part::last_measure_number).max().unwrap_or(0);
    let mut starts = BTreeMap::new();
    let mut cursor = Ratio::from_integer(0);
    let mut bar = score
        .parts
        .iter()
        .filter_map(|part| part.measures.first())
        .min_by_key(|measure| measure.number)
        .map_or(Ratio::from_integer(4), |measure| measure.bar_length());
    for number in 1..=last {
        if let Some(measure) = score.parts.iter().find_map(|part| part.measure(number)) {
            bar = measure.bar_length();
        }
        starts.insert(number, cursor);
        cursor += bar;
    }
    starts
}

fn channel_for(part_index: usize) -> u4 {
    let channel = (part_index % 15) as u8;
    u4::new(if channel >= DRUM_CHANNEL { channel + 1 } else { channel })
}

fn part_events<'a>(
    part: &'a Part,
    channel: u4,
    starts: &BTreeMap<u32, QuarterLength>,
) -> Vec<TrackEventAbsolute<'a>> {
    let mut events = vec![
        TrackEventAbsolute {
            tick: 0,
            order: 0,
            kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name.as_bytes())),
        },
        TrackEventAbsolute {
            tick: 0,
            order: 0,
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(part.instrument.program),
                },
            },
        },
    ];

    let velocity = u7::new(DEFAULT_VELOCITY);
    let (mut time_signature, mut key, mut tempo) = (None, None, None);
    for measure in part.measures.iter() {
        let start = starts
            .get(&measure.number)
            .copied()
            .unwrap_or_else(|| Ratio::from_integer(0));
        let measure_tick = quarter_length_to_ticks(start);
        let meta = |message: MetaMessage<'a>| TrackEventAbsolute {
            tick: measure_tick,
            order: 0,
            kind: TrackEventKind::Meta(message),
        };

        if time_signature != Some(measure.time_signature) {
            time_signature = Some(measure.time_signature);
            let ts = measure.time_signature;
            events.push(meta(MetaMessage::TimeSignature(
                ts.numerator.min(255) as u8,
                ts.denominator.trailing_zeros() as u8,
                24,
                8,
            )));
        }
        if let Some(sharps) = measure.key.as_ref().and_then(|k| k.sharps()) {
            let minor = matches!(measure.key.as_ref().map(|k| &k.mode), Some(Mode::Minor));
            if key != Some((sharps, minor)) {
                key = Some((sharps, minor));
                events.push(meta(MetaMessage::KeySignature(sharps, minor)));
            }
        }
        if let Some(mark) = measure.tempo {
            let micros = mark.micros_per_quarter();
            if tempo != Some(micros) {
                tempo = Some(micros);
                events.push(meta(MetaMessage::Tempo(u24::new(micros))));
            }
        }

        for note in measure.notes() {
            let Ok(midi_key) = u8::try_from(note.pitch.midi()) else {
                continue;
            };
            if midi_key > 127 {
                continue;
            }
            let on_tick = quarter_length_to_ticks(start + note.offset);
            let off_tick = quarter_length_to_ticks(start + note.offset + note.duration);
            events.push(TrackEventAbsolute {
                tick: on_tick,
                order: 2,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key: u7::new(midi_key),
                        vel: velocity,
                    },
                },
            });
            events.push(TrackEventAbsolute {
                tick: off_tick,
                order: 1,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key: u7::new(midi_key),
                        vel: velocity,
                    },
                },
            });
        }
    }

    events
}

/// Turns absolute-tick events into a delta-timed track terminated by an end-of-track event.
fn to_track(mut events: Vec<TrackEventAbsolute<'_>>) -> Track<'_> {
    events.sort_by_key(|event| (event.tick, event.order));

    let mut track = Track::new();
    let mut previous_tick = 0;
    for event in events.iter() {
        track.push(TrackEvent {
            delta: u28::new(event.tick - previous_tick),
            kind: event.kind,
        });
        previous_tick = event.tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

/// Builds a multi-track standard MIDI file, one track per part.
pub fn score_to_smf(score: &Score) -> Smf<'_> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));
    let starts = measure_starts(score);
    for (index, part) in score.parts.iter().enumerate() {
        smf.tracks.push(to_track(part_events(part, channel_for(index), &starts)));
    }
    smf
}

/// Generate MIDI file data for a score.
///
/// # Arguments
///
/// * `score` - The decoded score.
///
/// # Returns
///
/// * A vector of bytes representing the MIDI file.
pub fn generate_midi_file_data(score: &Score) -> Result<Vec<u8>, DecodeError> {
    let mut buffer = Vec::new();
    score_to_smf(score).write_std(&mut Cursor::new(&mut buffer))?;
    Ok(buffer)
}

/// Writes the score as a standard MIDI file at `path`.
pub fn write_midi<P: AsRef<Path>>(score: &Score, path: P) -> Result<(), DecodeError> {
    let path = path.as_ref();
    info!("writing midi file {}", path.display());
    let file = BufWriter::new(File::create(path)?);
    score_to_smf(score).write_std(file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::instrument::GmInstrument;
    use crate::notation::meter::{MetronomeMark, TimeSignature};
    use crate::notation::pitch::Pitch;
    use crate::notation::stream::Measure;

    fn one_note_score() -> Score {
        let mut measure = Measure::new(2);
        measure.time_signature = TimeSignature::parse("3/4").unwrap();
        measure.tempo = Some(MetronomeMark::new(90.0));
        let a4 = Pitch::parse_name("A4").unwrap();
        measure.insert_note(Ratio::new(1, 2), a4, Ratio::from_integer(1));
        let mut part = Part::new("Violin", GmInstrument::from_program(40).unwrap());
        part.insert_measure(measure);
        Score { parts: vec![part] }
    }

    #[test]
    fn absent_measures_keep_their_time() {
        let score = one_note_score();
        let starts = measure_starts(&score);
        assert_eq!(starts[&1], Ratio::from_integer(0));
        assert_eq!(starts[&2], Ratio::from_integer(3));
    }

    #[test]
    fn note_ticks_follow_measure_start() {
        let score = one_note_score();
        let smf = score_to_smf(&score);
        assert_eq!(smf.tracks.len(), 1);

        let mut tick = 0u32;
        let mut note_on = None;
        let mut note_off = None;
        for event in smf.tracks[0].iter() {
            tick += event.delta.as_int();
            match event.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => note_on = Some((tick, key.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { .. },
                    ..
                } => note_off = Some(tick),
                _ => {}
            }
        }
        assert_eq!(note_on, Some((3 * 480 + 240, 69)));
        assert_eq!(note_off, Some(3 * 480 + 240 + 480));
    }

    #[test]
    fn file_data_parses_back() {
        let bytes = generate_midi_file_data(&one_note_score()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 1);
    }

    #[test]
    fn channels_skip_percussion() {
        assert_eq!(channel_for(8).as_int(), 8);
        assert_eq!(channel_for(9).as_int(), 10);
    }
}
