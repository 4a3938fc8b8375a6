use num_rational::Ratio;

use crate::notation::instrument::GmInstrument;
use crate::notation::key::Key;
use crate::notation::meter::{MetronomeMark, QuarterLength, TimeSignature};
use crate::notation::pitch::{Interval, Pitch};

/// Notes from this MIDI number upward get their stem drawn down.
const STEM_DOWN_FROM: i32 = 71;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub pitch: Pitch,
    pub offset: QuarterLength,
    pub duration: QuarterLength,
    pub stem: Option<StemDirection>,
    /// 1-based voice number once voices have been reconciled.
    pub voice: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Note(Note),
    Rest {
        offset: QuarterLength,
        duration: QuarterLength,
    },
}

impl Element {
    pub fn offset(&self) -> QuarterLength {
        match self {
            Self::Note(note) => note.offset,
            Self::Rest { offset, .. } => *offset,
        }
    }

    pub fn duration(&self) -> QuarterLength {
        match self {
            Self::Note(note) => note.duration,
            Self::Rest { duration, .. } => *duration,
        }
    }

    pub fn end(&self) -> QuarterLength {
        self.offset() + self.duration()
    }

    fn sort_key(&self) -> (QuarterLength, u8, i32) {
        match self {
            Self::Rest { offset, .. } => (*offset, 0, 0),
            Self::Note(note) => (note.offset, 1, note.pitch.midi()),
        }
    }
}

/// One bar of music with its key, meter and tempo context.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub number: u32,
    pub key: Option<Key>,
    pub time_signature: TimeSignature,
    pub tempo: Option<MetronomeMark>,
    pub elements: Vec<Element>,
}

impl Measure {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            key: None,
            time_signature: TimeSignature::default(),
            tempo: None,
            elements: Vec::new(),
        }
    }

    pub fn bar_length(&self) -> QuarterLength {
        self.time_signature.bar_length()
    }

    pub fn insert_note(&mut self, offset: QuarterLength, pitch: Pitch, duration: QuarterLength) {
        self.elements.push(Element::Note(Note {
            pitch,
            offset,
            duration,
            stem: None,
            voice: None,
        }));
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.elements.iter().filter_map(|element| match element {
            Element::Note(note) => Some(note),
            Element::Rest { .. } => None,
        })
    }

    pub fn rests(&self) -> impl Iterator<Item = (QuarterLength, QuarterLength)> + '_ {
        self.elements.iter().filter_map(|element| match element {
            Element::Rest { offset, duration } => Some((*offset, *duration)),
            Element::Note(_) => None,
        })
    }

    /// Shifts every note by the interval. Offsets, durations and the key context are untouched.
    pub fn transpose(&mut self, interval: &Interval) {
        for element in self.elements.iter_mut() {
            if let Element::Note(note) = element {
                note.pitch = note.pitch.transpose(interval);
            }
        }
    }

    /// Fills the silence before the first element and after the last one with rests.
    /// Gaps between elements are left alone, so decoded durations stay exact.
    /// An empty measure gets a single rest spanning the bar.
    pub fn make_rests(&mut self) {
        let bar = self.bar_length();
        let zero = Ratio::from_integer(0);

        let Some(first) = self.elements.iter().map(Element::offset).min() else {
            self.elements.push(Element::Rest {
                offset: zero,
                duration: bar,
            });
            return;
        };
        let last = self.elements.iter().map(Element::end).max().unwrap_or(zero);

        if first > zero {
            self.elements.insert(0, Element::Rest {
                offset: zero,
                duration: first,
            });
        }
        if last < bar {
            self.elements.push(Element::Rest {
                offset: last,
                duration: bar - last,
            });
        }
    }

    /// Snaps note offsets and durations to the nearest multiple of a quarter-note
    /// fraction, sixteenths or triplet eighths, whichever lies closer.
    pub fn quantize(&mut self) {
        for element in self.elements.iter_mut() {
            if let Element::Note(note) = element {
                note.offset = snap(note.offset);
                let duration = snap(note.duration);
                note.duration = if duration == Ratio::from_integer(0) {
                    Ratio::new(1, 4)
                } else {
                    duration
                };
            }
        }
    }

    /// Orders elements and assigns stem directions.
    pub fn make_notation(&mut self) {
        self.elements.sort_by_key(Element::sort_key);
        for element in self.elements.iter_mut() {
            if let Element::Note(note) = element {
                note.stem = Some(if note.pitch.midi() >= STEM_DOWN_FROM {
                    StemDirection::Down
                } else {
                    StemDirection::Up
                });
            }
        }
    }

    /// Splits overlapping notes into voices. Each note goes to the first voice whose
    /// previous note has ended. Returns the number of voices used.
    pub fn make_voices(&mut self) -> usize {
        self.elements.sort_by_key(Element::sort_key);
        let mut voice_ends: Vec<QuarterLength> = Vec::new();
        for element in self.elements.iter_mut() {
            if let Element::Note(note) = element {
                let voice = match voice_ends.iter().position(|&end| end <= note.offset) {
                    Some(voice) => voice,
                    None => {
                        voice_ends.push(note.offset);
                        voice_ends.len() - 1
                    }
                };
                voice_ends[voice] = note.offset + note.duration;
                note.voice = Some(voice as u32 + 1);
            }
        }
        voice_ends.len()
    }
}

fn snap(value: QuarterLength) -> QuarterLength {
    let to_grid = |divisor: u32| {
        let scaled = value * divisor;
        Ratio::new(scaled.round().to_integer(), divisor)
    };
    let (sixteenths, triplets) = (to_grid(4), to_grid(3));
    let distance = |candidate: QuarterLength| {
        if candidate > value { candidate - value } else { value - candidate }
    };
    if distance(triplets) < distance(sixteenths) {
        triplets
    } else {
        sixteenths
    }
}

/// One instrument's line: its measures, ordered by number.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub instrument: GmInstrument,
    pub measures: Vec<Measure>,
}

impl Part {
    pub fn new(name: &str, instrument: GmInstrument) -> Self {
        Self {
            name: name.to_string(),
            instrument,
            measures: Vec::new(),
        }
    }

    /// Inserts a measure at its number, replacing any measure already there.
    pub fn insert_measure(&mut self, measure: Measure) {
        match self.measures.binary_search_by_key(&measure.number, |m| m.number) {
            Ok(index) => self.measures[index] = measure,
            Err(index) => self.measures.insert(index, measure),
        }
    }

    pub fn measure(&self, number: u32) -> Option<&Measure> {
        self.measures
            .binary_search_by_key(&number, |m| m.number)
            .ok()
            .map(|index| &self.measures[index])
    }

    /// Highest measure number present, 0 for an empty part.
    pub fn last_measure_number(&self) -> u32 {
        self.measures.last().map_or(0, |m| m.number)
    }

    pub fn make_notation(&mut self) {
        for measure in self.measures.iter_mut() {
            measure.make_notation();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub parts: Vec<Part>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_part_first(&mut self, part: Part) {
        self.parts.insert(0, part);
    }

    /// Reconciles voices in every measure of every part.
    /// Returns the most voices any measure needed.
    pub fn make_voices(&mut self) -> usize {
        self.parts
            .iter_mut()
            .flat_map(|part| part.measures.iter_mut())
            .map(Measure::make_voices)
            .max()
            .unwrap_or(0)
    }
}
