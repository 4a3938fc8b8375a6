use std::fmt;

use crate::error::MeasureError;

const STEP_NAMES: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];
const STEP_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
const SHARP_SPELLING: [(usize, i8); 12] = [
    (0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (3, 0),
    (3, 1), (4, 0), (4, 1), (5, 0), (5, 1), (6, 0),
];

/// Octave assumed for pitch names written without one.
pub const IMPLICIT_OCTAVE: i32 = 4;

/// A spelled pitch: diatonic step, chromatic alteration and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    step: usize,
    alter: i8,
    octave: i32,
}

impl Pitch {
    pub fn new(step: char, alter: i8, octave: i32) -> Option<Self> {
        let step = STEP_NAMES.iter().position(|&s| s == step.to_ascii_uppercase())?;
        Some(Self { step, alter, octave })
    }

    /// Spells a MIDI number, preferring sharps.
    pub fn from_midi(midi: i32) -> Self {
        let (step, alter) = SHARP_SPELLING[midi.rem_euclid(12) as usize];
        Self {
            step,
            alter,
            octave: midi.div_euclid(12) - 1,
        }
    }

    /// Parses a pitch name such as `C4`, `F#3`, `B-2` or `Eb5`. The octave may be
    /// omitted, in which case `IMPLICIT_OCTAVE` is used.
    pub fn parse_name(label: &str) -> Result<Self, MeasureError> {
        let invalid = || MeasureError::InvalidPitch(label.to_string());
        let label = label.trim();
        let mut chars = label.chars();
        let step = chars.next().ok_or_else(invalid)?;
        let rest = chars.as_str();

        let mut alter: i8 = 0;
        let mut digits_at = rest.len();
        for (i, c) in rest.char_indices() {
            match c {
                '#' => alter += 1,
                '-' | 'b' => alter -= 1,
                _ => {
                    digits_at = i;
                    break;
                }
            }
        }

        let octave = match &rest[digits_at..] {
            "" => IMPLICIT_OCTAVE,
            digits => digits.parse().map_err(|_| invalid())?,
        };

        Self::new(step, alter, octave).ok_or_else(invalid)
    }

    pub fn step(&self) -> char {
        STEP_NAMES[self.step]
    }

    pub fn alter(&self) -> i8 {
        self.alter
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn midi(&self) -> i32 {
        (self.octave + 1) * 12 + STEP_SEMITONES[self.step] + i32::from(self.alter)
    }

    /// Position on the diatonic staff, counted in steps from C-1.
    fn diatonic_index(&self) -> i32 {
        self.octave * 7 + self.step as i32
    }

    /// Name without octave, e.g. `F#`.
    pub fn name(&self) -> String {
        let accidental = if self.alter >= 0 { '#' } else { '-' };
        let mut name = String::from(self.step());
        for _ in 0..self.alter.unsigned_abs() {
            name.push(accidental);
        }
        name
    }

    /// Moves the pitch by an interval, keeping the spelling the interval implies.
    pub fn transpose(&self, interval: &Interval) -> Self {
        let index = self.diatonic_index() + interval.diatonic;
        let step = index.rem_euclid(7) as usize;
        let octave = index.div_euclid(7);
        let natural = (octave + 1) * 12 + STEP_SEMITONES[step];
        Self {
            step,
            alter: (self.midi() + interval.semitones - natural) as i8,
            octave,
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

/// A directed distance between two pitches: staff steps plus semitones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub diatonic: i32,
    pub semitones: i32,
}

impl Interval {
    pub fn between(from: &Pitch, to: &Pitch) -> Self {
        Self {
            diatonic: to.diatonic_index() - from.diatonic_index(),
            semitones: to.midi() - from.midi(),
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            diatonic: -self.diatonic,
            semitones: -self.semitones,
        }
    }

    /// Short quality-and-size name such as `P5`, `m3` or `-M2` for descending intervals.
    pub fn name(&self) -> String {
        let steps = self.diatonic.abs();
        let semitones = self.semitones.abs();
        let simple = (steps % 7) as usize;
        let deviation = semitones - 12 * (steps / 7) - STEP_SEMITONES[simple];
        let quality = match (simple, deviation) {
            (0 | 3 | 4, 0) => "P".to_string(),
            (0 | 3 | 4, d) if d < 0 => "d".repeat(d.unsigned_abs() as usize),
            (_, 0) => "M".to_string(),
            (_, -1) => "m".to_string(),
            (_, d) if d < 0 => "d".repeat((d.unsigned_abs() - 1) as usize),
            (_, d) => "A".repeat(d as usize),
        };
        let descending = self.diatonic < 0 || (self.diatonic == 0 && self.semitones < 0);
        let sign = if descending { "-" } else { "" };
        format!("{sign}{quality}{}", steps + 1)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(label: &str) -> Pitch {
        Pitch::parse_name(label).unwrap()
    }

    #[test]
    fn parses_scientific_names() {
        assert_eq!(pitch("C4").midi(), 60);
        assert_eq!(pitch("A0").midi(), 21);
        assert_eq!(pitch("F#3").midi(), 54);
        assert_eq!(pitch("B-2").midi(), 46);
        assert_eq!(pitch("Eb5").midi(), 75);
        assert_eq!(pitch("bb").midi(), 70);
        assert_eq!(pitch("C-1").midi(), 23);
        assert_eq!(pitch("G").octave(), IMPLICIT_OCTAVE);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Pitch::parse_name("").is_err());
        assert!(Pitch::parse_name("H4").is_err());
        assert!(Pitch::parse_name("C#x").is_err());
    }

    #[test]
    fn formats_with_music21_accidentals() {
        assert_eq!(pitch("Bb4").to_string(), "B-4");
        assert_eq!(Pitch::from_midi(61).to_string(), "C#4");
    }

    #[test]
    fn fifth_up_keeps_spelling() {
        let fifth = Interval::between(&pitch("C"), &pitch("G"));
        assert_eq!(fifth, Interval { diatonic: 4, semitones: 7 });
        assert_eq!(fifth.name(), "P5");
        assert_eq!(pitch("B3").transpose(&fifth).to_string(), "F#4");
        assert_eq!(pitch("F4").transpose(&fifth).to_string(), "C5");
    }

    #[test]
    fn inverse_restores_pitch() {
        let interval = Interval::between(&pitch("A"), &pitch("C#"));
        for label in ["C4", "E-5", "G#2", "B3"] {
            let p = pitch(label);
            assert_eq!(p.transpose(&interval).transpose(&interval.inverse()), p);
        }
    }

    #[test]
    fn interval_names() {
        assert_eq!(Interval::between(&pitch("C"), &pitch("E-")).name(), "m3");
        assert_eq!(Interval::between(&pitch("A"), &pitch("E")).name(), "-P4");
        assert_eq!(Interval::between(&pitch("C"), &pitch("F#")).name(), "A4");
    }
}
