use std::fmt;

use num_rational::Ratio;

use crate::constants::DEFAULT_TEMPO_BPM;
use crate::error::MeasureError;

/// Largest beat count a MIDI time signature event can carry.
const MAX_NUMERATOR: u32 = 255;

/// Offsets and durations, in quarter notes.
pub type QuarterLength = Ratio<u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    /// Parses labels such as `4/4`, `6/8` or `3/2`.
    pub fn parse(label: &str) -> Result<Self, MeasureError> {
        let invalid = || MeasureError::InvalidTimeSignature(label.to_string());
        let (numerator, denominator) = label.trim().split_once('/').ok_or_else(invalid)?;
        let numerator: u32 = numerator.trim().parse().map_err(|_| invalid())?;
        let denominator: u32 = denominator.trim().parse().map_err(|_| invalid())?;
        if !(1..=MAX_NUMERATOR).contains(&numerator)
            || !denominator.is_power_of_two()
            || denominator > 64
        {
            return Err(invalid());
        }
        Ok(Self { numerator, denominator })
    }

    /// Length of a full bar in quarter notes.
    pub fn bar_length(&self) -> QuarterLength {
        Ratio::new(self.numerator * 4, self.denominator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo with a quarter-note referent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetronomeMark {
    pub bpm: f64,
}

impl MetronomeMark {
    pub fn new(bpm: f64) -> Self {
        Self { bpm }
    }

    /// Microseconds per quarter note, as MIDI tempo events expect.
    pub fn micros_per_quarter(&self) -> u32 {
        let bpm = if self.bpm > 0.0 && self.bpm.is_finite() { self.bpm } else { DEFAULT_TEMPO_BPM };
        (60_000_000.0 / bpm).round().min(f64::from(0xFF_FFFF)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_meters() {
        let ts = TimeSignature::parse("6/8").unwrap();
        assert_eq!((ts.numerator, ts.denominator), (6, 8));
        assert_eq!(ts.bar_length(), Ratio::new(3, 1));
        assert_eq!(TimeSignature::parse(" 3/4 ").unwrap().bar_length(), Ratio::from_integer(3));
    }

    #[test]
    fn rejects_bad_meters() {
        for label in ["4", "0/4", "4/3", "a/4", ""] {
            assert!(TimeSignature::parse(label).is_err(), "{label}");
        }
    }

    #[test]
    fn numerator_fits_a_midi_event() {
        assert_eq!(TimeSignature::parse("255/4").unwrap().bar_length(), Ratio::from_integer(255));
        assert_eq!(
            TimeSignature::parse("1073741824/4"),
            Err(MeasureError::InvalidTimeSignature("1073741824/4".to_string()))
        );
    }

    #[test]
    fn tempo_in_micros() {
        assert_eq!(MetronomeMark::new(120.0).micros_per_quarter(), 500_000);
        assert_eq!(MetronomeMark::new(0.0).micros_per_quarter(), 500_000);
    }
}
