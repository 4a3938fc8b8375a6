use std::fmt;

use crate::error::MeasureError;
use crate::notation::pitch::Pitch;

/// Circle-of-fifths position of each natural step, C through B.
const STEP_FIFTHS: [i32; 7] = [0, 2, 4, -1, 1, 3, 5];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
    /// Any other mode word. Kept so that callers can report it.
    Other(String),
}

impl Mode {
    fn from_word(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "major" => Self::Major,
            "minor" => Self::Minor,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => f.write_str("major"),
            Self::Minor => f.write_str("minor"),
            Self::Other(word) => f.write_str(word),
        }
    }
}

/// A key: tonic plus mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub tonic: Pitch,
    pub mode: Mode,
}

impl Key {
    /// Parses a key label.
    ///
    /// Accepts the shorthand where an upper-case tonic means major and a lower-case
    /// tonic means minor (`C`, `a`, `f#`, `B-`), or a tonic followed by a mode word
    /// (`G major`, `e minor`, `D dorian`).
    pub fn parse(label: &str) -> Result<Self, MeasureError> {
        let invalid = || MeasureError::InvalidKey(label.to_string());
        let mut words = label.split_whitespace();
        let tonic_label = words.next().ok_or_else(invalid)?;
        let mode = match words.next() {
            Some(word) => Mode::from_word(word),
            None if tonic_label.starts_with(|c: char| c.is_ascii_lowercase()) => Mode::Minor,
            None => Mode::Major,
        };
        if words.next().is_some() || tonic_label.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let tonic = Pitch::parse_name(tonic_label).map_err(|_| invalid())?;
        Ok(Self { tonic, mode })
    }

    /// Number of sharps (positive) or flats (negative) in the key signature.
    /// `None` for modes other than major and minor.
    pub fn sharps(&self) -> Option<i8> {
        let step = "CDEFGAB".find(self.tonic.step())?;
        let major = STEP_FIFTHS[step] + 7 * i32::from(self.tonic.alter());
        let sharps = match self.mode {
            Mode::Major => major,
            Mode::Minor => major - 3,
            Mode::Other(_) => return None,
        };
        i8::try_from(sharps).ok()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tonic = self.tonic.name();
        match self.mode {
            Mode::Minor => write!(f, "{} {}", tonic.to_ascii_lowercase(), self.mode),
            _ => write!(f, "{} {}", tonic, self.mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_selects_mode() {
        assert_eq!(Key::parse("C").unwrap().mode, Mode::Major);
        assert_eq!(Key::parse("a").unwrap().mode, Mode::Minor);
        assert_eq!(Key::parse("f#").unwrap().tonic.to_string(), "F#4");
    }

    #[test]
    fn explicit_mode_words() {
        assert_eq!(Key::parse("G major").unwrap().mode, Mode::Major);
        assert_eq!(Key::parse("e minor").unwrap().mode, Mode::Minor);
        assert_eq!(Key::parse("D dorian").unwrap().mode, Mode::Other("dorian".to_string()));
    }

    #[test]
    fn rejects_bad_labels() {
        assert!(Key::parse("").is_err());
        assert!(Key::parse("X major").is_err());
        assert!(Key::parse("C4").is_err());
        assert!(Key::parse("C major extra").is_err());
    }

    #[test]
    fn signature_sharps() {
        assert_eq!(Key::parse("C").unwrap().sharps(), Some(0));
        assert_eq!(Key::parse("a").unwrap().sharps(), Some(0));
        assert_eq!(Key::parse("D").unwrap().sharps(), Some(2));
        assert_eq!(Key::parse("B-").unwrap().sharps(), Some(-2));
        assert_eq!(Key::parse("c#").unwrap().sharps(), Some(4));
        assert_eq!(Key::parse("D dorian").unwrap().sharps(), None);
    }

    #[test]
    fn display_round_trips() {
        let key = Key::parse("e- minor").unwrap();
        assert_eq!(key.to_string(), "e- minor");
        assert_eq!(Key::parse(&key.to_string()).unwrap(), key);
    }
}
