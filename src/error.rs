use std::fmt;

/// Failures that abort a whole decode call.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("missing required column {0}")]
    MissingColumn(String),
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("column {0:?} is not a pitch name")]
    InvalidPitchColumn(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("error reading configuration: {0}")]
    ConfigFormat(#[from] toml::de::Error),
    #[error("error reading table: {0}")]
    TableFormat(#[from] serde_json::Error),
    #[error("error writing midi file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures confined to a single measure. The measure is skipped, the score continues.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("unknown key label {0:?}")]
    InvalidKey(String),
    #[error("key mode {0:?} is neither major nor minor")]
    UnsupportedMode(String),
    #[error("unknown time signature {0:?}")]
    InvalidTimeSignature(String),
    #[error("invalid pitch label {0:?}")]
    InvalidPitch(String),
    #[error("frame {frame} does not follow frame {previous}")]
    FrameOrder { previous: i64, frame: i64 },
    #[error("measure has no rows")]
    Empty,
    #[error("row {row}: column {column} expected {expected}")]
    InvalidCell {
        row: usize,
        column: String,
        expected: &'static str,
    },
}

/// Ways a single activation column can break the on/off protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedEncoding {
    /// A note-off arrived with no run pending.
    OrphanNoteOff { frame: u32 },
    /// A note-on arrived while a run was still pending.
    RetriggeredRun { start_frame: u32, frame: u32 },
    /// A run was still pending when the measure ended.
    UnterminatedRun { start_frame: u32, kept: bool },
}

impl fmt::Display for MalformedEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanNoteOff { frame } => {
                write!(f, "note-off at frame {frame} without a note-on")
            }
            Self::RetriggeredRun { start_frame, frame } => write!(
                f,
                "note-on at frame {frame} while the run from frame {start_frame} was open"
            ),
            Self::UnterminatedRun { start_frame, kept: true } => write!(
                f,
                "run from frame {start_frame} not closed, truncated at the measure end"
            ),
            Self::UnterminatedRun { start_frame, kept: false } => {
                write!(f, "run from frame {start_frame} not closed, dropped")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    MalformedEncoding(MalformedEncoding),
    /// Neither program nor name matched; the default instrument was used.
    UnresolvedInstrument { program: Option<i64>, name: String },
    EmptyInstrument,
    PitchOutOfRange,
    MeasureSkipped(MeasureError),
    /// A row that could not be placed in any measure.
    RowSkipped(MeasureError),
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEncoding(issue) => write!(f, "{issue}"),
            Self::UnresolvedInstrument { program, name } => write!(
                f,
                "no instrument for program {program:?} or name {name:?}, using the default"
            ),
            Self::EmptyInstrument => write!(f, "instrument has no measures"),
            Self::PitchOutOfRange => write!(f, "pitch lies outside the configured keyboard"),
            Self::MeasureSkipped(err) => write!(f, "measure skipped: {err}"),
            Self::RowSkipped(err) => write!(f, "row skipped: {err}"),
        }
    }
}

/// A recoverable problem, located as precisely as the decoder knows.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub instrument: String,
    pub measure: Option<u32>,
    pub pitch: Option<String>,
    pub kind: WarningKind,
}

impl Warning {
    pub fn new(instrument: &str, kind: WarningKind) -> Self {
        Self {
            instrument: instrument.to_string(),
            measure: None,
            pitch: None,
            kind,
        }
    }

    pub fn in_measure(mut self, measure: u32) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn at_pitch(mut self, pitch: &str) -> Self {
        self.pitch = Some(pitch.to_string());
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instrument.is_empty() {
            write!(f, "table")?;
        } else {
            write!(f, "{}", self.instrument)?;
        }
        if let Some(measure) = self.measure {
            write!(f, " m.{measure}")?;
        }
        if let Some(pitch) = &self.pitch {
            write!(f, " {pitch}")?;
        }
        write!(f, ": {}", self.kind)
    }
}
