use serde::{Deserialize, Serialize};

/// One value of the raw encoded table, as loose as the producer wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Cell>),
}

impl Cell {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => Some(*value as i64),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text content, with numbers rendered as text so that numeric labels still work.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Truthiness of a scalar marker. `None` for cells that are not scalar markers.
    fn truthy(&self) -> Option<bool> {
        match self {
            Self::Null => Some(false),
            Self::Bool(value) => Some(*value),
            Self::Int(value) => Some(*value != 0),
            Self::Float(value) => Some(*value != 0.0),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "" | "false" | "0" => Some(false),
                "true" | "1" => Some(true),
                _ => None,
            },
            Self::List(_) => None,
        }
    }
}

/// Per-frame state of one pitch, decoded once from its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Silent,
    /// The pitch keeps sounding.
    Sustain,
    /// The pitch starts (`onset`) or stops sounding at this frame.
    Transition { onset: bool },
}

impl Activation {
    /// Decodes a cell: false or empty is silence, any other scalar is a sustain,
    /// and a list `[onset_flag, ...]` is a transition.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::List(items) => {
                let onset = items.first()?.truthy()?;
                Some(Self::Transition { onset })
            }
            scalar => scalar
                .truthy()
                .map(|active| if active { Self::Sustain } else { Self::Silent }),
        }
    }
}
