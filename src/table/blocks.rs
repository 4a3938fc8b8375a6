use std::collections::{BTreeMap, HashMap};

use log::debug;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::constants::{
    BEAT, ENVIRONMENT_COLUMNS, FRAME, IDENTITY_COLUMNS, INSTRUMENT, KS, MEASURE, METRIC_COLUMNS,
    MIDI_PROGRAM, NAME, TEMPO, TS,
};
use crate::decoding::helpers::report;
use crate::error::{DecodeError, MeasureError, Warning, WarningKind};
use crate::notation::pitch::Pitch;
use crate::table::cell::{Activation, Cell};

/// The encoded table as loaded: column labels plus loosely typed rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn from_json_str(source: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(source)?)
    }
}

/// Identity of one instrument partition.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentInfo {
    /// Value of the `INSTRUMENT` column, the partition key.
    pub instrument: String,
    pub name: String,
    pub midi_program: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRow {
    pub measure: u32,
    pub beat: f64,
    pub frame: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentRow {
    pub key: Option<String>,
    pub time_signature: String,
    pub tempo: Option<f64>,
}

/// Activation matrix, one row per frame and one column per pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceBlock {
    pub pitches: Vec<String>,
    pub activations: Array2<Activation>,
}

/// Rows of one measure of one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureBlocks {
    pub number: u32,
    pub metric: Vec<MetricRow>,
    pub environment: Vec<EnvironmentRow>,
    pub performance: Array2<Activation>,
}

/// Every row of one instrument, split into typed blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentBlocks {
    pub info: InstrumentInfo,
    pub metric: Vec<MetricRow>,
    pub environment: Vec<EnvironmentRow>,
    pub performance: PerformanceBlock,
    /// Measures holding a row that failed validation, with the first failure found.
    pub invalid: BTreeMap<u32, MeasureError>,
}

impl InstrumentBlocks {
    /// Highest measure number present, valid or not. `None` without rows.
    pub fn measure_count(&self) -> Option<u32> {
        self.metric
            .iter()
            .map(|row| row.measure)
            .chain(self.invalid.keys().copied())
            .max()
    }

    /// Slices the rows belonging to one measure. `None` when the measure has no rows.
    pub fn measure(&self, number: u32) -> Option<MeasureBlocks> {
        let indices: Vec<usize> = self
            .metric
            .iter()
            .enumerate()
            .filter(|(_, row)| row.measure == number)
            .map(|(index, _)| index)
            .collect();
        if indices.is_empty() {
            return None;
        }

        Some(MeasureBlocks {
            number,
            metric: indices.iter().map(|&i| self.metric[i]).collect(),
            environment: indices.iter().map(|&i| self.environment[i].clone()).collect(),
            performance: self.performance.activations.select(Axis(0), &indices),
        })
    }
}

/// The validated table, partitioned by instrument in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    pub instruments: Vec<InstrumentBlocks>,
    /// Rows that could not be assigned to a measure.
    pub warnings: Vec<Warning>,
}

struct Columns {
    instrument: usize,
    name: usize,
    midi_program: usize,
    measure: usize,
    beat: usize,
    frame: usize,
    key: usize,
    time_signature: usize,
    tempo: usize,
    /// (label, index) of every remaining column.
    pitches: Vec<(String, usize)>,
}

impl Columns {
    fn locate(labels: &[String]) -> Result<Self, DecodeError> {
        let find = |column: &str| {
            labels
                .iter()
                .position(|label| label == column)
                .ok_or_else(|| DecodeError::MissingColumn(column.to_string()))
        };
        let reserved: Vec<&str> = IDENTITY_COLUMNS
            .iter()
            .chain(METRIC_COLUMNS.iter())
            .chain(ENVIRONMENT_COLUMNS.iter())
            .copied()
            .collect();

        let pitches: Vec<(String, usize)> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| !reserved.contains(&label.as_str()))
            .map(|(index, label)| (label.clone(), index))
            .collect();
        let not_a_pitch = pitches.iter().find(|(label, _)| Pitch::parse_name(label).is_err());
        if let Some((label, _)) = not_a_pitch {
            return Err(DecodeError::InvalidPitchColumn(label.clone()));
        }

        Ok(Self {
            instrument: find(INSTRUMENT)?,
            name: find(NAME)?,
            midi_program: find(MIDI_PROGRAM)?,
            measure: find(MEASURE)?,
            beat: find(BEAT)?,
            frame: find(FRAME)?,
            key: find(KS)?,
            time_signature: find(TS)?,
            tempo: find(TEMPO)?,
            pitches,
        })
    }
}

struct TypedRow {
    metric: MetricRow,
    environment: EnvironmentRow,
    activations: Vec<Activation>,
}

/// Rows of one instrument while the table is being read.
struct Partition {
    info: InstrumentInfo,
    rows: Vec<TypedRow>,
    invalid: BTreeMap<u32, MeasureError>,
}

impl Partition {
    fn new(info: InstrumentInfo) -> Self {
        Self {
            info,
            rows: Vec::new(),
            invalid: BTreeMap::new(),
        }
    }

    fn into_blocks(self, pitches: &[String]) -> InstrumentBlocks {
        let rows = self.rows;
        let activations =
            Array2::from_shape_fn((rows.len(), pitches.len()), |(r, c)| rows[r].activations[c]);
        debug!(
            "partition {} has {} rows, {} invalid measures",
            self.info.instrument,
            rows.len(),
            self.invalid.len()
        );
        InstrumentBlocks {
            info: self.info,
            metric: rows.iter().map(|row| row.metric).collect(),
            environment: rows.iter().map(|row| row.environment.clone()).collect(),
            performance: PerformanceBlock {
                pitches: pitches.to_vec(),
                activations,
            },
            invalid: self.invalid,
        }
    }
}

fn invalid_cell(
    row: usize,
    labels: &[String],
    column: usize,
    expected: &'static str,
) -> MeasureError {
    MeasureError::InvalidCell {
        row,
        column: labels[column].clone(),
        expected,
    }
}

fn row_measure(
    index: usize,
    row: &[Cell],
    columns: &Columns,
    labels: &[String],
) -> Result<u32, MeasureError> {
    let expected = "a measure number starting at 1";
    row[columns.measure]
        .as_i64()
        .and_then(|measure| u32::try_from(measure).ok())
        .filter(|&measure| measure >= 1)
        .ok_or_else(|| invalid_cell(index, labels, columns.measure, expected))
}

fn typed_row(
    index: usize,
    row: &[Cell],
    measure: u32,
    columns: &Columns,
    labels: &[String],
) -> Result<TypedRow, MeasureError> {
    let invalid =
        |column: usize, expected: &'static str| invalid_cell(index, labels, column, expected);

    let beat = match &row[columns.beat] {
        Cell::Null => 0.0,
        cell => cell.as_f64().ok_or_else(|| invalid(columns.beat, "a beat number"))?,
    };
    let frame = row[columns.frame]
        .as_i64()
        .ok_or_else(|| invalid(columns.frame, "an integer frame"))?;

    let key = row[columns.key].as_text().filter(|key| !key.trim().is_empty());
    let time_signature = row[columns.time_signature]
        .as_text()
        .ok_or_else(|| invalid(columns.time_signature, "a time signature label"))?;
    let tempo = match &row[columns.tempo] {
        Cell::Null => None,
        cell => Some(cell.as_f64().ok_or_else(|| invalid(columns.tempo, "a tempo in BPM"))?),
    };

    let activations = columns
        .pitches
        .iter()
        .map(|&(_, column)| {
            Activation::from_cell(&row[column])
                .ok_or_else(|| invalid(column, "an activation marker"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TypedRow {
        metric: MetricRow { measure, beat, frame },
        environment: EnvironmentRow {
            key,
            time_signature,
            tempo,
        },
        activations,
    })
}

impl EncodedTable {
    /// Validates a raw table once and splits it into typed per-instrument blocks.
    ///
    /// A missing column, an unknown non-pitch column or a row of the wrong width
    /// is fatal. A bad cell only costs its row: a row without an instrument key or
    /// measure number is dropped with a warning, and any other bad cell marks its
    /// measure invalid.
    ///
    /// # Arguments
    ///
    /// * `raw` - The table as loaded.
    ///
    /// # Returns
    ///
    /// * The partitioned table, or the first schema violation found.
    pub fn from_raw(raw: &RawTable) -> Result<Self, DecodeError> {
        let columns = Columns::locate(&raw.columns)?;
        let pitches: Vec<String> = columns.pitches.iter().map(|(label, _)| label.clone()).collect();

        let mut order: Vec<String> = Vec::new();
        let mut partitions: HashMap<String, Partition> = HashMap::new();
        let mut warnings = Vec::new();
        for (index, row) in raw.rows.iter().enumerate() {
            if row.len() != raw.columns.len() {
                return Err(DecodeError::RowWidth {
                    row: index,
                    found: row.len(),
                    expected: raw.columns.len(),
                });
            }

            let Some(instrument) = row[columns.instrument].as_text() else {
                let error =
                    invalid_cell(index, &raw.columns, columns.instrument, "an instrument key");
                report(&mut warnings, Warning::new("", WarningKind::RowSkipped(error)));
                continue;
            };
            let partition = partitions.entry(instrument.clone()).or_insert_with(|| {
                order.push(instrument.clone());
                Partition::new(InstrumentInfo {
                    instrument: instrument.clone(),
                    name: row[columns.name].as_text().unwrap_or_default(),
                    midi_program: row[columns.midi_program].as_i64(),
                })
            });

            let measure = match row_measure(index, row, &columns, &raw.columns) {
                Ok(measure) => measure,
                Err(error) => {
                    let warning = Warning::new(&instrument, WarningKind::RowSkipped(error));
                    report(&mut warnings, warning);
                    continue;
                }
            };
            match typed_row(index, row, measure, &columns, &raw.columns) {
                Ok(typed) => partition.rows.push(typed),
                Err(error) => {
                    partition.invalid.entry(measure).or_insert(error);
                }
            }
        }

        let instruments = order
            .into_iter()
            .filter_map(|instrument| partitions.remove(&instrument))
            .map(|partition| partition.into_blocks(&pitches))
            .collect();

        Ok(Self { instruments, warnings })
    }
}
