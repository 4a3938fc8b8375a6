use log::debug;
use num_rational::Ratio;

use crate::config::{Config, OffsetMode};
use crate::decoding::frames::decode_column;
use crate::decoding::helpers::{mode, report};
use crate::decoding::transpose::transpose_interval;
use crate::error::{MeasureError, Warning, WarningKind};
use crate::notation::key::Key;
use crate::notation::meter::{MetronomeMark, QuarterLength, TimeSignature};
use crate::notation::pitch::{Interval, Pitch};
use crate::notation::stream::Measure;
use crate::table::blocks::MeasureBlocks;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMeasure {
    pub measure: Measure,
    /// Interval applied to bring the notes back to the measure's key.
    pub transposition: Option<Interval>,
    pub warnings: Vec<Warning>,
}

/// Beat offset of a note starting at a measure-relative frame.
///
/// # Arguments
///
/// * `start_frame` - Measure-relative frame of the onset.
/// * `config` - Supplies the resolution and the offset mode.
/// * `time_signature` - Offsets wrap at its numerator.
///
/// # Returns
///
/// * The offset in quarter lengths.
pub fn beat_offset(
    start_frame: u32,
    config: &Config,
    time_signature: &TimeSignature,
) -> QuarterLength {
    let numerator = time_signature.numerator;
    match config.offset_mode {
        OffsetMode::Scaled => {
            let scaled = u64::from(start_frame) * u64::from(config.resolution);
            Ratio::from_integer((scaled % u64::from(numerator)) as u32)
        }
        OffsetMode::Divided => {
            Ratio::new(start_frame, config.resolution) % Ratio::from_integer(numerator)
        }
    }
}

/// Length in quarter notes of a note spanning `frame_count` frames.
pub fn note_duration(frame_count: u32, config: &Config) -> QuarterLength {
    Ratio::new(frame_count, config.resolution)
}

/// Frame of every row counted from the first row of the measure.
fn relative_frames(blocks: &MeasureBlocks) -> Result<Vec<u32>, MeasureError> {
    let first = blocks.metric.first().ok_or(MeasureError::Empty)?.frame;
    let mut previous: Option<i64> = None;
    blocks
        .metric
        .iter()
        .map(|row| {
            if let Some(previous) = previous.filter(|&previous| row.frame <= previous) {
                return Err(MeasureError::FrameOrder {
                    previous,
                    frame: row.frame,
                });
            }
            previous = Some(row.frame);
            u32::try_from(row.frame - first).map_err(|_| MeasureError::FrameOrder {
                previous: first,
                frame: row.frame,
            })
        })
        .collect()
}

/// Reconstructs one measure of one instrument.
///
/// Key, time signature and tempo are the most frequent values among the measure's
/// rows. Every pitch column is decoded into notes, placed at their beat offsets,
/// moved back from the normalized key and padded with leading and trailing rests.
///
/// # Arguments
///
/// * `instrument` - Partition key, used to locate warnings.
/// * `blocks` - The measure's metric, environment and performance rows.
/// * `pitches` - Label of every performance column.
/// * `config` - Decoding configuration.
///
/// # Returns
///
/// * The decoded measure with its warnings, or why the measure could not be decoded.
pub fn decode_measure(
    instrument: &str,
    blocks: &MeasureBlocks,
    pitches: &[String],
    config: &Config,
) -> Result<DecodedMeasure, MeasureError> {
    let frames = relative_frames(blocks)?;

    let key = mode(blocks.environment.iter().map(|row| row.key.clone()))
        .flatten()
        .map(|label| Key::parse(&label))
        .transpose()?;
    let time_signature = mode(blocks.environment.iter().map(|row| row.time_signature.clone()))
        .map(|label| TimeSignature::parse(&label))
        .transpose()?
        .unwrap_or_default();
    let tempo = mode(blocks.environment.iter().filter_map(|row| row.tempo)).map(MetronomeMark::new);

    let transposition = transpose_interval(key.as_ref())?;

    let mut measure = Measure::new(blocks.number);
    measure.key = key;
    measure.time_signature = time_signature;
    measure.tempo = tempo;

    let mut warnings = Vec::new();
    for (column, label) in pitches.iter().enumerate() {
        let activations = blocks.performance.column(column);
        let decoded = decode_column(label, activations, &frames, config.pending_run);

        for issue in decoded.issues {
            report(
                &mut warnings,
                Warning::new(instrument, WarningKind::MalformedEncoding(issue))
                    .in_measure(blocks.number)
                    .at_pitch(label),
            );
        }

        if decoded.notes.is_empty() {
            continue;
        }
        let pitch = Pitch::parse_name(label)?;
        for note in decoded.notes {
            measure.insert_note(
                beat_offset(note.start_frame, config, &time_signature),
                pitch,
                note_duration(note.frame_count, config),
            );
        }
    }

    if let Some(interval) = &transposition {
        measure.transpose(interval);
    }
    if config.quantize {
        measure.quantize();
    }
    measure.make_rests();

    debug!(
        "{instrument} measure {}: {} notes, {} warnings",
        blocks.number,
        measure.notes().count(),
        warnings.len()
    );

    Ok(DecodedMeasure {
        measure,
        transposition,
        warnings,
    })
}
