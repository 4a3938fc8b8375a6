use std::path::Path;

use log::info;

use crate::config::Config;
use crate::decoding::instrument::decode_instrument;
use crate::error::{DecodeError, Warning};
use crate::notation::midi::write_midi;
use crate::notation::stream::Score;
use crate::table::blocks::{EncodedTable, RawTable};

/// Result of decoding a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub score: Score,
    pub warnings: Vec<Warning>,
}

/// Builds the score from an already validated table.
///
/// Every instrument partition becomes one part. Each part is inserted at the front
/// of the score, so the part of the first-seen instrument ends up last, and voices
/// are reconciled after every insertion.
///
/// # Arguments
///
/// * `table` - The partitioned table.
/// * `config` - Decoding configuration.
/// * `save_as` - If given, the finished score is written there as a MIDI file.
///
/// # Returns
///
/// * The score with every warning raised on the way.
pub fn decode_table(
    table: &EncodedTable,
    config: &Config,
    save_as: Option<&Path>,
) -> Result<Decoded, DecodeError> {
    config.validate()?;

    let mut score = Score::new();
    let mut warnings = table.warnings.clone();
    let mut voices = 0;
    for blocks in &table.instruments {
        let decoded = decode_instrument(blocks, config, None)?;
        warnings.extend(decoded.warnings);
        score.insert_part_first(decoded.part);
        voices = voices.max(score.make_voices());
    }

    info!(
        "decoded {} parts, {} voices, {} warnings",
        score.parts.len(),
        voices,
        warnings.len()
    );

    if let Some(path) = save_as {
        write_midi(&score, path)?;
    }

    Ok(Decoded { score, warnings })
}

/// Validates a raw table and decodes it.
pub fn decode(
    raw: &RawTable,
    config: &Config,
    save_as: Option<&Path>,
) -> Result<Decoded, DecodeError> {
    config.validate()?;
    let table = EncodedTable::from_raw(raw)?;
    decode_table(&table, config, save_as)
}
