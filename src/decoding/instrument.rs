use std::path::Path;

use log::info;

use crate::config::Config;
use crate::decoding::helpers::report;
use crate::decoding::measure::decode_measure;
use crate::error::{DecodeError, Warning, WarningKind};
use crate::notation::instrument::GmInstrument;
use crate::notation::midi::write_midi;
use crate::notation::pitch::Pitch;
use crate::notation::stream::{Part, Score};
use crate::table::blocks::{InstrumentBlocks, InstrumentInfo};
use crate::table::cell::Activation;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPart {
    pub part: Part,
    pub warnings: Vec<Warning>,
}

/// Playback instrument for a partition: by MIDI program, then by the instrument
/// label, then by the part name, then the default.
pub fn resolve_instrument(info: &InstrumentInfo, warnings: &mut Vec<Warning>) -> GmInstrument {
    let resolved = info
        .midi_program
        .and_then(GmInstrument::from_program)
        .or_else(|| GmInstrument::from_name(&info.instrument))
        .or_else(|| GmInstrument::from_name(&info.name));

    resolved.unwrap_or_else(|| {
        report(
            warnings,
            Warning::new(
                &info.instrument,
                WarningKind::UnresolvedInstrument {
                    program: info.midi_program,
                    name: info.name.clone(),
                },
            ),
        );
        GmInstrument::default()
    })
}

/// Warns once for every sounding pitch column that is not on the configured keyboard.
fn check_keyboard_range(blocks: &InstrumentBlocks, config: &Config, warnings: &mut Vec<Warning>) {
    let performance = &blocks.performance;
    for (column, label) in performance.pitches.iter().enumerate() {
        let sounding = performance
            .activations
            .column(column)
            .iter()
            .any(|&activation| activation != Activation::Silent);
        let on_keyboard =
            Pitch::parse_name(label).map_or(true, |pitch| config.on_keyboard(pitch.midi()));
        if sounding && !on_keyboard {
            report(
                warnings,
                Warning::new(&blocks.info.instrument, WarningKind::PitchOutOfRange).at_pitch(label),
            );
        }
    }
}

/// Decode every measure of one instrument into a part.
///
/// # Arguments
///
/// * `blocks` - All rows of the instrument, split into typed blocks.
/// * `config` - Decoding configuration.
/// * `save_as` - If given, the part alone is also written there as a MIDI file.
///
/// # Returns
///
/// * The part and the warnings collected while building it.
pub fn decode_instrument(
    blocks: &InstrumentBlocks,
    config: &Config,
    save_as: Option<&Path>,
) -> Result<DecodedPart, DecodeError> {
    let info = &blocks.info;
    let mut warnings = Vec::new();

    let instrument = resolve_instrument(info, &mut warnings);
    let part_name = if info.name.is_empty() { &info.instrument } else { &info.name };
    info!(
        "part {part_name:?}: instrument {:?}, program {:?} -> {}",
        info.instrument,
        info.midi_program,
        instrument.name()
    );
    let mut part = Part::new(part_name, instrument);

    check_keyboard_range(blocks, config, &mut warnings);

    match blocks.measure_count() {
        None => report(
            &mut warnings,
            Warning::new(&info.instrument, WarningKind::EmptyInstrument),
        ),
        Some(measure_count) => {
            let pitches = &blocks.performance.pitches;
            for number in 1..=measure_count {
                let decoded = match (blocks.invalid.get(&number), blocks.measure(number)) {
                    (Some(err), _) => Err(err.clone()),
                    (None, Some(measure_blocks)) => {
                        decode_measure(&info.instrument, &measure_blocks, pitches, config)
                    }
                    (None, None) => continue,
                };
                match decoded {
                    Ok(decoded) => {
                        warnings.extend(decoded.warnings);
                        part.insert_measure(decoded.measure);
                    }
                    Err(err) => report(
                        &mut warnings,
                        Warning::new(&info.instrument, WarningKind::MeasureSkipped(err))
                            .in_measure(number),
                    ),
                }
            }
        }
    }

    part.make_notation();

    if let Some(path) = save_as {
        write_midi(&Score { parts: vec![part.clone()] }, path)?;
    }

    Ok(DecodedPart { part, warnings })
}
