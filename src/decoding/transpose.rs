use crate::error::MeasureError;
use crate::notation::key::{Key, Mode};
use crate::notation::pitch::{Interval, Pitch, IMPLICIT_OCTAVE};

/// Tonic the analysis key is normalized to for a given mode: C major or A minor.
fn reference_tonic(mode: &Mode) -> Result<Pitch, MeasureError> {
    let step = match mode {
        Mode::Major => 'C',
        Mode::Minor => 'A',
        Mode::Other(word) => return Err(MeasureError::UnsupportedMode(word.clone())),
    };
    Pitch::new(step, 0, IMPLICIT_OCTAVE).ok_or_else(|| MeasureError::InvalidPitch(step.to_string()))
}

/// Interval that takes music written in the normalized key (C major or A minor)
/// back to `key`.
///
/// # Arguments
///
/// * `key` - The key the measure was originally in, if known.
///
/// # Returns
///
/// * `None` when no transposition is needed, the interval otherwise, or an error
///   for modes other than major and minor.
pub fn transpose_interval(key: Option<&Key>) -> Result<Option<Interval>, MeasureError> {
    let Some(key) = key else {
        return Ok(None);
    };
    let reference = reference_tonic(&key.mode)?;
    if reference.step() == key.tonic.step() && key.tonic.alter() == 0 {
        return Ok(None);
    }
    let tonic = Pitch::new(key.tonic.step(), key.tonic.alter(), IMPLICIT_OCTAVE)
        .ok_or_else(|| MeasureError::InvalidKey(key.to_string()))?;
    Ok(Some(Interval::between(&reference, &tonic)))
}
