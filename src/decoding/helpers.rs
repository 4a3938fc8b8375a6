use log::warn;

use crate::error::Warning;

/// Logs a warning and keeps it for the caller's report.
pub fn report(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!("{warning}");
    warnings.push(warning);
}

/// Returns the most frequent value. Ties go to the value seen first.
///
/// # Arguments
///
/// * `values` - Values to aggregate.
///
/// # Returns
///
/// * The mode, or `None` if there are no values.
pub fn mode<T: PartialEq + Clone>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(T, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}
