use ndarray::ArrayView1;

use crate::config::PendingRunPolicy;
use crate::error::MalformedEncoding;
use crate::table::cell::Activation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEventFrame {
    pub pitch: String,
    /// Measure-relative frame of the onset.
    pub start_frame: u32,
    pub frame_count: u32,
}

/// Note events of one pitch column plus whatever broke the on/off protocol on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedColumn {
    pub notes: Vec<NoteEventFrame>,
    pub issues: Vec<MalformedEncoding>,
}

impl DecodedColumn {
    fn emit(&mut self, pitch: &str, run: &[u32]) {
        if let Some(&start_frame) = run.first() {
            self.notes.push(NoteEventFrame {
                pitch: pitch.to_string(),
                start_frame,
                frame_count: run.len() as u32,
            });
        }
    }
}

/// Decode one pitch column of one measure into note events.
///
/// # Arguments
///
/// * `pitch` - Label of the pitch column.
/// * `column` - Activation of this pitch at every row of the measure.
/// * `frames` - Measure-relative frame index of every row, increasing.
/// * `pending_run` - What to do with a run still open at the end of the measure.
///
/// # Returns
///
/// * The note events in onset order, and the protocol violations found.
pub fn decode_column(
    pitch: &str,
    column: ArrayView1<'_, Activation>,
    frames: &[u32],
    pending_run: PendingRunPolicy,
) -> DecodedColumn {
    let mut decoded = DecodedColumn::default();
    let mut run: Vec<u32> = Vec::new();

    for (&activation, &frame) in column.iter().zip(frames.iter()) {
        match activation {
            // silence does not close a run, only a note-off does
            Activation::Silent => {}
            Activation::Sustain => run.push(frame),
            Activation::Transition { onset: true } => {
                if let Some(&start_frame) = run.first() {
                    decoded.issues.push(MalformedEncoding::RetriggeredRun { start_frame, frame });
                    decoded.emit(pitch, &run);
                    run.clear();
                }
                run.push(frame);
            }
            Activation::Transition { onset: false } => {
                if run.is_empty() {
                    decoded.issues.push(MalformedEncoding::OrphanNoteOff { frame });
                } else {
                    decoded.emit(pitch, &run);
                    run.clear();
                }
            }
        }
    }

    if let Some(&start_frame) = run.first() {
        let kept = pending_run == PendingRunPolicy::Truncate;
        decoded.issues.push(MalformedEncoding::UnterminatedRun { start_frame, kept });
        if kept {
            decoded.emit(pitch, &run);
        }
    }

    decoded
}
