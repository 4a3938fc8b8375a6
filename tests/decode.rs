use ems_rust::notation::midi::generate_midi_file_data;
use ems_rust::notation::stream::Element;
use ems_rust::{decode, Config, RawTable, WarningKind};
use midly::{MidiMessage, Smf, TrackEventKind};
use num_rational::Ratio;
use serde_json::json;

fn table(rows: serde_json::Value) -> RawTable {
    serde_json::from_value(json!({
        "columns": [
            "INSTRUMENT", "NAME", "MIDI_PROGRAM", "MEASURE", "BEAT", "FRAME", "KS", "TS", "TEMPO",
            "C4", "E4"
        ],
        "rows": rows
    }))
    .unwrap()
}

fn two_measures_of_c4() -> RawTable {
    table(json!([
        ["p1", "Piano", 0, 1, 1.0, 0, "C", "4/4", 120, [true], false],
        ["p1", "Piano", 0, 1, 1.5, 1, "C", "4/4", 120, true, false],
        ["p1", "Piano", 0, 1, 2.0, 2, "C", "4/4", 120, [false], false],
        ["p1", "Piano", 0, 2, 1.0, 3, "C", "4/4", 120, false, false],
        ["p1", "Piano", 0, 2, 1.5, 4, "C", "4/4", 120, false, false]
    ]))
}

#[test]
fn one_note_then_rests() {
    let decoded = decode(&two_measures_of_c4(), &Config::with_resolution(2), None).unwrap();
    assert!(decoded.warnings.is_empty());
    assert_eq!(decoded.score.parts.len(), 1);

    let part = &decoded.score.parts[0];
    assert_eq!(part.name, "Piano");
    assert_eq!(part.measures.len(), 2);

    let first = &part.measures[0];
    let notes: Vec<_> = first.notes().collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].pitch.to_string(), "C4");
    assert_eq!(notes[0].offset, Ratio::from_integer(0));
    assert_eq!(notes[0].duration, Ratio::from_integer(1));
    assert_eq!(
        first.rests().collect::<Vec<_>>(),
        vec![(Ratio::from_integer(1), Ratio::from_integer(3))]
    );

    let second = &part.measures[1];
    assert_eq!(second.notes().count(), 0);
    assert_eq!(
        second.rests().collect::<Vec<_>>(),
        vec![(Ratio::from_integer(0), Ratio::from_integer(4))]
    );
}

#[test]
fn every_instrument_becomes_a_part() {
    let raw = table(json!([
        ["vn", "Violin", 40, 1, 1, 0, "C", "4/4", 90, [true], false],
        ["vc", "Cello", 42, 2, 1, 0, "C", "4/4", 90, false, [true]],
        ["vn", "Violin", 40, 1, 1, 1, "C", "4/4", 90, [false], false],
        ["vn", "Violin", 40, 4, 1, 9, "C", "4/4", 90, false, false],
        ["vc", "Cello", 42, 2, 1, 1, "C", "4/4", 90, false, [false]]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    let parts = &decoded.score.parts;
    assert_eq!(parts.len(), 2);

    // Parts are prepended, the first-seen instrument comes last.
    assert_eq!(parts[0].name, "Cello");
    assert_eq!(parts[1].name, "Violin");
    assert_eq!(parts[1].last_measure_number(), 4);
    assert_eq!(parts[1].measures.iter().map(|m| m.number).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(parts[0].measures.iter().map(|m| m.number).collect::<Vec<_>>(), vec![2]);
    assert_eq!(parts[1].instrument.name(), "Violin");
}

#[test]
fn notes_are_moved_to_the_key_of_the_measure() {
    let raw = table(json!([
        ["p1", "Piano", 0, 1, 1, 0, "G major", "4/4", 120, [true], [true]],
        ["p1", "Piano", 0, 1, 2, 1, "G major", "4/4", 120, [false], [false]]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    let measure = &decoded.score.parts[0].measures[0];
    let pitches: Vec<_> = measure.notes().map(|n| n.pitch.to_string()).collect();
    assert_eq!(pitches, vec!["G4", "B4"]);
    assert_eq!(measure.key.as_ref().map(|k| k.to_string()).as_deref(), Some("G major"));
}

#[test]
fn malformed_columns_are_reported_not_fatal() {
    let raw = table(json!([
        ["p1", "Piano", 0, 1, 1, 0, "C", "4/4", 120, [false], [true]],
        ["p1", "Piano", 0, 1, 2, 1, "C", "4/4", 120, false, true],
        ["p1", "Piano", 0, 2, 1, 2, "C", "4/4", 120, false, false]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    let kinds: Vec<_> = decoded.warnings.iter().map(|w| &w.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.iter().all(|kind| matches!(kind, WarningKind::MalformedEncoding(_))));

    // The open E4 run is cut at the end of measure 1 by default.
    let first = &decoded.score.parts[0].measures[0];
    let e4: Vec<_> = first.notes().filter(|n| n.pitch.to_string() == "E4").collect();
    assert_eq!(e4.len(), 1);
    assert_eq!(e4[0].duration, Ratio::from_integer(2));
}

#[test]
fn skipped_measures_keep_the_rest_of_the_part() {
    let raw = table(json!([
        ["p1", "Piano", 0, 1, 1, 0, "C", "4/4", 120, false, false],
        ["p1", "Piano", 0, 2, 1, 1, "D dorian", "4/4", 120, false, false],
        ["p1", "Piano", 0, 3, 1, 2, "C", "4/4", 120, false, false]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    let numbers: Vec<_> = decoded.score.parts[0].measures.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.warnings[0].measure, Some(2));
}

#[test]
fn midi_output_has_one_track_per_part() {
    let decoded = decode(&two_measures_of_c4(), &Config::with_resolution(2), None).unwrap();
    let bytes = generate_midi_file_data(&decoded.score).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 1);

    let keys: Vec<u8> = smf.tracks[0]
        .iter()
        .filter_map(|event| match event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } => Some(key.as_int()),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec![60]);
}

#[test]
fn rests_fill_the_bar_exactly() {
    let decoded = decode(&two_measures_of_c4(), &Config::with_resolution(2), None).unwrap();
    for measure in &decoded.score.parts[0].measures {
        let total = measure
            .elements
            .iter()
            .filter(|element| matches!(element, Element::Rest { .. }))
            .map(Element::duration)
            .fold(Ratio::from_integer(0), |sum, duration| sum + duration);
        let sounding = measure
            .notes()
            .map(|note| note.duration)
            .fold(Ratio::from_integer(0), |sum, duration| sum + duration);
        assert_eq!(total + sounding, measure.bar_length());
    }
}

#[test]
fn a_bad_cell_costs_only_its_measure() {
    let raw = table(json!([
        ["vn", "Violin", 40, 1, 1, 0, "C", "4/4", 90, [true], false],
        ["vn", "Violin", 40, 1, 2, 1, "C", "4/4", 90, [false], false],
        ["vc", "Cello", 42, 1, 1, 0, "C", "4/4", 90, "loud", false],
        ["vc", "Cello", 42, 2, 1, 1, null, null, 90, false, false],
        ["vc", "Cello", 42, 3, 1, 2, "C", "4/4", 90, false, false]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    let parts = &decoded.score.parts;
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[1].name, "Violin");
    assert_eq!(parts[1].measures[0].notes().count(), 1);

    assert_eq!(parts[0].name, "Cello");
    assert_eq!(parts[0].measures.iter().map(|m| m.number).collect::<Vec<_>>(), vec![3]);
    let skipped: Vec<_> = decoded
        .warnings
        .iter()
        .filter(|w| matches!(w.kind, WarningKind::MeasureSkipped(_)))
        .map(|w| (w.instrument.as_str(), w.measure))
        .collect();
    assert_eq!(skipped, vec![("vc", Some(1)), ("vc", Some(2))]);
}

#[test]
fn rows_without_an_instrument_are_dropped() {
    let raw = table(json!([
        ["p1", "Piano", 0, 1, 1, 0, "C", "4/4", 120, [true], false],
        [null, "Piano", 0, 1, 1, 1, "C", "4/4", 120, true, false],
        ["p1", "Piano", 0, 1, 2, 1, "C", "4/4", 120, [false], false]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    assert_eq!(decoded.score.parts.len(), 1);
    assert_eq!(decoded.score.parts[0].measures[0].notes().count(), 1);
    assert_eq!(decoded.warnings.len(), 1);
    assert!(matches!(decoded.warnings[0].kind, WarningKind::RowSkipped(_)));
}

#[test]
fn oversized_time_signatures_skip_the_measure() {
    let raw = table(json!([
        ["p1", "Piano", 0, 1, 1, 0, "C", "4/4", 120, false, false],
        ["p1", "Piano", 0, 2, 1, 1, "C", "1073741824/4", 120, false, false]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), None).unwrap();
    assert_eq!(decoded.score.parts[0].measures.len(), 1);
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.warnings[0].measure, Some(2));
}

#[test]
fn score_is_written_when_a_path_is_given() {
    let path = std::env::temp_dir().join(format!("ems-rust-score-{}.mid", std::process::id()));
    let raw = table(json!([
        ["vn", "Violin", 40, 1, 1, 0, "C", "4/4", 90, [true], false],
        ["vc", "Cello", 42, 1, 1, 0, "C", "4/4", 90, false, [true]],
        ["vn", "Violin", 40, 1, 2, 1, "C", "4/4", 90, [false], false],
        ["vc", "Cello", 42, 1, 2, 1, "C", "4/4", 90, false, [false]]
    ]));
    let decoded = decode(&raw, &Config::with_resolution(1), Some(&path)).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(bytes, generate_midi_file_data(&decoded.score).unwrap());

    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), decoded.score.parts.len());
    assert_eq!(smf.tracks.len(), 2);
}
