// Encoded table columns
pub const INSTRUMENT: &str = "INSTRUMENT";
pub const NAME: &str = "NAME";
pub const MIDI_PROGRAM: &str = "MIDI_PROGRAM";
pub const MEASURE: &str = "MEASURE";
pub const BEAT: &str = "BEAT";
pub const FRAME: &str = "FRAME";
pub const KS: &str = "KS";
pub const TS: &str = "TS";
pub const TEMPO: &str = "TEMPO";

pub const IDENTITY_COLUMNS: [&str; 3] = [INSTRUMENT, NAME, MIDI_PROGRAM];
pub const METRIC_COLUMNS: [&str; 3] = [MEASURE, BEAT, FRAME];
pub const ENVIRONMENT_COLUMNS: [&str; 3] = [KS, TS, TEMPO];

// Encoding defaults
pub const DEFAULT_RESOLUTION: u32 = 96;
pub const DEFAULT_KEYBOARD_SIZE: u32 = 88;
pub const DEFAULT_KEYBOARD_OFFSET: u32 = 21;

// MIDI Conversion
pub const TICKS_PER_BEAT: u16 = 480;
pub const DEFAULT_VELOCITY: u8 = 90;
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;
