#[rustfmt::skip]
const GM_NAMES: [&str; 128] = [
    "Acoustic Grand Piano", "Bright Acoustic Piano", "Electric Grand Piano", "Honky-tonk Piano",
    "Electric Piano 1", "Electric Piano 2", "Harpsichord", "Clavinet",
    "Celesta", "Glockenspiel", "Music Box", "Vibraphone",
    "Marimba", "Xylophone", "Tubular Bells", "Dulcimer",
    "Drawbar Organ", "Percussive Organ", "Rock Organ", "Church Organ",
    "Reed Organ", "Accordion", "Harmonica", "Tango Accordion",
    "Acoustic Guitar (nylon)", "Acoustic Guitar (steel)",
    "Electric Guitar (jazz)", "Electric Guitar (clean)",
    "Electric Guitar (muted)", "Overdriven Guitar", "Distortion Guitar", "Guitar Harmonics",
    "Acoustic Bass", "Electric Bass (finger)", "Electric Bass (pick)", "Fretless Bass",
    "Slap Bass 1", "Slap Bass 2", "Synth Bass 1", "Synth Bass 2",
    "Violin", "Viola", "Cello", "Contrabass",
    "Tremolo Strings", "Pizzicato Strings", "Orchestral Harp", "Timpani",
    "String Ensemble 1", "String Ensemble 2", "Synth Strings 1", "Synth Strings 2",
    "Choir Aahs", "Voice Oohs", "Synth Voice", "Orchestra Hit",
    "Trumpet", "Trombone", "Tuba", "Muted Trumpet",
    "French Horn", "Brass Section", "Synth Brass 1", "Synth Brass 2",
    "Soprano Sax", "Alto Sax", "Tenor Sax", "Baritone Sax",
    "Oboe", "English Horn", "Bassoon", "Clarinet",
    "Piccolo", "Flute", "Recorder", "Pan Flute",
    "Blown Bottle", "Shakuhachi", "Whistle", "Ocarina",
    "Lead 1 (square)", "Lead 2 (sawtooth)", "Lead 3 (calliope)", "Lead 4 (chiff)",
    "Lead 5 (charang)", "Lead 6 (voice)", "Lead 7 (fifths)", "Lead 8 (bass + lead)",
    "Pad 1 (new age)", "Pad 2 (warm)", "Pad 3 (polysynth)", "Pad 4 (choir)",
    "Pad 5 (bowed)", "Pad 6 (metallic)", "Pad 7 (halo)", "Pad 8 (sweep)",
    "FX 1 (rain)", "FX 2 (soundtrack)", "FX 3 (crystal)", "FX 4 (atmosphere)",
    "FX 5 (brightness)", "FX 6 (goblins)", "FX 7 (echoes)", "FX 8 (sci-fi)",
    "Sitar", "Banjo", "Shamisen", "Koto",
    "Kalimba", "Bagpipe", "Fiddle", "Shanai",
    "Tinkle Bell", "Agogo", "Steel Drums", "Woodblock",
    "Taiko Drum", "Melodic Tom", "Synth Drum", "Reverse Cymbal",
    "Guitar Fret Noise", "Breath Noise", "Seashore", "Bird Tweet",
    "Telephone Ring", "Helicopter", "Applause", "Gunshot",
];

/// Common short names that do not appear verbatim in the General MIDI list.
const ALIASES: [(&str, u8); 14] = [
    ("piano", 0),
    ("acousticpiano", 0),
    ("grandpiano", 0),
    ("electricpiano", 4),
    ("organ", 19),
    ("pipeorgan", 19),
    ("guitar", 24),
    ("acousticguitar", 24),
    ("electricguitar", 27),
    ("bass", 32),
    ("electricbass", 33),
    ("harp", 46),
    ("horn", 60),
    ("saxophone", 65),
];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A General MIDI melodic instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GmInstrument {
    pub program: u8,
}

impl Default for GmInstrument {
    fn default() -> Self {
        Self { program: 0 }
    }
}

impl GmInstrument {
    pub fn from_program(program: i64) -> Option<Self> {
        u8::try_from(program)
            .ok()
            .filter(|&program| program < 128)
            .map(|program| Self { program })
    }

    /// Looks an instrument up by name: exact General MIDI name first, then common
    /// aliases, then the first General MIDI name containing the query.
    pub fn from_name(name: &str) -> Option<Self> {
        let query = normalize(name);
        if query.is_empty() {
            return None;
        }
        let names = || GM_NAMES.iter().map(|gm| normalize(gm)).enumerate();
        names()
            .find(|(_, gm)| *gm == query)
            .map(|(program, _)| program as u8)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == query)
                    .map(|&(_, program)| program)
            })
            .or_else(|| {
                names()
                    .find(|(_, gm)| gm.contains(&query))
                    .map(|(program, _)| program as u8)
            })
            .map(|program| Self { program })
    }

    pub fn name(&self) -> &'static str {
        GM_NAMES[usize::from(self.program & 0x7F)]
    }
}
