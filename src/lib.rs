pub mod config;
pub mod constants;
pub mod error;
pub mod table {
    pub mod blocks;
    pub mod cell;
}
pub mod notation {
    pub mod instrument;
    pub mod key;
    pub mod meter;
    pub mod midi;
    pub mod pitch;
    pub mod stream;
}
pub mod decoding {
    pub mod frames;
    pub mod helpers;
    pub mod instrument;
    pub mod measure;
    pub mod score;
    pub mod transpose;
}

pub use config::{Config, OffsetMode, PendingRunPolicy};
pub use decoding::score::{decode, decode_table, Decoded};
pub use error::{DecodeError, MeasureError, Warning, WarningKind};
pub use table::blocks::{EncodedTable, RawTable};
