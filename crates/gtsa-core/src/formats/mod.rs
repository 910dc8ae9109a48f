//! # Formats
//!
//! Text serialization of histograms and their metadata tags.
//!
//! Pure transformations over `BufRead` / `Write` streams. Opening files is
//! left to the app layer.

mod metadata;
mod text;

pub use metadata::Metadata;
pub use text::{
    histogram_to_string, parse_histogram, read_histogram, read_histogram_with_metadata,
    write_histogram,
};
