//! # Histogram Text Format
//!
//! One data line per cell, `E j value`, whitespace separated. `j` is the
//! genus column, not the vertex count. Rows are separated by blank lines and
//! `#` lines carry metadata (see [`Metadata`]).
//!
//! ```text
//! # qcoord = 4
//! 0 0 0
//! 0 1 -1
//! 0 2 -1
//!
//! 1 0 1.0986122886681098
//! ...
//! ```
//!
//! When writing, each row may end with an extra `E cols -1` cell so that 2D
//! plotting tools using corner colouring draw the last real column. The extra
//! column is skipped when the last real column already holds only `-1`.
//!
//! When reading, the grid extent is the largest `(E, j)` seen and every cell
//! not listed reads as `0`. The histogram records which cells were listed.

use std::io::{BufRead, Write};

use crate::formats::Metadata;
use crate::{GridIndex, GtsaError, Histogram, primitives};

/// Write a histogram, optionally padding each row with a sentinel cell.
pub fn write_histogram<W: Write>(
    histogram: &Histogram,
    writer: &mut W,
    pad_rows: bool,
) -> Result<(), GtsaError> {
    let pad_rows = pad_rows && !histogram.last_column_unobserved();
    let cols = histogram.cols();
    for (i, row) in histogram.cells().rows().into_iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            writeln!(writer, "{} {} {}", i, j, value)?;
        }
        if pad_rows {
            writeln!(writer, "{} {} {}", i, cols, primitives::UNOBSERVED)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Serialize a histogram to a string (rows padded for plotting).
pub fn histogram_to_string(histogram: &Histogram) -> Result<String, GtsaError> {
    let mut out = Vec::new();
    write_histogram(histogram, &mut out, true)?;
    String::from_utf8(out).map_err(|e| GtsaError::IoError(e.to_string()))
}

/// Read a histogram and the metadata tags of the same stream in one pass.
pub fn read_histogram_with_metadata<R: BufRead>(
    reader: R,
) -> Result<(Histogram, Metadata), GtsaError> {
    let mut meta = Metadata::new();
    let mut entries = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || meta.absorb_line(&line) {
            continue;
        }
        entries.push(parse_cell(&line, n + 1)?);
    }

    let rows = entries
        .iter()
        .map(|(idx, _)| idx.edges + 1)
        .max()
        .ok_or(GtsaError::EmptyHistogram)?;
    let cols = entries
        .iter()
        .map(|(idx, _)| idx.genus + 1)
        .max()
        .ok_or(GtsaError::EmptyHistogram)?;

    Ok((Histogram::from_listed(rows, cols, &entries), meta))
}

/// Read a histogram, ignoring metadata.
pub fn read_histogram<R: BufRead>(reader: R) -> Result<Histogram, GtsaError> {
    read_histogram_with_metadata(reader).map(|(h, _)| h)
}

/// Parse a histogram from an in-memory document.
pub fn parse_histogram(text: &str) -> Result<Histogram, GtsaError> {
    read_histogram(text.as_bytes())
}

fn parse_cell(line: &str, number: usize) -> Result<(GridIndex, f64), GtsaError> {
    let malformed = |reason: String| GtsaError::MalformedLine {
        line: number,
        reason,
    };
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(malformed(format!(
            "expected 'E j value', found {} token(s)",
            tokens.len()
        )));
    }
    let edges = parse_coordinate(tokens[0]).ok_or_else(|| {
        malformed(format!("edge count '{}' is not a non-negative integer", tokens[0]))
    })?;
    let genus = parse_coordinate(tokens[1]).ok_or_else(|| {
        malformed(format!("genus '{}' is not a non-negative integer", tokens[1]))
    })?;
    let value = tokens[2]
        .parse::<f64>()
        .map_err(|_| malformed(format!("value '{}' is not a number", tokens[2])))?;
    Ok((GridIndex::new(edges, genus), value))
}

/// Coordinates may be written as `3` or `3.0`; anything fractional or
/// negative is rejected.
fn parse_coordinate(token: &str) -> Option<usize> {
    if let Ok(n) = token.parse::<usize>() {
        return Some(n);
    }
    let x = token.parse::<f64>().ok()?;
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 {
        Some(x as usize)
    } else {
        None
    }
}
