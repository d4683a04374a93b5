// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CSV export of recorded time series
//!
//! Two table shapes are supported: named columns of equal-indexed values (a recorder's
//! series) and `(time, vm)` sample pairs (a neuron trace). Values are written with `f64`
//! `Display`, so `-65.0` is written as `-65`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::types::{Result, TantrikaError};

/// Outcome of a series export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CsvExport {
    /// Data rows written (header excluded)
    pub rows: usize,
    pub columns: usize,
    /// Some series were longer than the shortest one and were cut
    pub truncated: bool,
}

/// Write named series as a table. The row count is the length of the shortest series.
///
/// An empty column list writes nothing.
pub fn write_series_csv<W: Write>(
    out: &mut W,
    series: &[(&str, &[f64])],
    delimiter: char,
) -> io::Result<CsvExport> {
    if series.is_empty() {
        return Ok(CsvExport::default());
    }

    let rows = series.iter().map(|(_, values)| values.len()).min().unwrap_or(0);
    let truncated = series.iter().any(|(_, values)| values.len() != rows);
    if truncated {
        let longest = series.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
        warn!(
            rows,
            longest, "CSV export: series have different lengths, truncating to the shortest"
        );
    }

    let mut sep = [0u8; 4];
    let sep = delimiter.encode_utf8(&mut sep).as_bytes();

    for (i, (name, _)) in series.iter().enumerate() {
        if i > 0 {
            out.write_all(sep)?;
        }
        out.write_all(name.as_bytes())?;
    }
    out.write_all(b"\n")?;

    for row in 0..rows {
        for (i, (_, values)) in series.iter().enumerate() {
            if i > 0 {
                out.write_all(sep)?;
            }
            write!(out, "{}", values[row])?;
        }
        out.write_all(b"\n")?;
    }

    Ok(CsvExport {
        rows,
        columns: series.len(),
        truncated,
    })
}

/// [`write_series_csv`] into a file at `path`.
pub fn save_series_csv(
    path: &Path,
    series: &[(&str, &[f64])],
    delimiter: char,
) -> Result<CsvExport> {
    let file = File::create(path).map_err(|e| TantrikaError::io(path, e))?;
    let mut out = BufWriter::new(file);
    let report = write_series_csv(&mut out, series, delimiter).map_err(|e| TantrikaError::io(path, e))?;
    out.flush().map_err(|e| TantrikaError::io(path, e))?;
    debug!(path = %path.display(), rows = report.rows, "Saved series CSV");
    Ok(report)
}

/// Write `(time, value)` pairs, one per line, after an optional header line.
pub fn write_samples_csv<W: Write>(
    out: &mut W,
    samples: &[(f64, f64)],
    header: Option<&str>,
) -> io::Result<usize> {
    if let Some(header) = header {
        writeln!(out, "{}", header)?;
    }
    for (t, v) in samples {
        writeln!(out, "{},{}", t, v)?;
    }
    Ok(samples.len())
}

/// [`write_samples_csv`] into a file at `path`.
pub fn save_samples_csv(path: &Path, samples: &[(f64, f64)], header: Option<&str>) -> Result<usize> {
    let file = File::create(path).map_err(|e| TantrikaError::io(path, e))?;
    let mut out = BufWriter::new(file);
    let rows = write_samples_csv(&mut out, samples, header).map_err(|e| TantrikaError::io(path, e))?;
    out.flush().map_err(|e| TantrikaError::io(path, e))?;
    debug!(path = %path.display(), rows, "Saved sample CSV");
    Ok(rows)
}
