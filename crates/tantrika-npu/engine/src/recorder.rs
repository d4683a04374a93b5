// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-tick recording
//!
//! The network hands the recorder one [`Snapshot`] per tick: `time` first, then every
//! designated signal in designation order.

use std::io::{self, Write};

use ahash::AHashMap;
use tantrika_npu_neural::export::{write_series_csv, CsvExport};

/// Values of the recorded signals at one tick
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub time: f64,
    pub names: &'a [String],
    pub values: &'a [f64],
}

impl<'a> Snapshot<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let (names, values) = (self.names, self.values);
        names.iter().map(String::as_str).zip(values.iter().copied())
    }
}

/// Consumer of per-tick snapshots
pub trait Recorder {
    fn record(&mut self, snapshot: &Snapshot<'_>);
}

/// Keeps every value in memory, one column per signal name.
///
/// Columns always have equal length: a column first seen late is back-filled with `NaN`,
/// and a column missing from a snapshot gets `NaN` for that tick.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesRecorder {
    columns: Vec<String>,
    series: Vec<Vec<f64>>,
    index: AHashMap<String, usize>,
    rows: usize,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded ticks
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in first-seen order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.series[i].as_slice())
    }

    /// `(name, values)` pairs in column order
    pub fn series(&self) -> Vec<(&str, &[f64])> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.series.iter().map(Vec::as_slice))
            .collect()
    }

    pub fn write_csv<W: Write>(&self, out: &mut W, delimiter: char) -> io::Result<CsvExport> {
        write_series_csv(out, &self.series(), delimiter)
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.series.clear();
        self.index.clear();
        self.rows = 0;
    }
}

impl Recorder for TimeSeriesRecorder {
    fn record(&mut self, snapshot: &Snapshot<'_>) {
        let row = self.rows;
        for (name, value) in snapshot.iter() {
            let column = match self.index.get(name) {
                Some(&column) => column,
                None => {
                    let column = self.columns.len();
                    self.columns.push(name.to_string());
                    self.series.push(vec![f64::NAN; row]);
                    self.index.insert(name.to_string(), column);
                    column
                }
            };
            if self.series[column].len() == row {
                self.series[column].push(value);
            }
        }
        for values in &mut self.series {
            if values.len() == row {
                values.push(f64::NAN);
            }
        }
        self.rows += 1;
    }
}
