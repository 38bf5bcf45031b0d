//! First-sheet spreadsheet reader with per-column type inference.

use crate::error::{PipelineError, Result};
use crate::store::convert::{datetime_to_micros, parse_timestamp};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Inferred type of a spreadsheet column, widened cell by cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Empty,
    Bool,
    Int,
    Float,
    DateTime,
    Text,
}

impl CellKind {
    fn of(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellKind::Empty,
            Data::Bool(_) => CellKind::Bool,
            Data::Int(_) => CellKind::Int,
            // integral floats are how most writers store whole numbers
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellKind::Int,
            Data::Float(_) => CellKind::Float,
            Data::DateTime(_) | Data::DateTimeIso(_) => CellKind::DateTime,
            Data::String(s) if s.trim().is_empty() => CellKind::Empty,
            Data::String(_) | Data::DurationIso(_) => CellKind::Text,
        }
    }

    fn widen(self, other: CellKind) -> CellKind {
        match (self, other) {
            (a, b) if a == b => a,
            (CellKind::Empty, b) => b,
            (a, CellKind::Empty) => a,
            (CellKind::Int, CellKind::Float) | (CellKind::Float, CellKind::Int) => CellKind::Float,
            _ => CellKind::Text,
        }
    }
}

pub fn read_first_sheet(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| PipelineError::source_read(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::source_read(path, "workbook has no sheets"))?
        .map_err(|e| PipelineError::source_read(path, e))?;
    frame_from_range(&range).map_err(|reason| PipelineError::source_read(path, reason))
}

/// Builds a frame from a sheet range whose first row is the header.
pub fn frame_from_range(range: &Range<Data>) -> std::result::Result<DataFrame, String> {
    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| "sheet is empty".to_string())?;
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();

    let empty = Data::Empty;
    let mut columns = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<&Data> = body.iter().map(|row| row.get(idx).unwrap_or(&empty)).collect();
        let kind = cells
            .iter()
            .fold(CellKind::Empty, |kind, cell| kind.widen(CellKind::of(cell)));
        debug!("Column {} inferred as {:?}", name, kind);
        columns.push(build_series(name, kind, &cells).map_err(|e| e.to_string())?);
    }

    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Data::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                Data::Empty => format!("column_{}", idx),
                other => other.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}.{}", base, *count - 1)
            }
        })
        .collect()
}

fn build_series(name: &str, kind: CellKind, cells: &[&Data]) -> PolarsResult<Series> {
    let series = match kind {
        CellKind::Empty => Series::full_null(name, cells.len(), &DataType::String),
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::DateTime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| cell_datetime(c).and_then(datetime_to_micros))
                .collect();
            Series::new(name, values).cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells.iter().map(|c| cell_text(c)).collect();
            Series::new(name, values)
        }
    };
    Ok(series)
}

/// Excel stores dates as days since 1899-12-30 (1900 date system).
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::milliseconds(millis))
}

fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()),
        Data::DateTimeIso(s) => parse_timestamp(s),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::DateTime(_) => cell_datetime(cell).map(|dt| dt.to_string()),
        other => Some(other.to_string()),
    }
}
