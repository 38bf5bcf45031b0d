//! CSV export for report rows.

use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A serializable report row with a fixed output header.
pub trait ReportRow: Serialize {
    /// Column names, in field order.
    const HEADER: &'static [&'static str];
}

/// Writes `rows` to `path` with a header row, even when `rows` is empty.
///
/// The file is written next to its destination and renamed into place, so a
/// failure leaves any previous output untouched.
pub fn write_report<R: ReportRow>(path: &Path, rows: &[R]) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(staged.as_file());
        writer.write_record(R::HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    staged.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: String,
        ratio: Option<f64>,
    }

    impl ReportRow for Row {
        const HEADER: &'static [&'static str] = &["name", "ratio"];
    }

    #[test]
    fn test_empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        assert_eq!(write_report::<Row>(&path, &[]).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name,ratio\n");
    }

    #[test]
    fn test_missing_ratio_is_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rows.csv");
        let rows = vec![
            Row { name: "a".to_string(), ratio: Some(0.5) },
            Row { name: "b".to_string(), ratio: None },
        ];
        write_report(&path, &rows).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "name,ratio\na,0.5\nb,\n"
        );
    }

    #[test]
    fn test_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "stale\n").unwrap();
        write_report(&path, &[Row { name: "x".to_string(), ratio: None }]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name,ratio\nx,\n");
        // only the destination remains, no staged leftovers
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
