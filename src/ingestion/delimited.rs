//! Comma-separated extracts, read through polars' CSV reader.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::path::Path;

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        // full scan: key columns must not flip type halfway through a file
        .with_infer_schema_length(None)
        .finish()
        .and_then(|frame| frame.collect())
        .map_err(|e| PipelineError::source_read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_typed_columns() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "DateKey,FullDateAlternateKey,EnglishMonthName,CalendarYear").unwrap();
        writeln!(file, "20130105,2013-01-05,January,2013").unwrap();
        writeln!(file, "20140210,2014-02-10,February,2014").unwrap();
        file.flush().unwrap();

        let frame = read_csv(file.path()).unwrap();
        assert_eq!(frame.shape(), (2, 4));
        assert_eq!(frame.column("DateKey").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("FullDateAlternateKey").unwrap().dtype(), &DataType::Date);
        assert_eq!(frame.column("EnglishMonthName").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let err = read_csv(Path::new("/nonexistent/date.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::SourceRead { .. }));
    }
}
