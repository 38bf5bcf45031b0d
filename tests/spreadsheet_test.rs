use polars::prelude::*;
use sales_insights::ingestion::read_source;
use sales_insights::schema::tables;
use sales_insights::{Pipeline, PipelineConfig, Store};
use std::path::{Path, PathBuf};

/// Workbooks named like the production extracts, same rows as the CSV fixture
/// except SO1 is 2000.50. The calendar column uses a date number format.
fn workbook_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/xlsx")
}

fn column_dtype(frame: &DataFrame, name: &str) -> DataType {
    frame.column(name).unwrap().dtype().clone()
}

#[test]
fn test_workbook_columns_are_typed() {
    let customers = read_source(&workbook_dir().join("customers.xlsx")).unwrap();
    assert_eq!(customers.shape(), (3, 7));
    assert_eq!(column_dtype(&customers, "CustomerKey"), DataType::Int64);
    assert_eq!(column_dtype(&customers, "YearlyIncome"), DataType::Int64);
    assert_eq!(column_dtype(&customers, "FirstName"), DataType::String);

    let date = read_source(&workbook_dir().join("date.xlsx")).unwrap();
    assert_eq!(
        column_dtype(&date, "FullDateAlternateKey"),
        DataType::Datetime(TimeUnit::Microseconds, None)
    );
    assert_eq!(column_dtype(&date, "DateKey"), DataType::Int64);

    let product = read_source(&workbook_dir().join("product.xlsx")).unwrap();
    assert_eq!(column_dtype(&product, "Weight"), DataType::Float64);

    // one fractional amount widens the whole column
    let sales = read_source(&workbook_dir().join("sales_new.xlsx")).unwrap();
    assert_eq!(sales.height(), 5);
    assert_eq!(column_dtype(&sales, "SalesAmount"), DataType::Float64);
    assert_eq!(column_dtype(&sales, "OrderQuantity"), DataType::Int64);
}

#[test]
fn test_workbooks_drive_the_full_pipeline() {
    let scratch = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        data_dir: workbook_dir(),
        store_path: scratch.path().join("sales_analysis.db"),
        output_dir: scratch.path().join("reports"),
        ..PipelineConfig::default()
    };

    let summary = Pipeline::new(config.clone()).run().unwrap();
    assert_eq!(summary.load.tables.len(), 7);
    assert_eq!(summary.load.full_sales_rows, 5);
    assert!(summary.reports.is_success());

    // Excel date cells land as calendar dates without a time part
    let store = Store::open(&config.store_path).unwrap();
    let first: String = store
        .query_scalar("SELECT MIN(FullDateAlternateKey) FROM full_sales_data")
        .unwrap();
    assert_eq!(first, "2013-01-05");
    let full = store.read_table(tables::FULL_SALES).unwrap();
    assert_eq!(column_dtype(&full, "FullDateAlternateKey"), DataType::Date);

    let mut reader = csv::Reader::from_path(config.output_dir.join("rfm.csv")).unwrap();
    let codes: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[9].to_string())
        .collect();
    assert_eq!(codes, vec!["444", "412", "121"]);

    let mut reader = csv::Reader::from_path(config.output_dir.join("sales_growth.csv")).unwrap();
    let growth: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[3].to_string())
        .collect();
    assert_eq!(growth[0], "");
    let second: f64 = growth[1].parse().unwrap();
    assert!((second - (4335.0 - 2070.5) / 2070.5).abs() < 1e-9);
}
