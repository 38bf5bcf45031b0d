//! Year-over-year growth of quarterly sales.

use super::{ratio, writer::ReportRow};
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;

const QUARTERLY_SQL: &str = "
    SELECT CalendarYear, CalendarQuarter, TOTAL(SalesAmount) AS quarterly_sales
    FROM full_sales_data
    GROUP BY CalendarYear, CalendarQuarter
    ORDER BY CalendarQuarter, CalendarYear";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyGrowth {
    #[serde(rename = "CalendarYear")]
    pub year: Option<i64>,
    #[serde(rename = "CalendarQuarter")]
    pub quarter: Option<i64>,
    pub quarterly_sales: f64,
    /// `(current - prior) / prior` against the previous year of the same quarter
    pub yoy_growth: Option<f64>,
}

impl ReportRow for QuarterlyGrowth {
    const HEADER: &'static [&'static str] =
        &["CalendarYear", "CalendarQuarter", "quarterly_sales", "yoy_growth"];
}

/// Fills in growth for rows sorted by (quarter, year). The first year of each
/// quarter has no prior value and stays undefined.
pub fn apply_growth(rows: &mut [QuarterlyGrowth]) {
    let mut prior: Option<(Option<i64>, f64)> = None;
    for row in rows.iter_mut() {
        row.yoy_growth = match prior {
            Some((quarter, sales)) if quarter == row.quarter => {
                ratio(row.quarterly_sales - sales, sales)
            }
            _ => None,
        };
        prior = Some((row.quarter, row.quarterly_sales));
    }
}

pub fn quarterly_growth(store: &Store) -> Result<Vec<QuarterlyGrowth>> {
    let mut rows = store.query(QUARTERLY_SQL, |row| {
        Ok(QuarterlyGrowth {
            year: row.get(0)?,
            quarter: row.get(1)?,
            quarterly_sales: row.get(2)?,
            yoy_growth: None,
        })
    })?;
    apply_growth(&mut rows);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter(year: i64, quarter: i64, sales: f64) -> QuarterlyGrowth {
        QuarterlyGrowth {
            year: Some(year),
            quarter: Some(quarter),
            quarterly_sales: sales,
            yoy_growth: None,
        }
    }

    #[test]
    fn test_growth_against_prior_year() {
        let mut rows = vec![quarter(2013, 1, 100.0), quarter(2014, 1, 150.0)];
        apply_growth(&mut rows);
        assert_eq!(rows[0].yoy_growth, None);
        assert_eq!(rows[1].yoy_growth, Some(0.5));
    }

    #[test]
    fn test_each_quarter_starts_undefined() {
        let mut rows = vec![
            quarter(2013, 1, 100.0),
            quarter(2014, 1, 80.0),
            quarter(2013, 2, 50.0),
            quarter(2014, 2, 0.0),
            quarter(2015, 2, 25.0),
        ];
        apply_growth(&mut rows);
        let growth: Vec<_> = rows.iter().map(|r| r.yoy_growth).collect();
        assert_eq!(growth, vec![None, Some(-0.2), None, Some(-1.0), None]);
    }

    #[test]
    fn test_query_orders_by_quarter_then_year() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE full_sales_data (CalendarYear INTEGER, CalendarQuarter INTEGER, SalesAmount REAL);
                 INSERT INTO full_sales_data VALUES
                     (2014, 1, 150.0), (2013, 2, 40.0), (2013, 1, 60.0), (2013, 1, 40.0);",
            )
            .unwrap();

        let rows = quarterly_growth(&store).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| (r.year, r.quarter)).collect();
        assert_eq!(keys, vec![(Some(2013), Some(1)), (Some(2014), Some(1)), (Some(2013), Some(2))]);
        assert_eq!(rows[1].yoy_growth, Some(0.5));
        assert_eq!(rows[2].yoy_growth, None);
    }
}
