//! Recency / frequency / monetary scoring and customer segmentation.
//!
//! Each measure is binned into quartiles using linearly interpolated edges at
//! 0, 25, 50, 75 and 100 percent. A value falls into the first bin whose upper
//! edge it does not exceed, so repeated edges on small or skewed inputs still
//! yield a score. Recency scores run 4 (most recent) down to 1; frequency and
//! monetary scores run 1 up to 4. Frequency is replaced by its first-seen rank
//! before binning so ties get distinct, stable positions.

use super::writer::ReportRow;
use crate::config::SegmentGroup;
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

// ordering by monetary value also fixes the first-seen order for frequency ranks
const CUSTOMER_SQL: &str = "
    SELECT CustomerKey, FirstName, LastName,
           julianday((SELECT MAX(FullDateAlternateKey) FROM full_sales_data))
               - julianday(MAX(FullDateAlternateKey)) AS recency_days,
           COUNT(DISTINCT SalesOrderNumber) AS frequency,
           TOTAL(SalesAmount) AS monetary_value
    FROM full_sales_data
    GROUP BY CustomerKey, FirstName, LastName
    ORDER BY monetary_value DESC, CustomerKey";

/// Per-customer rollup before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerActivity {
    pub customer_key: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Days since the customer's last order; none when no sale is dated
    pub recency_days: Option<i64>,
    pub frequency: i64,
    pub monetary_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmScore {
    #[serde(rename = "CustomerKey")]
    pub customer_key: Option<i64>,
    #[serde(rename = "FirstName")]
    pub first_name: Option<String>,
    #[serde(rename = "LastName")]
    pub last_name: Option<String>,
    pub recency_days: Option<i64>,
    pub frequency: i64,
    pub monetary_value: f64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub rfm_score: String,
    pub segment: String,
}

impl ReportRow for RfmScore {
    const HEADER: &'static [&'static str] = &[
        "CustomerKey",
        "FirstName",
        "LastName",
        "recency_days",
        "frequency",
        "monetary_value",
        "r_score",
        "f_score",
        "m_score",
        "rfm_score",
        "segment",
    ];
}

/// Ordered exact-match rules from RFM code to segment label.
pub struct SegmentRules<'a> {
    groups: &'a [SegmentGroup],
}

impl<'a> SegmentRules<'a> {
    pub fn new(groups: &'a [SegmentGroup]) -> Self {
        Self { groups }
    }

    /// First group listing `code`, if any.
    pub fn label_for(&self, code: &str) -> Option<&'a str> {
        self.groups
            .iter()
            .find(|group| group.codes.iter().any(|c| c == code))
            .map(|group| group.label.as_str())
    }
}

/// Quartile edges of `values` (at least one value) with linear interpolation.
fn quartile_edges(values: &[f64]) -> [f64; 5] {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let last = sorted.len() - 1;

    let mut edges = [0.0; 5];
    for (i, edge) in edges.iter_mut().enumerate() {
        let position = last as f64 * i as f64 / 4.0;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let weight = position - lower as f64;
        *edge = sorted[lower] + (sorted[upper] - sorted[lower]) * weight;
    }
    edges
}

/// Bin 1..=4 for `value` against `edges`.
fn quartile(value: f64, edges: &[f64; 5]) -> u8 {
    (1..=4u8)
        .find(|&i| value <= edges[i as usize])
        .unwrap_or(4)
}

/// 1-based ranks, ties broken by position.
fn first_seen_ranks(values: &[i64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&idx| (values[idx], idx));

    let mut ranks = vec![0.0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = (rank + 1) as f64;
    }
    ranks
}

/// Scores and labels every customer, preserving input order.
pub fn score_customers(customers: &[CustomerActivity], rules: &SegmentRules<'_>) -> Vec<RfmScore> {
    if customers.is_empty() {
        return Vec::new();
    }

    let dated: Vec<f64> = customers
        .iter()
        .filter_map(|c| c.recency_days.map(|d| d as f64))
        .collect();
    let recency_edges = (!dated.is_empty()).then(|| quartile_edges(&dated));

    let frequencies: Vec<i64> = customers.iter().map(|c| c.frequency).collect();
    let ranks = first_seen_ranks(&frequencies);
    let rank_edges = quartile_edges(&ranks);

    let monetary: Vec<f64> = customers.iter().map(|c| c.monetary_value).collect();
    let monetary_edges = quartile_edges(&monetary);

    let mut uncovered = BTreeSet::new();
    let scores = customers
        .iter()
        .zip(ranks)
        .map(|(customer, rank)| {
            let r_score = match (customer.recency_days, recency_edges.as_ref()) {
                (Some(days), Some(edges)) => 5 - quartile(days as f64, edges),
                _ => 1,
            };
            let f_score = quartile(rank, &rank_edges);
            let m_score = quartile(customer.monetary_value, &monetary_edges);
            let code = format!("{}{}{}", r_score, f_score, m_score);
            let segment = match rules.label_for(&code) {
                Some(label) => label.to_string(),
                None => {
                    uncovered.insert(code.clone());
                    code.clone()
                }
            };

            RfmScore {
                customer_key: customer.customer_key,
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                recency_days: customer.recency_days,
                frequency: customer.frequency,
                monetary_value: customer.monetary_value,
                r_score,
                f_score,
                m_score,
                rfm_score: code,
                segment,
            }
        })
        .collect();

    if !uncovered.is_empty() {
        warn!(
            "RFM codes without a segment, kept as labels: {}",
            uncovered.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    scores
}

pub fn customer_activity(store: &Store) -> Result<Vec<CustomerActivity>> {
    store.query(CUSTOMER_SQL, |row| {
        let recency: Option<f64> = row.get(3)?;
        Ok(CustomerActivity {
            customer_key: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            recency_days: recency.map(|days| days.round() as i64),
            frequency: row.get(4)?,
            monetary_value: row.get(5)?,
        })
    })
}

pub fn rfm_segments(store: &Store, segments: &[SegmentGroup]) -> Result<Vec<RfmScore>> {
    let customers = customer_activity(store)?;
    debug!("Scoring {} customers", customers.len());
    Ok(score_customers(&customers, &SegmentRules::new(segments)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn customer(key: i64, recency: Option<i64>, frequency: i64, monetary: f64) -> CustomerActivity {
        CustomerActivity {
            customer_key: Some(key),
            first_name: None,
            last_name: None,
            recency_days: recency,
            frequency,
            monetary_value: monetary,
        }
    }

    fn codes(scores: &[RfmScore]) -> Vec<&str> {
        scores.iter().map(|s| s.rfm_score.as_str()).collect()
    }

    #[test]
    fn test_quartile_edges_interpolate() {
        assert_eq!(quartile_edges(&[2000.0, 2205.0, 2200.0]), [2000.0, 2100.0, 2200.0, 2202.5, 2205.0]);
        assert_eq!(quartile_edges(&[7.0]), [7.0; 5]);
    }

    #[test]
    fn test_repeated_edges_still_bin() {
        let edges = quartile_edges(&[0.0, 0.0, 401.0]);
        assert_eq!(edges, [0.0, 0.0, 0.0, 200.5, 401.0]);
        assert_eq!(quartile(0.0, &edges), 1);
        assert_eq!(quartile(401.0, &edges), 4);
    }

    #[test]
    fn test_first_seen_ranks_break_ties_by_position() {
        assert_eq!(first_seen_ranks(&[2, 1, 1]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_scores_and_segments() {
        let config = PipelineConfig::default();
        let rules = SegmentRules::new(&config.segments);
        let customers = vec![
            customer(2, Some(0), 2, 2205.0),
            customer(3, Some(0), 1, 2200.0),
            customer(1, Some(401), 1, 2000.0),
        ];

        let scores = score_customers(&customers, &rules);
        assert_eq!(codes(&scores), vec!["444", "412", "121"]);
        let segments: Vec<_> = scores.iter().map(|s| s.segment.as_str()).collect();
        assert_eq!(segments, vec!["Champions", "Loyal", "Lost"]);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let config = PipelineConfig::default();
        let rules = SegmentRules::new(&config.segments);
        let customers: Vec<_> = (0..20)
            .map(|k| customer(k, Some((k * 37) % 90), 1 + k % 3, 100.0 + (k * 13 % 7) as f64))
            .collect();

        let first = score_customers(&customers, &rules);
        let second = score_customers(&customers, &rules);
        assert_eq!(first, second);
        for score in &first {
            assert!((1..=4).contains(&score.r_score));
            assert!((1..=4).contains(&score.f_score));
            assert!((1..=4).contains(&score.m_score));
        }
    }

    #[test]
    fn test_first_matching_group_wins() {
        let config = PipelineConfig::default();
        let rules = SegmentRules::new(&config.segments);
        assert_eq!(rules.label_for("443"), Some("Champions"));
        // listed under both Hibernating and Loyal
        assert_eq!(rules.label_for("332"), Some("Hibernating"));
        assert_eq!(rules.label_for("324"), None);
    }

    #[test]
    fn test_unmapped_code_keeps_raw_label() {
        let groups = vec![SegmentGroup {
            label: "Champions".to_string(),
            codes: vec!["444".to_string()],
        }];
        let rules = SegmentRules::new(&groups);
        let scores = score_customers(&[customer(1, Some(3), 1, 10.0)], &rules);
        assert_eq!(scores[0].rfm_score, "411");
        assert_eq!(scores[0].segment, "411");
    }

    #[test]
    fn test_undated_customer_gets_lowest_recency_score() {
        let config = PipelineConfig::default();
        let rules = SegmentRules::new(&config.segments);
        let scores = score_customers(
            &[customer(1, Some(0), 1, 10.0), customer(2, None, 1, 5.0)],
            &rules,
        );
        assert_eq!(scores[0].r_score, 4);
        assert_eq!(scores[1].r_score, 1);
    }

    #[test]
    fn test_rollup_from_store() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE full_sales_data (CustomerKey INTEGER, FirstName TEXT, LastName TEXT,
                     FullDateAlternateKey DATE, SalesOrderNumber TEXT, SalesAmount REAL);
                 INSERT INTO full_sales_data VALUES
                     (1, 'Ana', 'Lopez', '2013-01-05', 'SO1', 2000.0),
                     (2, 'Ben', 'Kim', '2014-02-10', 'SO3', 2100.0),
                     (2, 'Ben', 'Kim', '2014-02-10', 'SO3', 35.0),
                     (2, 'Ben', 'Kim', '2013-01-05', 'SO2', 70.0);",
            )
            .unwrap();

        let customers = customer_activity(&store).unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].customer_key, Some(2));
        assert_eq!(customers[0].recency_days, Some(0));
        assert_eq!(customers[0].frequency, 2);
        assert_eq!(customers[0].monetary_value, 2205.0);
        assert_eq!(customers[1].recency_days, Some(401));
    }
}
