//! Aggregates behind the dashboard charts and the sample table.

use crate::types::{Court, Record, RecordSet};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Records sharing one outcome label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCount {
    pub outcome: String,
    pub count: usize,
}

/// Records from one court and their share of the set, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtShare {
    pub court: Court,
    pub count: usize,
    pub percent: f64,
}

/// Outcome counts, most frequent first, ties broken by label, truncated to `top`
pub fn outcome_distribution(records: &RecordSet, top: usize) -> Vec<OutcomeCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.outcome.as_str()).or_insert(0) += 1;
    }

    let mut distribution: Vec<OutcomeCount> = counts
        .into_iter()
        .map(|(outcome, count)| OutcomeCount {
            outcome: outcome.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.outcome.cmp(&b.outcome)));
    distribution.truncate(top);
    distribution
}

/// Share of each court present in the set, in court order
pub fn court_distribution(records: &RecordSet) -> Vec<CourtShare> {
    let mut counts: BTreeMap<Court, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.court).or_insert(0) += 1;
    }

    let total = records.len() as f64;
    counts
        .into_iter()
        .map(|(court, count)| CourtShare {
            court,
            count,
            percent: round_tenth(count as f64 * 100.0 / total),
        })
        .collect()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Up to `size` distinct records, drawn without replacement
pub fn sample_records<R: Rng + ?Sized>(records: &RecordSet, size: usize, rng: &mut R) -> Vec<Record> {
    let amount = size.min(records.len());
    index::sample(rng, records.len(), amount)
        .into_iter()
        .map(|i| records.records()[i].clone())
        .collect()
}
