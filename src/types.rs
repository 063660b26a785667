use serde::{Deserialize, Serialize};
use std::fmt;

/// Court that issued a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Court {
    /// Supremo Tribunal Federal, real data from the Corte Aberta export
    Stf,
    /// Superior Tribunal de Justiça, synthetic stand-in data
    Stj,
}

impl Court {
    pub fn as_str(&self) -> &'static str {
        match self {
            Court::Stf => "STF",
            Court::Stj => "STJ",
        }
    }
}

impl fmt::Display for Court {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single court decision in the uniform three-field shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub court: Court,
    /// Identifier from the source table, or the row number when it has none
    pub decision_id: String,
    /// Decision summary (ementa); empty when the source cell was blank
    pub summary_text: String,
    /// Disposition label (resultado)
    pub outcome: String,
}

/// Ordered, immutable collection of records produced for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Build a new set holding `self` followed by `other`, order preserved,
    /// no deduplication.
    pub fn concat(&self, other: &RecordSet) -> RecordSet {
        let mut records = Vec::with_capacity(self.len() + other.len());
        records.extend_from_slice(&self.records);
        records.extend_from_slice(&other.records);
        RecordSet { records }
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Occurrence count of one normalized keyword across a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFrequency {
    pub term: String,
    pub count: usize,
}

/// Advisory status produced while resolving data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    LoadedFromDefault,
    LoadedFromAlternate,
    NoExternalData,
    DowngradedToSynthetic,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notice::LoadedFromDefault => "loaded from default location",
            Notice::LoadedFromAlternate => "loaded from supplied alternate",
            Notice::NoExternalData => "no external data available",
            Notice::DowngradedToSynthetic => "downgraded to synthetic-only",
        };
        f.write_str(text)
    }
}
