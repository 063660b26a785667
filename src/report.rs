use crate::config::CourtSelector;
use crate::summary::{CourtShare, OutcomeCount};
use crate::types::{KeywordFrequency, Notice, Record, RecordSet};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether the request produced data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    NoData,
}

/// Everything the presentation layer needs for one analysis request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub court: CourtSelector,
    pub status: ReportStatus,
    pub notices: Vec<Notice>,
    pub record_count: usize,
    pub keywords: Vec<KeywordFrequency>,
    pub outcome_distribution: Vec<OutcomeCount>,
    pub court_distribution: Vec<CourtShare>,
    pub sample: Vec<Record>,
    /// The resolved record set, kept for callers that render it in full
    #[serde(skip)]
    pub records: RecordSet,
}

impl AnalysisReport {
    /// Report for a request where no source produced records
    pub fn no_data(court: CourtSelector, notices: Vec<Notice>) -> Self {
        Self {
            generated_at: Utc::now(),
            court,
            status: ReportStatus::NoData,
            notices,
            record_count: 0,
            keywords: Vec::new(),
            outcome_distribution: Vec::new(),
            court_distribution: Vec::new(),
            sample: Vec::new(),
            records: RecordSet::default(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.status == ReportStatus::NoData
    }
}
