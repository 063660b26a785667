//! Keyword frequency analysis over Brazilian court decision summaries.
//!
//! Decisions come from a real STF export (XLSX/CSV, with drifting column
//! names) or from synthetic STJ records. Every source is normalized into the
//! same three-field [`Record`] before keyword counting.

pub mod analyzer;
pub mod cache;
pub mod columns;
pub mod config;
pub mod error;
pub mod loader;
pub mod processor;
pub mod report;
pub mod selection;
pub mod summary;
pub mod synthetic;
pub mod types;

pub use cache::{LoadCache, SourceKey};
pub use columns::{ColumnLayout, ColumnMatch, MatchKind, Strategy};
pub use config::{Config, ConfigBuilder, CourtSelector, FileConfig};
pub use error::{Error, Result};
pub use loader::TableSource;
pub use processor::AnalysisPipeline;
pub use report::{AnalysisReport, ReportStatus};
pub use selection::Selection;
pub use types::{Court, KeywordFrequency, Notice, Record, RecordSet};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, ConfigBuilder, CourtSelector};
    pub use crate::error::{Error, Result};
    pub use crate::loader::TableSource;
    pub use crate::processor::AnalysisPipeline;
    pub use crate::report::AnalysisReport;
    pub use crate::types::{Court, KeywordFrequency, Notice, Record, RecordSet};
    pub use futures::StreamExt;
}
