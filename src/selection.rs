//! Choosing and combining data sources for a court selector.
//!
//! Loader failures stop here. They turn into the next fallback step or into
//! [`Selection::NoData`], never into an error for the caller.

use crate::cache::LoadCache;
use crate::config::{Config, CourtSelector};
use crate::error::{Error, Result};
use crate::loader::{load_table, TableSource};
use crate::synthetic;
use crate::types::{Notice, RecordSet};
use rand::Rng;
use std::sync::Arc;

/// Result of source selection for one request
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Loaded {
        records: RecordSet,
        notices: Vec<Notice>,
    },
    /// No source produced records; the caller reports "no data" and stops
    NoData { notices: Vec<Notice> },
}

impl Selection {
    pub fn notices(&self) -> &[Notice] {
        match self {
            Selection::Loaded { notices, .. } | Selection::NoData { notices } => notices,
        }
    }

    pub fn records(&self) -> Option<&RecordSet> {
        match self {
            Selection::Loaded { records, .. } => Some(records),
            Selection::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Selection::NoData { .. })
    }
}

/// Load an external table through the cache; the read runs on the blocking pool
pub async fn load_external(cache: &LoadCache, source: &TableSource) -> Result<Arc<RecordSet>> {
    let owned = source.clone();
    cache
        .get_or_load(source.key(), || async move {
            tokio::task::spawn_blocking(move || load_table(&owned))
                .await
                .map_err(|e| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Task join error: {}", e),
                    ))
                })?
        })
        .await
}

async fn try_source(cache: &LoadCache, source: &TableSource) -> Option<Arc<RecordSet>> {
    match load_external(cache, source).await {
        Ok(records) if !records.is_empty() => Some(records),
        Ok(_) => {
            tracing::warn!(source = %source, "source has no records");
            None
        }
        Err(e) if e.is_not_found() => {
            tracing::info!(source = %source, "source not found");
            None
        }
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "source unreadable");
            None
        }
    }
}

/// Default location first, then the supplied alternate.
///
/// A default that exists but cannot be parsed is treated like a missing one:
/// the chain still moves on to the alternate rather than ending empty. Only
/// when both attempts fail does "A" end with no data.
async fn external_chain(cache: &LoadCache, config: &Config) -> Option<(Arc<RecordSet>, Notice)> {
    let default = TableSource::Path(config.default_source.clone());
    if let Some(records) = try_source(cache, &default).await {
        return Some((records, Notice::LoadedFromDefault));
    }

    let alternate = config.alternate_source.as_ref()?;
    tracing::info!(source = %alternate, "falling back to supplied alternate");
    try_source(cache, alternate)
        .await
        .map(|records| (records, Notice::LoadedFromAlternate))
}

/// Resolve the record set for `config.court`
pub async fn select<R: Rng + ?Sized>(cache: &LoadCache, config: &Config, rng: &mut R) -> Selection {
    let selection = match config.court {
        CourtSelector::Stf => match external_chain(cache, config).await {
            Some((records, notice)) => Selection::Loaded {
                records: RecordSet::clone(&records),
                notices: vec![notice],
            },
            None => Selection::NoData {
                notices: vec![Notice::NoExternalData],
            },
        },
        CourtSelector::Stj => Selection::Loaded {
            records: synthetic::generate(config.synthetic_count, rng),
            notices: Vec::new(),
        },
        CourtSelector::Both => {
            let external = external_chain(cache, config).await;
            let synthetic = synthetic::generate(config.synthetic_count / 2, rng);
            match external {
                Some((records, notice)) => Selection::Loaded {
                    records: records.concat(&synthetic),
                    notices: vec![notice],
                },
                None => {
                    tracing::warn!("external data unavailable, downgrading to synthetic-only");
                    Selection::Loaded {
                        records: synthetic,
                        notices: vec![Notice::NoExternalData, Notice::DowngradedToSynthetic],
                    }
                }
            }
        }
    };

    match selection {
        Selection::Loaded { records, notices } if records.is_empty() => Selection::NoData { notices },
        other => other,
    }
}
