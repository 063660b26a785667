//! Column resolution for court exports whose headers drift between releases.
//!
//! Each logical field is described by an ordered list of [`Strategy`] values.
//! They are tried in sequence against the table headers and the first one that
//! matches wins.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Exact header names that carry the decision summary
pub const SUMMARY_NAMES: &[&str] = &["Ementa", "Summary"];
/// Header fragments that suggest a summary or proceeding note
pub const SUMMARY_MARKERS: &[&str] = &["ementa", "resumo", "summary", "observa", "andamento"];

pub const OUTCOME_NAMES: &[&str] = &["Resultado", "Outcome"];
pub const OUTCOME_MARKERS: &[&str] = &["resultado", "result", "outcome", "desfecho", "disposi"];

pub const ID_NAMES: &[&str] = &["Id_decisao", "Id", "Id_processo"];

/// Outcome assigned when no outcome column can be identified
pub const UNSPECIFIED_OUTCOME: &str = "unspecified";

/// One way of locating a column among the headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Normalized header equals one of the names, tried in list order
    ExactName(&'static [&'static str]),
    /// Header contains one of the fragments, case-insensitively
    Marker(&'static [&'static str]),
    /// The first column of the table
    FirstColumn,
}

/// Which kind of strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactName,
    Marker,
    FirstColumn,
}

/// A resolved column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub index: usize,
    pub header: String,
    pub matched_by: MatchKind,
}

/// Strategy order for the summary field; always resolves on a non-empty header row
pub const SUMMARY_STRATEGIES: &[Strategy] = &[
    Strategy::ExactName(SUMMARY_NAMES),
    Strategy::Marker(SUMMARY_MARKERS),
    Strategy::FirstColumn,
];

pub const OUTCOME_STRATEGIES: &[Strategy] = &[
    Strategy::ExactName(OUTCOME_NAMES),
    Strategy::Marker(OUTCOME_MARKERS),
];

pub const ID_STRATEGIES: &[Strategy] = &[Strategy::ExactName(ID_NAMES)];

/// Trim a header and capitalize it: first character upper-case, the rest
/// lower-case. `"  EMENTA "` becomes `"Ementa"`.
pub fn normalize_header(header: &str) -> String {
    let trimmed = header.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

fn marker_regex(markers: &[&str]) -> Result<Regex> {
    let pattern = markers
        .iter()
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|");
    Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
}

impl Strategy {
    /// Apply this strategy to the header row
    pub fn apply(&self, headers: &[String]) -> Result<Option<ColumnMatch>> {
        let found = match self {
            Strategy::ExactName(names) => {
                let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
                names
                    .iter()
                    .find_map(|name| normalized.iter().position(|h| h == name))
                    .map(|index| (index, MatchKind::ExactName))
            }
            Strategy::Marker(markers) => {
                let re = marker_regex(markers)?;
                headers
                    .iter()
                    .position(|h| re.is_match(h))
                    .map(|index| (index, MatchKind::Marker))
            }
            Strategy::FirstColumn => {
                if headers.is_empty() {
                    None
                } else {
                    Some((0, MatchKind::FirstColumn))
                }
            }
        };

        Ok(found.map(|(index, matched_by)| ColumnMatch {
            index,
            header: headers[index].clone(),
            matched_by,
        }))
    }
}

/// Evaluate strategies in order and return the first match
pub fn resolve(headers: &[String], strategies: &[Strategy]) -> Result<Option<ColumnMatch>> {
    for strategy in strategies {
        if let Some(found) = strategy.apply(headers)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Where each record field comes from in a given table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLayout {
    pub summary: ColumnMatch,
    /// `None` means every record gets the unspecified outcome
    pub outcome: Option<ColumnMatch>,
    /// `None` means records are numbered by row
    pub id: Option<ColumnMatch>,
}

impl ColumnLayout {
    pub fn resolve(headers: &[String]) -> Result<Self> {
        let summary = resolve(headers, SUMMARY_STRATEGIES)?
            .ok_or_else(|| Error::SourceUnreadable("table has no columns".to_string()))?;
        let outcome = resolve(headers, OUTCOME_STRATEGIES)?;
        let id = resolve(headers, ID_STRATEGIES)?;

        Ok(Self { summary, outcome, id })
    }
}
