//! Report classification by label matching

use crate::{
    config::ClassifierConfig,
    models::{Report, ReportCollection},
};

/// Selects reports by case-insensitive substring markers.
///
/// A report matches when its document symbol contains the symbol marker, or
/// its author, title or joined subjects contain the label. Empty fields
/// never match.
#[derive(Debug, Clone)]
pub struct LabelClassifier {
    symbol_marker: String,
    label: String,
}

impl Default for LabelClassifier {
    /// Secretary-General reports
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl LabelClassifier {
    pub fn new(symbol_marker: &str, label: &str) -> Self {
        Self {
            symbol_marker: symbol_marker.to_lowercase(),
            label: label.to_lowercase(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(&config.symbol_marker, &config.label)
    }

    pub fn matches(&self, report: &Report) -> bool {
        contains(&report.document_symbol, &self.symbol_marker)
            || contains(&report.author, &self.label)
            || contains(&report.title, &self.label)
            || contains(&report.subject_line(), &self.label)
    }

    /// Matching reports, in collection order
    pub fn classify<'a>(&self, collection: &'a ReportCollection) -> Vec<&'a Report> {
        collection.select(|r| self.matches(r))
    }
}

fn contains(haystack: &str, needle_lower: &str) -> bool {
    !haystack.is_empty()
        && !needle_lower.is_empty()
        && haystack.to_lowercase().contains(needle_lower)
}
