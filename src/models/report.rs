//! Normalized report model and its tabular projection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator used when `subject` is flattened to a single column
pub const SUBJECT_SEPARATOR: &str = "; ";

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year pattern"));

/// One catalog record, flattened.
///
/// Every attribute defaults to an empty value; catalog records are sparse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub record_id: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub publication_date: String,
    /// First 4-digit run of `publication_date`, or empty.
    ///
    /// Recomputed whenever the date changes, so a later undated `"n.d."` clears it.
    pub publication_year: String,
    pub language: String,
    pub subject: Vec<String>,
    pub description: String,
    pub url: String,
    pub isbn: String,
    pub issn: String,
    /// UN document symbol, e.g. `A/80/123`
    pub document_symbol: String,
    pub series: String,
    pub notes: String,
    pub physical_description: String,
    pub edition: String,
    pub un_body: String,
    pub report_type: String,
}

impl Report {
    /// Subjects joined for tabular output
    pub fn subject_line(&self) -> String {
        self.subject.join(SUBJECT_SEPARATOR)
    }

    /// Set the publication date and keep the derived year in step with it
    pub fn set_publication_date(&mut self, date: &str) {
        self.publication_date = date.to_string();
        self.publication_year = extract_year(date);
    }
}

/// Flat row written to CSV / JSON exports.
///
/// Column order is the export order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub record_id: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub publication_date: String,
    pub publication_year: String,
    pub language: String,
    pub subject: String,
    pub description: String,
    pub url: String,
    pub isbn: String,
    pub issn: String,
    pub document_symbol: String,
    pub series: String,
    pub notes: String,
    pub physical_description: String,
    pub edition: String,
    pub un_body: String,
    pub report_type: String,
}

impl From<&Report> for ReportRow {
    fn from(report: &Report) -> Self {
        Self {
            record_id: report.record_id.clone(),
            title: report.title.clone(),
            author: report.author.clone(),
            publisher: report.publisher.clone(),
            publication_date: report.publication_date.clone(),
            publication_year: report.publication_year.clone(),
            language: report.language.clone(),
            subject: report.subject_line(),
            description: report.description.clone(),
            url: report.url.clone(),
            isbn: report.isbn.clone(),
            issn: report.issn.clone(),
            document_symbol: report.document_symbol.clone(),
            series: report.series.clone(),
            notes: report.notes.clone(),
            physical_description: report.physical_description.clone(),
            edition: report.edition.clone(),
            un_body: report.un_body.clone(),
            report_type: report.report_type.clone(),
        }
    }
}

/// Reports from one pipeline run, in source document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportCollection {
    reports: Vec<Report>,
}

impl ReportCollection {
    pub fn new(reports: Vec<Report>) -> Self {
        Self { reports }
    }

    /// Every report, unfiltered
    pub fn all(&self) -> &[Report] {
        &self.reports
    }

    /// Reports accepted by `predicate`, order preserved
    pub fn select<F>(&self, predicate: F) -> Vec<&Report>
    where
        F: Fn(&Report) -> bool,
    {
        self.reports.iter().filter(|r| predicate(r)).collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// First run of four digits in a free-text date, or empty
pub fn extract_year(date: &str) -> String {
    YEAR_RE
        .find(date)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
