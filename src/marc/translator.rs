//! MARC to Report translator
//!
//! Translates MARC21 records from the UN Digital Library into the flat
//! [`Report`] structure. Field handling is a lookup table of
//! `(tag, extractor)` pairs applied in a single pass over the record.

use super::parser::{DataField, MarcRecord};
use crate::models::Report;

/// Applies one data field to the report being built
pub type FieldExtractor = fn(&DataField, &mut Report);

/// Applies one control field's text to the report being built
pub type ControlExtractor = fn(&str, &mut Report);

// 001 - Control number
pub const CONTROL_FIELD_MAP: &[(&str, ControlExtractor)] = &[("001", record_id)];

pub const DATA_FIELD_MAP: &[(&str, FieldExtractor)] = &[
    ("245", title),
    ("100", author),
    ("110", author),
    ("111", author),
    ("260", publication),
    ("264", publication),
    ("041", language),
    ("650", subject),
    ("520", description),
    ("856", url),
    ("020", isbn),
    ("022", issn),
    ("191", document_symbol),
    ("490", series),
    ("830", series),
    ("500", notes),
    ("300", physical_description),
    ("250", edition),
    ("710", un_body),
    ("655", report_type),
];

/// MARC record translator
#[derive(Debug, Clone, Copy)]
pub struct ReportTranslator {
    control_map: &'static [(&'static str, ControlExtractor)],
    data_map: &'static [(&'static str, FieldExtractor)],
}

impl Default for ReportTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportTranslator {
    /// Create a translator using the UN Digital Library mapping
    pub fn new() -> Self {
        Self {
            control_map: CONTROL_FIELD_MAP,
            data_map: DATA_FIELD_MAP,
        }
    }

    /// Create a translator with a custom mapping
    pub fn with_maps(
        control_map: &'static [(&'static str, ControlExtractor)],
        data_map: &'static [(&'static str, FieldExtractor)],
    ) -> Self {
        Self {
            control_map,
            data_map,
        }
    }

    /// Translate a MARC record into a Report.
    ///
    /// Never fails: a field the record does not carry leaves its attribute empty.
    pub fn translate(&self, record: &MarcRecord) -> Report {
        let mut report = Report::default();

        for field in &record.control_fields {
            if let Some(extract) = lookup(self.control_map, &field.tag) {
                extract(&field.data, &mut report);
            }
        }

        for field in &record.data_fields {
            if let Some(extract) = lookup(self.data_map, &field.tag) {
                extract(field, &mut report);
            }
        }

        report.subject = report
            .subject
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        report
    }

    /// Translate a batch of records, preserving order
    pub fn translate_all(&self, records: &[MarcRecord]) -> Vec<Report> {
        records.iter().map(|r| self.translate(r)).collect()
    }
}

fn lookup<F: Copy>(map: &[(&str, F)], tag: &str) -> Option<F> {
    map.iter().find(|(t, _)| *t == tag).map(|(_, f)| *f)
}

/// Join the first value of each listed subfield code with single spaces
fn join_subfields(field: &DataField, codes: &[char]) -> String {
    codes
        .iter()
        .filter_map(|code| field.get_subfield(*code))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Overwrite `target` when the field carries subfield `code`
fn set_from(field: &DataField, code: char, target: &mut String) {
    if let Some(value) = field.get_subfield(code) {
        *target = value.to_string();
    }
}

fn record_id(text: &str, report: &mut Report) {
    report.record_id = text.to_string();
}

// 245$a$b - Title and remainder of title
fn title(field: &DataField, report: &mut Report) {
    report.title = join_subfields(field, &['a', 'b']);
}

// 100/110/111$a - Main entry; the first one in the record is kept
fn author(field: &DataField, report: &mut Report) {
    if report.author.is_empty() {
        set_from(field, 'a', &mut report.author);
    }
}

// 260/264$b$c - Publisher and date
fn publication(field: &DataField, report: &mut Report) {
    set_from(field, 'b', &mut report.publisher);
    if let Some(date) = field.get_subfield('c') {
        report.set_publication_date(date);
    }
}

fn language(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.language);
}

// 650$a - Topical subject, repeatable
fn subject(field: &DataField, report: &mut Report) {
    report
        .subject
        .extend(field.get_all_subfields('a').into_iter().map(String::from));
}

fn description(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.description);
}

fn url(field: &DataField, report: &mut Report) {
    set_from(field, 'u', &mut report.url);
}

fn isbn(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.isbn);
}

fn issn(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.issn);
}

// 191$a - UN document symbol
fn document_symbol(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.document_symbol);
}

fn series(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.series);
}

fn notes(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.notes);
}

// 300$a$b$c - Extent, other physical details, dimensions
fn physical_description(field: &DataField, report: &mut Report) {
    report.physical_description = join_subfields(field, &['a', 'b', 'c']);
}

fn edition(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.edition);
}

// 710$a - Corporate name added entry (UN body)
fn un_body(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.un_body);
}

// 655$a - Genre/form term
fn report_type(field: &DataField, report: &mut Report) {
    set_from(field, 'a', &mut report.report_type);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marc::parser::{ControlField, Subfield};

    fn field(tag: &str, subfields: &[(char, &str)]) -> DataField {
        DataField {
            tag: tag.to_string(),
            ind1: ' ',
            ind2: ' ',
            subfields: subfields
                .iter()
                .map(|(code, data)| Subfield {
                    code: *code,
                    data: data.to_string(),
                })
                .collect(),
        }
    }

    fn record(fields: Vec<DataField>) -> MarcRecord {
        MarcRecord {
            data_fields: fields,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_record_gives_defaults() {
        let report = ReportTranslator::new().translate(&MarcRecord::default());
        assert_eq!(report, Report::default());
    }

    #[test]
    fn test_record_id_from_control_field() {
        let rec = MarcRecord {
            control_fields: vec![ControlField {
                tag: "001".to_string(),
                data: "4071234".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(ReportTranslator::new().translate(&rec).record_id, "4071234");
    }

    #[test]
    fn test_title_last_wins() {
        let rec = record(vec![field("245", &[('a', "A")]), field("245", &[('a', "B")])]);
        assert_eq!(ReportTranslator::new().translate(&rec).title, "B");
    }

    #[test]
    fn test_title_joins_remainder() {
        let rec = record(vec![field(
            "245",
            &[('a', "Children and armed conflict :"), ('b', "report of the Secretary-General ")],
        )]);
        assert_eq!(
            ReportTranslator::new().translate(&rec).title,
            "Children and armed conflict : report of the Secretary-General"
        );
    }

    #[test]
    fn test_author_first_wins() {
        let rec = record(vec![
            field("100", &[('a', "X")]),
            field("110", &[('a', "Y")]),
            field("111", &[('a', "Z")]),
        ]);
        assert_eq!(ReportTranslator::new().translate(&rec).author, "X");
    }

    #[test]
    fn test_author_skips_field_without_name() {
        let rec = record(vec![field("100", &[('d', "1950-")]), field("110", &[('a', "Y")])]);
        assert_eq!(ReportTranslator::new().translate(&rec).author, "Y");
    }

    #[test]
    fn test_subjects_accumulate_and_strip_blanks() {
        let rec = record(vec![
            field("650", &[('a', "S1")]),
            field("650", &[('a', "  ")]),
            field("650", &[('a', " S2 "), ('a', "S3")]),
            field("650", &[('x', "ignored")]),
        ]);
        assert_eq!(
            ReportTranslator::new().translate(&rec).subject,
            vec!["S1", "S2", "S3"]
        );
    }

    #[test]
    fn test_publication_fields() {
        let rec = record(vec![field(
            "264",
            &[('a', "New York :"), ('b', "UN,"), ('c', "15 March 2025")],
        )]);
        let report = ReportTranslator::new().translate(&rec);
        assert_eq!(report.publisher, "UN,");
        assert_eq!(report.publication_date, "15 March 2025");
        assert_eq!(report.publication_year, "2025");
    }

    #[test]
    fn test_publication_without_year() {
        let rec = record(vec![
            field("260", &[('c', "2024")]),
            field("264", &[('c', "n.d.")]),
        ]);
        let report = ReportTranslator::new().translate(&rec);
        assert_eq!(report.publication_date, "n.d.");
        assert_eq!(report.publication_year, "");
    }

    #[test]
    fn test_scalar_kept_when_later_field_lacks_subfield() {
        let rec = record(vec![
            field("191", &[('a', "A/80/123")]),
            field("191", &[('b', "A/")]),
        ]);
        assert_eq!(ReportTranslator::new().translate(&rec).document_symbol, "A/80/123");
    }

    #[test]
    fn test_physical_description_always_overwrites() {
        let rec = record(vec![
            field("300", &[('a', "20 p."), ('c', "30 cm")]),
            field("300", &[('x', "none")]),
        ]);
        assert_eq!(ReportTranslator::new().translate(&rec).physical_description, "");

        let rec = record(vec![field("300", &[('a', "20 p."), ('c', "30 cm")])]);
        assert_eq!(
            ReportTranslator::new().translate(&rec).physical_description,
            "20 p. 30 cm"
        );
    }

    #[test]
    fn test_single_subfield_mappings() {
        let rec = record(vec![
            field("041", &[('a', "eng")]),
            field("520", &[('a', "Summary")]),
            field("856", &[('u', "https://undocs.org/A/80/123")]),
            field("020", &[('a', "9789211012345")]),
            field("022", &[('a', "0251-7329")]),
            field("490", &[('a', "Series A")]),
            field("830", &[('a', "Series B")]),
            field("500", &[('a', "Note")]),
            field("250", &[('a', "2nd ed.")]),
            field("710", &[('a', "UN. Secretary-General")]),
            field("655", &[('a', "Reports")]),
            field("999", &[('a', "unmapped")]),
        ]);
        let report = ReportTranslator::new().translate(&rec);
        assert_eq!(report.language, "eng");
        assert_eq!(report.description, "Summary");
        assert_eq!(report.url, "https://undocs.org/A/80/123");
        assert_eq!(report.isbn, "9789211012345");
        assert_eq!(report.issn, "0251-7329");
        assert_eq!(report.series, "Series B");
        assert_eq!(report.notes, "Note");
        assert_eq!(report.edition, "2nd ed.");
        assert_eq!(report.un_body, "UN. Secretary-General");
        assert_eq!(report.report_type, "Reports");
    }

    #[test]
    fn test_repeated_code_takes_first_value() {
        let rec = record(vec![field("856", &[('u', "https://first"), ('u', "https://second")])]);
        assert_eq!(ReportTranslator::new().translate(&rec).url, "https://first");
    }

    #[test]
    fn test_every_mapped_tag_is_unique() {
        let mut tags: Vec<&str> = DATA_FIELD_MAP.iter().map(|(t, _)| *t).collect();
        tags.sort_unstable();
        let len = tags.len();
        tags.dedup();
        assert_eq!(tags.len(), len);
    }

    #[test]
    fn test_custom_map() {
        const TITLE_ONLY: &[(&str, FieldExtractor)] = &[("245", title)];
        let translator = ReportTranslator::with_maps(&[], TITLE_ONLY);
        let rec = MarcRecord {
            control_fields: vec![ControlField {
                tag: "001".to_string(),
                data: "1".to_string(),
            }],
            data_fields: vec![field("245", &[('a', "T")]), field("041", &[('a', "eng")])],
            ..Default::default()
        };
        let report = translator.translate(&rec);
        assert_eq!(report.title, "T");
        assert_eq!(report.record_id, "");
        assert_eq!(report.language, "");
    }
}
