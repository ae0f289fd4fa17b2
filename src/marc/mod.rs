//! MARC record parsing and translation
//!
//! This module parses MARCXML documents from the UN Digital Library and
//! translates each record into the flat `Report` structure.

pub mod parser;
pub mod translator;

pub use parser::{parse_marcxml, ControlField, DataField, MarcRecord, Subfield};
pub use translator::ReportTranslator;
