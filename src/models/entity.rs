//! Reporting entity models (entity registry and PDF correlation).

use serde::{Deserialize, Serialize};

/// One row of the entity registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Short name, e.g. `UNICEF`; also the prefix of local PDF file names
    pub entity: String,
    pub entity_long: String,
    pub annual_report_link: String,
}

/// A registry entity with the local annual report PDF matched to it, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub entity: String,
    pub entity_long: String,
    pub annual_report_link: String,
    /// Path of the matched PDF, empty when none was found
    pub pdf_path: String,
}

impl EntityReport {
    pub fn new(entity: &Entity, pdf_path: Option<&str>) -> Self {
        Self {
            entity: entity.entity.clone(),
            entity_long: entity.entity_long.clone(),
            annual_report_link: entity.annual_report_link.clone(),
            pdf_path: pdf_path.unwrap_or_default().to_string(),
        }
    }

    pub fn has_pdf(&self) -> bool {
        !self.pdf_path.is_empty()
    }
}
