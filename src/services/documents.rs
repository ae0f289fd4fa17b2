//! Match registry entities with locally stored annual report PDFs.
//!
//! PDF files are named `<ENTITY>_<anything>.pdf` and may sit anywhere under
//! the documents root.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::{
    error::AppResult,
    models::{Entity, EntityReport},
};

/// All PDF files under `root`, sorted
pub fn find_pdfs(root: &Path) -> AppResult<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.pdf",
        glob::Pattern::escape(&root.to_string_lossy())
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(|e| e.into_error())?);
    }
    paths.sort();
    tracing::debug!("Found {} PDF files under {}", paths.len(), root.display());
    Ok(paths)
}

/// Entity name encoded in a PDF file name: the stem up to the first `_`
pub fn entity_prefix(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    stem.split('_').next().filter(|s| !s.is_empty())
}

/// Pair every entity with its PDF, in registry order.
///
/// When several files carry the same entity prefix, the last one (in path
/// order) wins.
pub fn match_documents(entities: &[Entity], pdfs: &[PathBuf]) -> Vec<EntityReport> {
    let mut entity_to_path: HashMap<&str, String> = HashMap::new();
    for path in pdfs {
        let Some(prefix) = entity_prefix(path) else {
            continue;
        };
        if let Some(entity) = entities.iter().find(|e| e.entity == prefix) {
            entity_to_path.insert(entity.entity.as_str(), path.to_string_lossy().into_owned());
        }
    }

    let reports: Vec<EntityReport> = entities
        .iter()
        .map(|e| EntityReport::new(e, entity_to_path.get(e.entity.as_str()).map(String::as_str)))
        .collect();

    tracing::info!(
        "Matched {} of {} entities with a local PDF",
        reports.iter().filter(|r| r.has_pdf()).count(),
        reports.len()
    );
    reports
}
