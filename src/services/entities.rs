//! Entity registry: download, normalize and store the list of UN reporting entities.

use std::path::Path;
use std::sync::Arc;

use crate::{
    config::RegistryConfig,
    error::{AppError, AppResult},
    models::Entity,
    services::{export::write_csv_file, fetcher::HttpClient},
};

/// Columns kept from the registry spreadsheet
pub const ENTITY_COLUMNS: [&str; 3] = ["entity", "entity_long", "annual_report_link"];

#[derive(Clone)]
pub struct EntityRegistry {
    client: Arc<dyn HttpClient>,
    config: RegistryConfig,
}

impl EntityRegistry {
    pub fn new(client: Arc<dyn HttpClient>, config: RegistryConfig) -> Self {
        Self { client, config }
    }

    /// Download the registry spreadsheet (CSV export) and normalize it
    pub async fn download(&self, url: Option<&str>) -> AppResult<Vec<Entity>> {
        let url = url.unwrap_or(&self.config.url);
        tracing::info!("Downloading entity registry");
        tracing::debug!("Registry URL: {}", url);

        let body = self.client.get(url).await?.into_body()?;
        let entities = parse_registry(&body, &self.config.excluded_entity)?;
        tracing::info!("Entity registry has {} entities", entities.len());
        Ok(entities)
    }

    /// Write entities to the configured registry file
    pub fn save(&self, entities: &[Entity]) -> AppResult<()> {
        write_csv_file(&self.config.output_file, &ENTITY_COLUMNS, entities)?;
        tracing::info!(
            "Saved {} entities to {}",
            entities.len(),
            self.config.output_file.display()
        );
        Ok(())
    }

    /// Read a registry file previously written by [`EntityRegistry::save`]
    pub fn load_local(path: &Path) -> AppResult<Vec<Entity>> {
        let text = std::fs::read_to_string(path)?;
        parse_registry(&text, "")
    }
}

/// Lower-case a spreadsheet header and turn spaces and hyphens into underscores
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Parse registry CSV text.
///
/// Rows whose entity equals `excluded` are dropped (nothing is dropped when
/// `excluded` is empty); the rest are sorted by entity.
pub fn parse_registry(csv_text: &str, excluded: &str) -> AppResult<Vec<Entity>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let index_of = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| AppError::Registry(format!("missing column '{}'", column)))
    };
    let entity_idx = index_of("entity")?;
    let long_idx = index_of("entity_long")?;
    let link_idx = index_of("annual_report_link")?;

    let mut entities = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();
        let entity = Entity {
            entity: cell(entity_idx),
            entity_long: cell(long_idx),
            annual_report_link: cell(link_idx),
        };
        if !excluded.is_empty() && entity.entity == excluded {
            continue;
        }
        entities.push(entity);
    }

    entities.sort_by(|a, b| a.entity.cmp(&b.entity));
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fetcher::{HttpResponse, MockHttpClient};

    const SHEET: &str = "\
Entity,Entity Long,Annual Report Link,Entity-Type
UNICEF,United Nations Children's Fund,https://www.unicef.org/reports,Fund
Other,Miscellaneous,,
UNDP,United Nations Development Programme,https://www.undp.org/annual-report,Programme
";

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Annual Report Link"), "annual_report_link");
        assert_eq!(normalize_header("Entity-Type"), "entity_type");
        assert_eq!(normalize_header("entity"), "entity");
    }

    #[test]
    fn test_parse_registry_filters_and_sorts() {
        let entities = parse_registry(SHEET, "Other").unwrap();
        let names: Vec<&str> = entities.iter().map(|e| e.entity.as_str()).collect();
        assert_eq!(names, vec!["UNDP", "UNICEF"]);
        assert_eq!(entities[1].entity_long, "United Nations Children's Fund");
        assert_eq!(entities[1].annual_report_link, "https://www.unicef.org/reports");
    }

    #[test]
    fn test_parse_registry_missing_column() {
        let err = parse_registry("Entity,Name\nUNDP,x\n", "Other").unwrap_err();
        match err {
            AppError::Registry(msg) => assert!(msg.contains("entity_long")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_and_save_round_trip() {
        let mut client = MockHttpClient::new();
        client
            .expect_get()
            .returning(|_| Ok(HttpResponse::new(200, SHEET)));

        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig {
            output_file: dir.path().join("input").join("entities.csv"),
            ..Default::default()
        };
        let registry = EntityRegistry::new(Arc::new(client), config.clone());

        let entities = registry.download(None).await.unwrap();
        registry.save(&entities).unwrap();

        let reloaded = EntityRegistry::load_local(&config.output_file).unwrap();
        assert_eq!(reloaded, entities);
    }

    #[tokio::test]
    async fn test_download_failure() {
        let mut client = MockHttpClient::new();
        client
            .expect_get()
            .returning(|_| Ok(HttpResponse::new(404, "Not Found")));

        let registry = EntityRegistry::new(Arc::new(client), RegistryConfig::default());
        assert!(matches!(
            registry.download(None).await,
            Err(AppError::Fetch { status_code: 404, .. })
        ));
    }
}
