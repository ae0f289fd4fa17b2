//! Harvest pipeline integration tests

use async_trait::async_trait;
use std::fs;
use std::sync::{Arc, Mutex};

use un_reports::{
    error::{AppError, AppResult},
    services::{
        classifier::LabelClassifier,
        export::ExportFormat,
        fetcher::{CatalogFetcher, HttpClient, HttpResponse, OutputFormat},
        pipeline::{ExportTargets, HarvestPipeline},
    },
};

const SEARCH_URL: &str =
    "https://digitallibrary.un.org/search?ln=en&p=year:2025&sf=latest+first&so=d&rg=100&of=hb&fct__1=Reports";

const CATALOG_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<collection xmlns="http://www.loc.gov/MARC21/slim">
<record>
  <leader>00000cam a2200000 a 4500</leader>
  <controlfield tag="001">4082001</controlfield>
  <datafield tag="191" ind1=" " ind2=" ">
    <subfield code="a">A/80/123</subfield>
  </datafield>
  <datafield tag="245" ind1="1" ind2="0">
    <subfield code="a">Oceans and the law of the sea :</subfield>
    <subfield code="b">report</subfield>
  </datafield>
  <datafield tag="260" ind1=" " ind2=" ">
    <subfield code="a">[New York] :</subfield>
    <subfield code="b">UN,</subfield>
    <subfield code="c">15 March 2025</subfield>
  </datafield>
  <datafield tag="650" ind1=" " ind2="7">
    <subfield code="a">LAW OF THE SEA</subfield>
  </datafield>
  <datafield tag="650" ind1=" " ind2="7">
    <subfield code="a">MARINE RESOURCES</subfield>
  </datafield>
</record>
<record>
  <controlfield tag="001">4082002</controlfield>
  <datafield tag="110" ind1="2" ind2=" ">
    <subfield code="a">UN. Secretary-General</subfield>
  </datafield>
  <datafield tag="245" ind1="1" ind2="0">
    <subfield code="a">Children and armed conflict</subfield>
  </datafield>
  <datafield tag="191" ind1=" " ind2=" ">
    <subfield code="a">S/2025/247</subfield>
  </datafield>
</record>
<record>
  <controlfield tag="001">4082003</controlfield>
  <datafield tag="245" ind1="1" ind2="0">
    <subfield code="a">World economic situation and prospects 2025</subfield>
  </datafield>
  <datafield tag="264" ind1=" " ind2="1">
    <subfield code="c">n.d.</subfield>
  </datafield>
  <datafield tag="710" ind1="2" ind2=" ">
    <subfield code="a">UN. Department of Economic and Social Affairs</subfield>
  </datafield>
</record>
</collection>"#;

/// Catalog stand-in answering every request with the same response
struct FakeCatalog {
    status: u16,
    body: String,
    requests: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HttpClient for FakeCatalog {
    async fn get(&self, url: &str) -> AppResult<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(HttpResponse::new(self.status, self.body.clone()))
    }
}

fn pipeline(catalog: Arc<FakeCatalog>) -> HarvestPipeline {
    HarvestPipeline::new(CatalogFetcher::new(catalog), LabelClassifier::default())
}

fn targets(dir: &tempfile::TempDir) -> ExportTargets {
    ExportTargets {
        all: dir.path().join("latest_un_reports_2025.csv"),
        classified: dir.path().join("latest_sg_reports_2025.csv"),
        format: ExportFormat::Csv,
    }
}

#[tokio::test]
async fn test_harvest_writes_both_exports() {
    let catalog = FakeCatalog::new(200, CATALOG_RESPONSE);
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&dir);

    let outcome = pipeline(catalog.clone()).run(SEARCH_URL, &targets).await.unwrap();

    assert_eq!(outcome.collection.len(), 3);
    assert_eq!(outcome.classified_count, 2);

    let requests = catalog.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("of=xm"));

    let first = &outcome.collection.all()[0];
    assert_eq!(first.record_id, "4082001");
    assert_eq!(first.title, "Oceans and the law of the sea : report");
    assert_eq!(first.publication_year, "2025");
    assert_eq!(first.subject, vec!["LAW OF THE SEA", "MARINE RESOURCES"]);
    assert_eq!(outcome.collection.all()[2].publication_year, "");

    let all = fs::read_to_string(&targets.all).unwrap();
    assert_eq!(all.lines().count(), 4);
    assert!(all.contains("LAW OF THE SEA; MARINE RESOURCES"));

    let classified = fs::read_to_string(&targets.classified).unwrap();
    let ids: Vec<&str> = classified
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["4082001", "4082002"]);
}

#[tokio::test]
async fn test_service_unavailable_produces_nothing() {
    let catalog = FakeCatalog::new(503, "");
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&dir);

    let err = pipeline(catalog).run(SEARCH_URL, &targets).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Fetch {
            status_code: 503,
            body_length: 0
        }
    ));
    assert!(!targets.all.exists());
    assert!(!targets.classified.exists());
}

#[tokio::test]
async fn test_unwritable_classified_export_keeps_full_export_off_disk() {
    let catalog = FakeCatalog::new(200, CATALOG_RESPONSE);
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&dir);
    fs::create_dir_all(targets.classified.join("occupied")).unwrap();

    let result = pipeline(catalog).run(SEARCH_URL, &targets).await;

    assert!(matches!(result, Err(AppError::Io(_))));
    assert!(!targets.all.exists());
    assert!(targets.classified.join("occupied").is_dir());
}

#[tokio::test]
async fn test_blocked_html_page_is_a_parse_error() {
    let catalog = FakeCatalog::new(200, "<html><body>Please enable JavaScript</body></html>");
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&dir);

    let err = pipeline(catalog).run(SEARCH_URL, &targets).await.unwrap_err();

    assert!(matches!(err, AppError::Parse { .. }));
    assert!(!targets.all.exists());
}

#[tokio::test]
async fn test_truncated_response_fails_whole_batch() {
    let truncated = &CATALOG_RESPONSE[..CATALOG_RESPONSE.len() / 2];
    let catalog = FakeCatalog::new(200, truncated);

    let err = pipeline(catalog).collect(SEARCH_URL).await.unwrap_err();
    assert!(matches!(err, AppError::Parse { .. }));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(&dir);

    pipeline(FakeCatalog::new(200, CATALOG_RESPONSE))
        .run(SEARCH_URL, &targets)
        .await
        .unwrap();
    let first = fs::read(&targets.all).unwrap();

    pipeline(FakeCatalog::new(200, CATALOG_RESPONSE))
        .run(SEARCH_URL, &targets)
        .await
        .unwrap();
    let second = fs::read(&targets.all).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_raw_fetch_in_alternative_format() {
    let catalog = FakeCatalog::new(200, "[]");
    let fetcher = CatalogFetcher::new(catalog.clone());

    let body = fetcher.fetch(SEARCH_URL, OutputFormat::Json).await.unwrap();

    assert_eq!(body, "[]");
    assert!(catalog.requests.lock().unwrap()[0].contains("of=recjson"));
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_live_catalog_harvest() {
    let config = un_reports::AppConfig::default();
    let pipeline = HarvestPipeline::from_config(&config).unwrap();

    let collection = pipeline.collect(&config.catalog.base_url).await.unwrap();
    assert!(!collection.is_empty());
}
