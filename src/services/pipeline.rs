//! Catalog harvest pipeline: fetch, extract, classify, export.
//!
//! Stages run strictly in sequence. Exports are only written once the whole
//! collection has been built, so a fetch or parse failure produces no output,
//! and the two tables replace their targets together or not at all.

use std::path::PathBuf;

use crate::{
    config::{AppConfig, OutputConfig},
    error::AppResult,
    marc::{parse_marcxml, ReportTranslator},
    models::{Report, ReportCollection},
    services::{
        classifier::LabelClassifier,
        export::{export_report_tables, ExportFormat, ReportSink},
        fetcher::{CatalogFetcher, OutputFormat},
    },
};

/// Where the two report tables go
#[derive(Debug, Clone)]
pub struct ExportTargets {
    pub all: PathBuf,
    pub classified: PathBuf,
    pub format: ExportFormat,
}

impl ExportTargets {
    pub fn from_config(config: &OutputConfig) -> AppResult<Self> {
        let format = config
            .format
            .parse()
            .map_err(|e: String| config::ConfigError::Message(e))?;
        Ok(Self {
            all: config.all_reports_path(),
            classified: config.classified_path(),
            format,
        })
    }
}

/// Summary of a finished run
#[derive(Debug)]
pub struct HarvestOutcome {
    pub collection: ReportCollection,
    pub classified_count: usize,
    pub all_path: PathBuf,
    pub classified_path: PathBuf,
}

pub struct HarvestPipeline {
    fetcher: CatalogFetcher,
    translator: ReportTranslator,
    classifier: LabelClassifier,
}

impl HarvestPipeline {
    pub fn new(fetcher: CatalogFetcher, classifier: LabelClassifier) -> Self {
        Self {
            fetcher,
            translator: ReportTranslator::new(),
            classifier,
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self::new(
            CatalogFetcher::from_config(&config.catalog)?,
            LabelClassifier::from_config(&config.classifier),
        ))
    }

    pub fn fetcher(&self) -> &CatalogFetcher {
        &self.fetcher
    }

    /// Parse fetched MARCXML into a collection; all records or none
    pub fn process(&self, marcxml: &str) -> AppResult<ReportCollection> {
        let records = parse_marcxml(marcxml)?;
        let reports = self.translator.translate_all(&records);
        tracing::info!("Extracted {} reports", reports.len());
        Ok(ReportCollection::new(reports))
    }

    /// Fetch the search results as MARCXML and extract them
    pub async fn collect(&self, base_url: &str) -> AppResult<ReportCollection> {
        let marcxml = self.fetcher.fetch(base_url, OutputFormat::MarcXml).await?;
        self.process(&marcxml)
    }

    /// Write the full collection and the classified subset to two sinks.
    ///
    /// Returns the number of classified reports.
    pub fn export_to(
        &self,
        collection: &ReportCollection,
        all: &mut dyn ReportSink,
        classified: &mut dyn ReportSink,
    ) -> AppResult<usize> {
        let every: Vec<&Report> = collection.all().iter().collect();
        let selected = self.classifier.classify(collection);
        all.write_reports(&every)?;
        classified.write_reports(&selected)?;
        Ok(selected.len())
    }

    /// Run the whole pipeline and write both exports to disk
    pub async fn run(&self, base_url: &str, targets: &ExportTargets) -> AppResult<HarvestOutcome> {
        let collection = self.collect(base_url).await?;

        let every: Vec<&Report> = collection.all().iter().collect();
        let selected = self.classifier.classify(&collection);
        tracing::info!(
            "Found {} reports total, {} classified",
            every.len(),
            selected.len()
        );

        export_report_tables(
            &[
                (targets.all.as_path(), &every[..]),
                (targets.classified.as_path(), &selected[..]),
            ],
            targets.format,
        )?;

        let classified_count = selected.len();
        Ok(HarvestOutcome {
            collection,
            classified_count,
            all_path: targets.all.clone(),
            classified_path: targets.classified.clone(),
        })
    }
}
