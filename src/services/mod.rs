//! Harvest services

pub mod classifier;
pub mod documents;
pub mod entities;
pub mod export;
pub mod feed;
pub mod fetcher;
pub mod pipeline;

use crate::{config::AppConfig, error::AppResult};

/// Container for all services, sharing one HTTP session
pub struct Services {
    pub harvest: pipeline::HarvestPipeline,
    pub registry: entities::EntityRegistry,
    pub feed: feed::FeedHarvester,
}

impl Services {
    /// Create all services from configuration
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let fetcher = fetcher::CatalogFetcher::from_config(&config.catalog)?;
        let client = fetcher.client();
        Ok(Self {
            harvest: pipeline::HarvestPipeline::new(
                fetcher,
                classifier::LabelClassifier::from_config(&config.classifier),
            ),
            registry: entities::EntityRegistry::new(client.clone(), config.registry.clone()),
            feed: feed::FeedHarvester::new(client, config.feed.clone()),
        })
    }
}
