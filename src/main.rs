//! UN reports harvester - command line entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use un_reports::{
    config::AppConfig,
    logging,
    services::{
        documents::{find_pdfs, match_documents},
        entities::EntityRegistry,
        export::write_json_file,
        fetcher::OutputFormat,
        pipeline::ExportTargets,
        Services,
    },
};

#[derive(Parser)]
#[command(name = "un-reports")]
#[command(about = "Collect and classify UN report metadata")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch catalog records, extract reports and export the full and Secretary-General sets
    Harvest {
        /// Catalog search URL in HTML format (`of=hb`)
        #[arg(long)]
        url: Option<String>,
        /// Export format: csv or json
        #[arg(long)]
        format: Option<String>,
        /// Skip the home page visit before the catalog request
        #[arg(long)]
        no_warm_up: bool,
    },
    /// Fetch raw catalog results in any export format
    Fetch {
        /// marcxml, json, dublin_core, csv, rss or html (defaults to `catalog.format`)
        #[arg(long)]
        format: Option<OutputFormat>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        no_warm_up: bool,
    },
    /// Download and normalize the entity registry
    Entities {
        #[arg(long)]
        url: Option<String>,
    },
    /// Match registry entities with local annual report PDFs
    MatchPdfs {
        /// Directory searched for PDF files
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Harvest the latest publications RSS feed
    Feed {
        #[arg(long)]
        url: Option<String>,
        /// Do not visit each item's landing page
        #[arg(long)]
        no_scrape: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Failed to load configuration")?;

    logging::init(&config.logging);
    tracing::info!("Starting un-reports v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Harvest {
            url,
            format,
            no_warm_up,
        } => {
            if no_warm_up {
                config.catalog.warm_up = false;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            let base_url = url.unwrap_or_else(|| config.catalog.base_url.clone());
            let targets = ExportTargets::from_config(&config.output)?;
            let services = Services::new(&config)?;

            let outcome = match services.harvest.run(&base_url, &targets).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if e.is_fetch_failure() {
                        tracing::error!("Catalog request failed, no exports written: {}", e);
                    }
                    return Err(anyhow::Error::new(e).context("Harvest failed"));
                }
            };

            println!("Found {} reports total", outcome.collection.len());
            println!("Found {} Secretary-General reports", outcome.classified_count);
            println!("All reports saved to {}", outcome.all_path.display());
            println!(
                "Secretary-General reports saved to {}",
                outcome.classified_path.display()
            );
        }
        Commands::Fetch {
            format,
            url,
            out,
            no_warm_up,
        } => {
            if no_warm_up {
                config.catalog.warm_up = false;
            }
            let format = match format {
                Some(format) => format,
                None => config.catalog.fetch_format()?,
            };
            let base_url = url.unwrap_or_else(|| config.catalog.base_url.clone());
            let services = Services::new(&config)?;

            let body = services
                .harvest
                .fetcher()
                .fetch(&base_url, format)
                .await
                .with_context(|| format!("Failed to fetch {} data", format))?;

            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out, &body)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Saved {} bytes of {} data to {}", body.len(), format, out.display());
        }
        Commands::Entities { url } => {
            let services = Services::new(&config)?;
            let entities = services.registry.download(url.as_deref()).await?;
            services.registry.save(&entities)?;
            println!(
                "Saved {} entities to {}",
                entities.len(),
                config.registry.output_file.display()
            );
        }
        Commands::MatchPdfs { root } => {
            let root = root.unwrap_or_else(|| config.documents.root.clone());
            let entities = EntityRegistry::load_local(&config.registry.output_file)
                .with_context(|| {
                    format!(
                        "Failed to read entity registry {}",
                        config.registry.output_file.display()
                    )
                })?;
            let pdfs = find_pdfs(&root)?;
            let reports = match_documents(&entities, &pdfs);
            write_json_file(&config.documents.output_file, &reports)?;

            let matched = reports.iter().filter(|r| r.has_pdf()).count();
            println!(
                "Matched {}/{} entities, saved to {}",
                matched,
                reports.len(),
                config.documents.output_file.display()
            );
        }
        Commands::Feed { url, no_scrape } => {
            let scrape = config.feed.scrape_pages && !no_scrape;
            let services = Services::new(&config)?;
            let items = services.feed.harvest(url.as_deref(), scrape).await?;
            write_json_file(&config.feed.output_file, &items)?;
            println!(
                "Saved {} feed items to {}",
                items.len(),
                config.feed.output_file.display()
            );
        }
    }

    Ok(())
}
