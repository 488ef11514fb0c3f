//! Houses CLI
//!
//! Local entry point for acquiring and triaging property listings.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use houses::{
    error::{AppError, Result},
    models::{Config, Status},
    services::{HouseService, HttpFetcher, PropertyFetcher, extract_models},
};

/// Houses - property listing tracker
#[derive(Parser, Debug)]
#[command(name = "houses", version, about = "Track and triage property listings")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "houses.toml")]
    config: PathBuf,

    /// Site the listing ids belong to
    #[arg(long, default_value = "rightmove")]
    site: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a listing, fetching it if it is not stored yet
    Get { id: String },

    /// Fetch and store one or more listings
    Add {
        ids: Vec<String>,

        /// Bucket to file the listings under
        #[arg(long, default_value = "to-review")]
        status: Status,
    },

    /// List stored listings in a bucket
    List { status: Status },

    /// Move a listing (id or key) to another bucket
    Move { id: String, status: Status },

    /// Download a listing's images concurrently
    Images { id: String },

    /// Delete a stored listing (id or key)
    Delete { id: String },

    /// Show the page models embedded in a live listing page
    Models { id: String },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Accept either a full key or a site listing id.
fn key_for(service: &HouseService, site: &str, id: &str) -> Result<String> {
    if id.contains("://") {
        Ok(id.to_string())
    } else {
        service.property_url(site, id)
    }
}

/// Validate configuration and open the service it describes.
async fn open(config: &Config) -> Result<HouseService> {
    config.validate()?;
    HouseService::from_config(config).await
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let site = cli.site.as_str();

    match cli.command {
        Command::Get { id } => {
            let service = open(&config).await?;
            let record = service.get_property(site, &id).await?;
            println!("{} [{}]", record.key, record.status);
            println!("{}", serde_json::to_string_pretty(&record.data)?);
        }

        Command::Add { ids, status } => {
            let ids: Vec<&str> = ids.iter().flat_map(|s| s.split_whitespace()).collect();
            if ids.is_empty() {
                return Err(AppError::validation("No listing ids given"));
            }

            let service = open(&config).await?;
            let items = service.add_properties(site, &ids, status).await;
            let failures = items.iter().filter(|item| item.result.is_err()).count();
            for item in &items {
                match &item.result {
                    Ok(record) => println!("✓ {} -> {}", item.id, record.status),
                    Err(e) => println!("✗ {}: {}", item.id, e),
                }
            }
            log::info!("Added {} of {} listings", items.len() - failures, items.len());
        }

        Command::List { status } => {
            let service = open(&config).await?;
            let rows = service.list_by_status(site, status).await?;
            println!("{} ({})", status.title(), rows.len());
            for row in rows {
                println!(
                    "  {:<12} {}",
                    row.id_text(),
                    row.address_text()
                        .or_else(|| row.description_text())
                        .unwrap_or_default()
                );
            }
        }

        Command::Move { id, status } => {
            let service = open(&config).await?;
            let key = key_for(&service, site, &id)?;
            service.move_property(&key, status).await?;
            println!("Moved {} to {}", key, status);
        }

        Command::Images { id } => {
            let service = open(&config).await?;
            let key = key_for(&service, site, &id)?;
            service.select_property(&key);

            let mut images = service.fetch_images(site, &key).await?;
            let mut count = 0usize;
            while let Some(item) = images.next().await {
                count += 1;
                match item.result {
                    Ok(bytes) => println!("✓ {} ({} bytes)", item.url, bytes.len()),
                    Err(e) => println!("✗ {}", e),
                }
            }
            if count == 0 {
                log::warn!("No images stored for {}", key);
            }
        }

        Command::Delete { id } => {
            let service = open(&config).await?;
            let key = key_for(&service, site, &id)?;
            service.delete_property(&key).await?;
            println!("Deleted {}", key);
        }

        Command::Models { id } => {
            let service = open(&config).await?;
            let url = service.property_url(site, &id)?;
            let fetcher = HttpFetcher::new(&config.fetcher, config.rightmove.hosts.clone())?;
            let content = fetcher.fetch(&url).await?;
            for (name, model) in extract_models(&content) {
                println!("{} ({} keys)", name, model.len());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
