use anyhow::{Context, Result};
use car_scout::export::{save_csv, save_report};
use car_scout::scrapers::{MarketplaceScraper, OtomotoScraper, ScrapeError, SearchTarget};
use car_scout::{ScoutConfig, MAKES};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "car-scout", about = "Vehicle listing scraper for the Otomoto marketplace")]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "CAR_SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Save page HTML and screenshots here
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the known makes
    Makes,
    /// List models offered for a make
    Models { make: String },
    /// List generations offered for a make and model
    Generations { make: String, model: String },
    /// Print the search URL for a make, model and generation
    Url {
        make: String,
        model: String,
        #[arg(long)]
        generation: Option<String>,
    },
    /// Crawl all result pages and write the listings
    Scrape {
        make: String,
        model: String,
        #[arg(long)]
        generation: Option<String>,
        /// Stop after this many result pages
        #[arg(long)]
        max_pages: Option<usize>,
        #[arg(long, default_value = "scraped_auctions.csv")]
        output: PathBuf,
        /// Also write a JSON crawl report
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn target(make: String, model: String, generation: Option<String>) -> SearchTarget {
    let target = SearchTarget::new(make, model);
    match generation {
        Some(g) => target.with_generation(g),
        None => target,
    }
}

fn load_config(cli: &Cli) -> Result<ScoutConfig> {
    let mut config = match &cli.config {
        Some(path) => ScoutConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScoutConfig::default(),
    };
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(dir) = &cli.debug_dir {
        config.debug_dir = Some(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Makes => {
            for make in MAKES {
                println!("{make}");
            }
        }
        Command::Url {
            make,
            model,
            generation,
        } => {
            let scraper = OtomotoScraper::new(&config)?;
            match scraper.search_url(&target(make, model, generation)) {
                Ok(url) => println!("{url}"),
                Err(e) => {
                    error!("Cannot build URL: {}", e);
                    return Ok(ExitCode::from(2));
                }
            }
        }
        Command::Models { make } => {
            let scraper = OtomotoScraper::new(&config)?;
            let models = scraper.list_models(&make).await;
            if models.is_empty() {
                warn!("No models found for {}", make);
            }
            for model in models {
                println!("{model}");
            }
        }
        Command::Generations { make, model } => {
            let scraper = OtomotoScraper::new(&config)?;
            let generations = scraper.list_generations(&make, &model).await;
            if generations.is_empty() {
                warn!("No generations found for {} {}", make, model);
            }
            for generation in generations {
                println!("{generation}");
            }
        }
        Command::Scrape {
            make,
            model,
            generation,
            max_pages,
            output,
            report,
        } => {
            if let Some(max_pages) = max_pages {
                config.crawl.max_pages = max_pages;
            }
            let scraper = OtomotoScraper::new(&config)?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted; finishing the current page");
                    on_signal.cancel();
                }
            });

            info!("🚗 Car Scout - {} scraper", scraper.source_name());
            let crawl = match scraper.scrape(&target(make, model, generation), cancel).await {
                Ok(crawl) => crawl,
                Err(ScrapeError::Url(e)) => {
                    error!("Cannot build URL: {}", e);
                    return Ok(ExitCode::from(2));
                }
                Err(e) => return Err(e.into()),
            };

            save_csv(&crawl.records, &output)?;
            info!("💾 Saved {} listings to {}", crawl.records.len(), output.display());

            if let Some(path) = report {
                save_report(&crawl, &path)?;
                info!("💾 Saved crawl report to {}", path.display());
            }

            if crawl.is_aborted() {
                error!("Crawl did not finish: {:?}", crawl.outcome);
                return Ok(ExitCode::FAILURE);
            }
            if crawl.is_empty_result() {
                println!("no data");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
