use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use vaxwatch::config::{Config, DEFAULT_CONFIG_PATH};
use vaxwatch::notifier::Notifier;
use vaxwatch::scraper::WebScraper;
use vaxwatch::store::UpdateStore;
use vaxwatch::{RunOutcome, Watcher};

#[derive(Parser)]
#[command(name = "vaxwatch")]
#[command(about = "Watches the NHS vaccine booking page for updates", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        short = 'c',
        long = "config",
        default_value = DEFAULT_CONFIG_PATH,
        global = true,
        help = "Path to the configuration file"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the booking page, store a newer update and send a notification (default)
    Run {
        #[arg(long, help = "Page to check instead of the NHS booking page")]
        url: Option<String>,

        #[arg(long, help = "Store new updates without sending a notification")]
        no_notify: bool,
    },
    /// Fetch and print the current update without touching the store
    Check {
        #[arg(long, help = "Page to check instead of the NHS booking page")]
        url: Option<String>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// List stored updates, newest first
    History {
        #[arg(
            long,
            help = "Maximum number of updates to show",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        limit: Option<u16>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(path: &Path) -> Config {
    Config::load(path).unwrap_or_else(|e| {
        log::error!("{}", e);
        process::exit(1);
    })
}

fn open_store(config: &Config) -> UpdateStore {
    UpdateStore::open(&config.database.engine).unwrap_or_else(|e| {
        log::error!("Error opening update store: {}", e);
        process::exit(1);
    })
}

fn create_scraper(url: Option<String>) -> WebScraper {
    match url {
        Some(url) => WebScraper::with_url(url),
        None => WebScraper::new(),
    }
    .unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .init();

    let command = cli.command.unwrap_or(Commands::Run {
        url: None,
        no_notify: false,
    });

    match command {
        Commands::Run { url, no_notify } => {
            let config = load_config(&cli.config);
            let scraper = create_scraper(url);
            let notifier = (!no_notify)
                .then(|| Notifier::new(&config.notifications, scraper.page_url()));

            let outcome = Watcher::new(&scraper, &config.database.engine, notifier.as_ref())
                .run_once()
                .await
                .unwrap_or_else(|e| {
                    log::error!("Run failed: {}", e);
                    process::exit(1);
                });

            match outcome {
                RunOutcome::Unavailable => {
                    log::error!("Could not determine the latest update from {}", scraper.page_url());
                    process::exit(1);
                }
                RunOutcome::Unchanged(update) => {
                    log::info!("Latest update is still {}", update.date);
                }
                RunOutcome::NewUpdate { update, notified } => {
                    log::info!("Recorded update {} (notified: {})", update, notified);
                }
            }
        }

        Commands::Check { url, format } => {
            let scraper = create_scraper(url);

            let update = scraper
                .fetch_latest_update()
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching update: {}", e);
                    process::exit(1);
                })
                .unwrap_or_else(|| {
                    log::error!("Could not determine the latest update from {}", scraper.page_url());
                    process::exit(1);
                });

            match format {
                OutputFormat::Json => serialize_json(&update),
                OutputFormat::Text => println!("{}", update),
            }
        }

        Commands::History { limit, format } => {
            let config = load_config(&cli.config);
            let store = open_store(&config);

            let history = store
                .history(limit.map(usize::from))
                .unwrap_or_else(|e| {
                    log::error!("Error reading history: {}", e);
                    process::exit(1);
                });

            match format {
                OutputFormat::Json => serialize_json(&history),
                OutputFormat::Text => {
                    if history.is_empty() {
                        println!("No updates stored yet.");
                    } else {
                        for (i, update) in history.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, update);
                        }
                    }
                }
            }
        }
    }
}
