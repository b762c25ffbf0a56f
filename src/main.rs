//! sale-scout - watches a retail listing for discounted products.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sale_scout::commands::{scan, ScanCommand, WatchCommand};
use sale_scout::config::{Config, OutputFormat};
use sale_scout::format::Formatter;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sale-scout",
    version,
    about = "Reports products priced below their original price on a retail listing",
    long_about = "Fetches a retail search-results page (rendering and expanding it in headless \
                  Chromium when available, crawling its pages otherwise) and reports every product \
                  whose current price is below its original price."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Listing URL to scan
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Output format (text, json, csv)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Never launch a headless browser
    #[arg(long, global = true)]
    no_browser: bool,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the listing once and print the report
    #[command(alias = "s")]
    Scan {
        /// Also send the report to the configured webhook
        #[arg(long)]
        notify: bool,
    },

    /// Scan on a schedule and notify after every run
    #[command(alias = "w")]
    Watch {
        /// Seconds between runs (minimum 10)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run the extraction heuristics over a saved HTML file
    #[command(alias = "p")]
    Parse {
        /// HTML file to parse
        file: PathBuf,

        /// Address the page was saved from, for resolving links
        #[arg(long, default_value = "https://localhost/")]
        base: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env()
            .add_directive(Level::WARN.into())
            .add_directive("sale_scout=info".parse()?)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(url) = cli.url {
        config.start_url = url;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if cli.no_browser {
        config.browser = false;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Scan { notify } => {
            let output = ScanCommand::new(config).execute(notify).await?;
            println!("{}", output);
        }

        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                config.interval_secs = secs;
            }
            WatchCommand::new(config).execute().await?;
        }

        Commands::Parse { file, base } => {
            let outcome = scan::parse_file(&file, &base)?;
            println!("{}", Formatter::new(config.format).format_outcome(&outcome));
        }
    }

    Ok(())
}
