use std::{process, time::Duration};

use clap::Parser;
use quire_navigator::{
    Document, HeadlessDocument, HttpPageFetcher, NavigationKind, NavigationOutcome, Navigator,
    NavigatorConfig,
};
use tracing::error;
use tracing_subscriber::EnvFilter;
use url::Url;

const BACK: &str = "back";

/// Walk a quire site the way the in-page navigator would.
#[derive(Debug, Parser)]
#[command(name = "quire-navigator", version)]
struct Cli {
    /// Page to load first.
    #[arg(value_name = "URL")]
    start: Url,

    /// Paths or URLs to visit in order; `back` steps back through history.
    #[arg(value_name = "VISIT")]
    visits: Vec<String>,

    /// Pages kept in the navigation cache.
    #[arg(long, default_value_t = quire_navigator::DEFAULT_MAX_CACHE_SIZE)]
    max_cache_size: usize,

    /// Deadline for each in-place navigation, in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    if let Err(err) = run(Cli::parse()).await {
        error!(error = %err, "navigation session failed");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = HttpPageFetcher::new()?;
    let html = fetcher.fetch_document(&cli.start).await?;
    let document = HeadlessDocument::parse(cli.start.clone(), &html)?;

    let config = NavigatorConfig {
        max_cache_size: cli.max_cache_size,
        timeout: Duration::from_millis(cli.timeout_ms),
    };
    let mut navigator = Navigator::new(config, fetcher, document);
    println!("loaded {} ({})", cli.start, navigator.document().metadata().title);

    for visit in &cli.visits {
        let outcome = if visit == BACK {
            let Some(url) = navigator.document_mut().go_back() else {
                println!("back: no earlier history entry");
                continue;
            };
            navigator.navigate(&url, NavigationKind::Back).await
        } else {
            match navigator.follow_link(visit, None).await {
                Some(outcome) => outcome,
                None => {
                    println!("{visit}: not handled in place");
                    continue;
                }
            }
        };
        report(&outcome, &navigator.document().metadata().title);

        if !outcome.is_completed() {
            break;
        }
    }

    Ok(())
}

fn report(outcome: &NavigationOutcome, title: &str) {
    match outcome {
        NavigationOutcome::Completed { url, source } => {
            println!("{url}: in place from {source:?} ({title})");
        }
        NavigationOutcome::Fallback { url, reason } => {
            println!("{url}: full load ({reason})");
        }
    }
}
