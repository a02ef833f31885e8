//! Sumi-Spider main entry point
//!
//! Command-line crawler that collects quotes from a quotes.toscrape.com
//! style site, following the "Next" pagination link until the last page.

use anyhow::Context;
use clap::Parser as ClapParser;
use scraper::ElementRef;
use serde::Serialize;
use std::path::PathBuf;
use sumi_spider::config::{load_config, SpiderConfig};
use sumi_spider::crawler::html;
use sumi_spider::{
    ConsoleConsumer, CrawlController, JsonLinesConsumer, LogListener, ParseError, Parser, Request,
    Response, Spider, SqliteConsumer,
};
use tracing_subscriber::EnvFilter;

/// Sumi-Spider: collect quotes by crawling paginated pages
#[derive(ClapParser, Debug)]
#[command(name = "sumi-spider")]
#[command(version)]
#[command(about = "A small, polite quote crawler", long_about = None)]
struct Cli {
    /// URL of the first page
    #[arg(value_name = "SEED", default_value = "http://quotes.toscrape.com/")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of workers (overrides the configuration file)
    #[arg(long)]
    concurrency: Option<u32>,

    /// Append results as JSON Lines to this file instead of printing them
    #[arg(short, long, value_name = "FILE", conflicts_with = "database")]
    output: Option<PathBuf>,

    /// Store results in this SQLite database instead of printing them
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// One quote scraped from a page
#[derive(Debug, Clone, Serialize)]
struct Quote {
    text: String,
    author: String,
    tags: Vec<String>,
}

/// Extracts quotes and follows the pagination link
struct QuotesParser {
    max_pages: Option<u32>,
}

impl Parser<Quote> for QuotesParser {
    fn parse(
        &self,
        _request: &Request,
        response: &Response,
        crawl: &CrawlController,
    ) -> Result<Vec<Quote>, ParseError> {
        let document = response.document();
        let quote_selector = html::selector("div.quote")?;
        let text_selector = html::selector("span.text")?;
        let author_selector = html::selector("small.author")?;
        let tag_selector = html::selector("div.tags a.tag")?;

        let quotes = document
            .select(&quote_selector)
            .map(|quote| Quote {
                text: quote
                    .select(&text_selector)
                    .next()
                    .map(element_text)
                    .unwrap_or_default(),
                author: quote
                    .select(&author_selector)
                    .next()
                    .map(element_text)
                    .unwrap_or_default(),
                tags: quote.select(&tag_selector).map(element_text).collect(),
            })
            .collect();

        let page_limit_reached = self
            .max_pages
            .is_some_and(|max| crawl.depth() + 1 >= max);
        let next = html::select_attr(&document, "li.next a", "href")?;

        match next.first() {
            Some(href) if !page_limit_reached => {
                crawl.follow(response.url(), href);
            }
            _ => crawl.finish(),
        }

        Ok(quotes)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => SpiderConfig::default(),
    };

    if let Some(concurrency) = cli.concurrency {
        config.spider.concurrency = concurrency;
    }

    let spider = Spider::new(
        cli.seed.clone(),
        QuotesParser {
            max_pages: cli.max_pages,
        },
    )
    .with_config(config);

    spider.add_listener(LogListener::new())?;

    if let Some(path) = &cli.output {
        let consumer = JsonLinesConsumer::new(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        spider.add_consumer(consumer)?;
    } else if let Some(path) = &cli.database {
        let consumer = SqliteConsumer::new(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        spider.add_consumer(consumer)?;
    } else {
        spider.add_consumer(ConsoleConsumer::new())?;
    }

    let report = spider.run().await.context("crawl failed")?;

    if !cli.quiet {
        eprintln!(
            "Crawled {} page(s), {} quote(s), {} error(s) in {:.1}s",
            report.fetched,
            report.results,
            report.errors,
            report.duration().as_secs_f64()
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "sumi_spider=info,warn",
            1 => "sumi_spider=debug,info",
            2 => "sumi_spider=trace,debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
