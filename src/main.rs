mod cli;
mod config;
mod elastic;
mod format;
mod openai;
mod render;
mod search;

pub const USER_AGENT: &str = concat!("search-compare/", env!("CARGO_PKG_VERSION"));

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use cli::Cli;
use config::Config;
use elastic::ElasticClient;
use openai::AzureOpenAiClient;
use render::{Layout, render};
use search::{Orchestrator, Query};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

type Comparer = Orchestrator<ElasticClient, AzureOpenAiClient>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("search_compare=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(index) = cli.index {
        config.elastic.index = index;
    }

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let orchestrator = Orchestrator::new(
        ElasticClient::new(http.clone(), &config.elastic),
        AzureOpenAiClient::new(http, &config.azure),
        config.pricing,
    )
    .with_page_size(usize::from(cli.size));

    info!(index = %config.elastic.index, layout = ?cli.layout, "search-compare ready");

    let width = usize::from(cli.width);
    match cli.query {
        Some(raw) => {
            let query = Query::parse(&raw)?;
            let result = orchestrator.compare(&query).await;
            print!("{}", render(&result, cli.layout, width));
        }
        None => interactive(&orchestrator, cli.layout, width).await?,
    }

    Ok(())
}

/// Reads one query per line until EOF; each line is a fresh, independent comparison.
async fn interactive(
    orchestrator: &Comparer,
    layout: Layout,
    width: usize,
) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("Search: ");
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(query) = submitted_query(&line) else {
            continue;
        };

        let result = orchestrator.compare(&query).await;
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", render(&result, layout, width))?;
        stdout.flush()?;
    }
    info!("input closed");
    Ok(())
}

/// Blank lines are skipped silently.
fn submitted_query(line: &str) -> Option<Query> {
    if line.trim().is_empty() {
        return None;
    }
    Query::parse(line).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_submit_nothing() {
        assert_eq!(submitted_query(""), None);
        assert_eq!(submitted_query("   \t"), None);
    }

    #[test]
    fn submitted_line_is_trimmed() {
        let query = submitted_query("  refund policy \n").unwrap();
        assert_eq!(query.as_str(), "refund policy");
    }
}
