//! maki - ページを取得し、`data-include` をすべて解決した HTML を標準出力に書く
//!
//! ```text
//! maki https://example.com/index.html
//! maki https://example.com/index.html --date-format "%Y-%m-%d" --timeout-secs 10
//! RUST_LOG=maki_core=debug maki https://example.com/
//! ```
//!
//! ログは標準エラーへ出します（`RUST_LOG`、既定は `info`）。

use anyhow::Context;
use clap::Parser;
use maki_core::constants::DEFAULT_DATE_FORMAT;
use maki_core::include::IncludeResolver;
use maki_core::renderer::page::Page;
use net_tokio::http::HttpClient;
use net_tokio::http::HttpClientConfig;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "maki")]
#[command(about = "Inline data-include fragments into an HTML page")]
struct Cli {
    /// URL of the page to load
    url: String,

    /// strftime format for the #last-updated element
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Per-request timeout in seconds (no timeout if omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn http_config(&self) -> HttpClientConfig {
        let config = HttpClientConfig::default();
        match self.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let loader = HttpClient::new(cli.http_config())?;
    let (page_url, html) = loader
        .get_page(&cli.url)
        .await
        .with_context(|| format!("failed to load {}", cli.url))?;
    info!(url = %page_url, bytes = html.len(), "page loaded");

    let page = Page::new().with_date_format(&cli.date_format);
    page.receive_response(html);

    let fetcher = HttpClient::new(cli.http_config().with_base_url(page_url.as_str()))?;
    let resolver = IncludeResolver::new(fetcher);
    let passes = page.load_includes(&resolver).await;
    info!(passes, "includes resolved");

    println!("{}", page.html());
    Ok(())
}
