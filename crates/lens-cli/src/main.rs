//! Terminal dashboard for a single stock ticker

mod render;

use clap::Parser;
use lens_dashboard::api::{GammaMarketsProvider, HttpNewsProvider, YahooMarketData};
use lens_dashboard::{DashboardConfig, DashboardEngine, SessionState};
use lens_llm::providers::GeminiProvider;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tickerlens")]
#[command(about = "Terminal dashboard for a single stock ticker", long_about = None)]
struct Args {
    /// Ticker to render; omit for an interactive prompt
    ticker: Option<String>,

    /// Model id for reasoning sections
    #[arg(long)]
    reasoning_model: Option<String>,

    /// Model id for fast extraction sections
    #[arg(long)]
    fast_model: Option<String>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lens_utils::init_tracing();

    let args = Args::parse();

    let mut builder = DashboardConfig::builder();
    if let Some(model) = &args.reasoning_model {
        builder = builder.reasoning_model(model);
    }
    if let Some(model) = &args.fast_model {
        builder = builder.fast_model(model);
    }
    if let Some(endpoint) = lens_utils::optional_env("TICKERLENS_NEWS_ENDPOINT") {
        builder = builder.news_endpoint(endpoint);
    }
    if let Some(endpoint) = lens_utils::optional_env("TICKERLENS_MARKETS_ENDPOINT") {
        builder = builder.markets_endpoint(endpoint);
    }
    let config = builder.build()?;

    let model = Arc::new(GeminiProvider::from_env()?);
    let market = Arc::new(YahooMarketData::new(config.request_timeout)?);
    let news = Arc::new(HttpNewsProvider::new(
        &config.news_endpoint,
        config.request_timeout,
    )?);
    let markets = Arc::new(GammaMarketsProvider::new(
        &config.markets_endpoint,
        config.request_timeout,
    )?);

    let mut session = SessionState::new(config.payload_cache_ttl);
    let engine = DashboardEngine::new(config, model, market, news, markets);

    if let Some(ticker) = args.ticker {
        render_one(&engine, &mut session, &ticker, args.json).await;
        return Ok(());
    }

    // Interactive mode: one dashboard per entered ticker, blank line to quit
    println!("Enter a ticker (blank to quit):");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let ticker = line.trim();
        if ticker.is_empty() {
            break;
        }
        render_one(&engine, &mut session, ticker, args.json).await;
    }

    Ok(())
}

async fn render_one(
    engine: &DashboardEngine,
    session: &mut SessionState,
    ticker: &str,
    json: bool,
) {
    info!(ticker, "rendering dashboard");
    let report = engine.render(session, ticker).await;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(error) => eprintln!("failed to serialize report: {error}"),
        }
        return;
    }
    render::print_report(&report);
}
