use anyhow::Context;
use bassbroker_core::predict::DEFAULT_DAYS_TO_PREDICT;
use bassbroker_core::service::{ForecastService, SymbolForecast};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod history_file;

#[derive(Debug, Parser)]
#[command(name = "bassbroker_worker")]
struct Args {
    /// Comma-separated symbols to forecast (e.g. AAPL,MSFT).
    #[arg(long, value_delimiter = ',', required = true)]
    symbols: Vec<String>,

    /// Number of future trading days to forecast.
    #[arg(long, default_value_t = DEFAULT_DAYS_TO_PREDICT)]
    days: usize,

    /// Try the served model first, falling back to the statistical predictor.
    #[arg(long)]
    use_model: bool,

    /// Read closes from a JSON file ({"SYMBOL": [oldest, ..., newest]})
    /// instead of fetching quotes.
    #[arg(long)]
    history_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bassbroker_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.days >= 1, "--days must be >= 1");

    let service = ForecastService::from_settings(&settings)?;
    let history = match &args.history_file {
        Some(path) => Some(history_file::load(path)?),
        None => None,
    };

    let symbols = requested_symbols(&args.symbols);
    anyhow::ensure!(!symbols.is_empty(), "--symbols must name at least one symbol");

    let run_date = chrono::Utc::now().date_naive();
    let mut failures = 0usize;
    for &symbol in &symbols {
        let result = match &history {
            Some(map) => match map.get(symbol) {
                Some(series) => Ok(service
                    .forecast_series(symbol, series, args.days, args.use_model)
                    .await),
                None => Err(anyhow::anyhow!("{symbol} not present in history file")),
            },
            None => service
                .forecast_symbol(symbol, args.days, args.use_model)
                .await,
        };

        match result {
            Ok(out) => {
                log_forecast(&out, run_date);
                println!(
                    "{}",
                    serde_json::to_string(&out).context("failed to encode forecast")?
                );
            }
            Err(err) => {
                failures += 1;
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(%symbol, error = %err, "forecast failed");
                println!(
                    "{}",
                    serde_json::json!({"symbol": symbol, "error": format!("{err:#}")})
                );
            }
        }
    }

    anyhow::ensure!(
        failures < symbols.len(),
        "all {} symbol forecasts failed",
        symbols.len()
    );
    Ok(())
}

/// Trimmed, non-blank symbols in request order.
fn requested_symbols(raw: &[String]) -> Vec<&str> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn log_forecast(out: &SymbolForecast, run_date: chrono::NaiveDate) {
    if out.forecast.is_insufficient() {
        tracing::warn!(
            symbol = %out.symbol,
            history_len = out.history_len,
            "insufficient history; forecast is empty"
        );
        return;
    }

    tracing::info!(
        symbol = %out.symbol,
        %run_date,
        model_type = out.forecast.model_type.as_str(),
        direction = ?out.direction,
        confidence = out.forecast.confidence,
        pattern = ?out.pattern,
        "forecast computed"
    );
}

fn init_sentry(settings: &bassbroker_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
