use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bassbroker_core::domain::series::PriceSeries;
use bassbroker_core::ingest::types::Quote;
use bassbroker_core::predict::DEFAULT_DAYS_TO_PREDICT;
use bassbroker_core::service::{ForecastService, SymbolForecast};
use bassbroker_core::signals::patterns::Pattern;
use bassbroker_core::signals::sentiment::{self, NewsArticle, NewsSentiment};

const MAX_DAYS_TO_PREDICT: usize = 30;
const ANONYMOUS_SYMBOL: &str = "custom";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bassbroker_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let service = match ForecastService::from_settings(&settings) {
        Ok(service) => service,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "failed to build forecast service");
            return Err(e);
        }
    };

    let state = AppState {
        service: Arc::new(service),
    };
    let app = router(state).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/forecast", post(post_forecast))
        .route("/forecast/:symbol", get(get_forecast_for_symbol))
        .route("/patterns/:symbol", get(get_pattern_for_symbol))
        .route("/sentiment", post(post_sentiment))
        .route("/models", get(list_models))
        .route("/models/:symbol", delete(evict_model))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Arc<ForecastService>,
}

#[derive(Debug, Deserialize)]
struct ForecastRequest {
    symbol: Option<String>,
    /// Closes, oldest-first.
    prices: Vec<f64>,
    days: Option<usize>,
    use_model: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ForecastQuery {
    days: Option<usize>,
    use_model: Option<bool>,
}

#[derive(Debug, Serialize)]
struct PatternResponse {
    quote: Quote,
    pattern: Option<Pattern>,
}

#[derive(Debug, Deserialize)]
struct SentimentRequest {
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Serialize)]
struct SentimentResponse {
    sentiment: Option<NewsSentiment>,
    recent: usize,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    enabled: bool,
    loaded: Vec<String>,
}

fn resolve_days(days: Option<usize>) -> Result<usize, StatusCode> {
    let days = days.unwrap_or(DEFAULT_DAYS_TO_PREDICT);
    if !(1..=MAX_DAYS_TO_PREDICT).contains(&days) {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(days)
}

async fn post_forecast(
    State(state): State<AppState>,
    Json(req): Json<ForecastRequest>,
) -> Result<Json<SymbolForecast>, StatusCode> {
    let days = resolve_days(req.days)?;
    let history = PriceSeries::from_oldest_first(req.prices).map_err(|e| {
        tracing::debug!(error = %e, "rejecting forecast request");
        StatusCode::BAD_REQUEST
    })?;
    let symbol = req
        .symbol
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_SYMBOL.to_string());

    let out = state
        .service
        .forecast_series(&symbol, &history, days, req.use_model.unwrap_or(false))
        .await;
    Ok(Json(out))
}

async fn get_forecast_for_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<SymbolForecast>, StatusCode> {
    let days = resolve_days(query.days)?;
    let out = state
        .service
        .forecast_symbol(&symbol, days, query.use_model.unwrap_or(false))
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::warn!(%symbol, error = %e, "forecast fetch failed");
            StatusCode::BAD_GATEWAY
        })?;
    Ok(Json(out))
}

async fn get_pattern_for_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PatternResponse>, StatusCode> {
    let (quote, pattern) = state.service.detect_pattern(&symbol).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::warn!(%symbol, error = %e, "pattern fetch failed");
        StatusCode::BAD_GATEWAY
    })?;
    Ok(Json(PatternResponse { quote, pattern }))
}

async fn post_sentiment(Json(req): Json<SentimentRequest>) -> Json<SentimentResponse> {
    let now = chrono::Utc::now();
    Json(SentimentResponse {
        sentiment: sentiment::score_recent(&req.articles, now),
        recent: sentiment::recent(&req.articles, now).len(),
    })
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let Some(models) = state.service.models() else {
        return Json(ModelsResponse {
            enabled: false,
            loaded: Vec::new(),
        });
    };
    Json(ModelsResponse {
        enabled: true,
        loaded: models.loaded_symbols().await,
    })
}

async fn evict_model(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> StatusCode {
    let Some(models) = state.service.models() else {
        return StatusCode::NOT_FOUND;
    };
    if models.evict(&symbol).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
