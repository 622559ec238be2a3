use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use danmu_insight::{api, config};

#[derive(OpenApi)]
#[openapi(
    paths(api::word_frequency, api::sentiment_data, api::search),
    components(
        schemas(
            api::WordFrequencyResponse,
            api::SentimentDataResponse,
            api::SearchResponse,
            api::SearchHit,
            api::ApiError,
            danmu_insight::analyzer::WordFreqEntry,
            danmu_insight::analyzer::SentimentRecord,
            danmu_insight::analyzer::SentimentSummary,
            danmu_insight::analyzer::TrendPoint,
            danmu_insight::sentiment::SentimentClass
        )
    ),
    tags((name = "danmu", description = "Danmu analytics API"))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let state = Arc::new(api::load_state()?);

    let app = Router::new()
        .merge(
            SwaggerUi::new("/danmu-insight-swagger")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .route("/api/word-frequency", get(api::word_frequency))
        .route("/api/sentiment-data", get(api::sentiment_data))
        .route("/api/search", get(api::search))
        // Both routes serve the single front-end page.
        .route_service("/", ServeFile::new(config::INDEX_HTML_PATH))
        .route_service("/index.html", ServeFile::new(config::INDEX_HTML_PATH))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config::BIND_ADDR).await?;
    println!("🚀 Listening on {}", listener.local_addr()?);
    println!("   GET /api/word-frequency");
    println!("   GET /api/sentiment-data");
    println!("   GET /api/search?keyword=...&limit=50");
    axum::serve(listener, app).await?;

    Ok(())
}
