use axum::{
    routing::post,
    Router,
    extract::{rejection::JsonRejection, Json, State},
    response::IntoResponse,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{Result, AppError};
use crate::api::models::{SummaryRequest, SummaryResponse};
use crate::api::response;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/summarize", post(summarize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn summarize_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SummaryRequest>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, AppError> {
    // Malformed bodies get the same error shape as every other failure
    let Json(req) = payload.map_err(|rejection| {
        let err = AppError::RequestError(rejection.body_text());
        error!(status = %err.status(), "Rejected request body: {}", err);
        err
    })?;

    info!("Processing request for URL: {}", req.url);
    let start_time = std::time::Instant::now();

    let result = process_summary_request(&state, &req).await;
    info!("Request processing took: {:?}", start_time.elapsed());

    match result {
        Ok(summary) => {
            info!("Successfully summarized URL: {}", req.url);
            Ok(response::success(SummaryResponse { summary }))
        }
        Err(err) => {
            error!(status = %err.status(), "Request for {} failed: {}", req.url, err);
            Err(err)
        }
    }
}

async fn process_summary_request(state: &AppState, req: &SummaryRequest) -> Result<String> {
    req.validate()?;

    // Route by host and extract the article text
    let text = state.fetcher.fetch_text(&req.url).await?;
    info!("Text length: {} chars", text.chars().count());

    // Truncate to the token budget and ask the LLM for a summary
    let summary = state.summarizer.summarize(&text, req.max_length).await?;
    info!("Summary length: {} chars", summary.chars().count());
    Ok(summary)
}
