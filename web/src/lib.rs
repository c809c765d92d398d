pub mod render;
pub mod stats;
pub mod templates;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use digest_core::dates::parse_date_key;
use digest_core::{CoreError, ErrorExt};
use render::MarkdownRenderer;
use serde_json::json;
use storage::{BlobStore, DigestStore};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use stats::{digest_list, digest_stats, neighbours, site_stats, DigestSummary, RECENT_DIGESTS};
use templates::*;

pub struct AppState<B> {
    store: DigestStore<B>,
    subreddits: Vec<String>,
    renderer: MarkdownRenderer,
}

impl<B: BlobStore> AppState<B> {
    pub fn new(store: DigestStore<B>, subreddits: Vec<String>) -> Self {
        Self {
            store,
            subreddits,
            renderer: MarkdownRenderer::new(),
        }
    }
}

pub fn router<B: BlobStore + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/", get(index_page::<B>))
        .route("/digest/{date}", get(digest_page::<B>))
        .route("/archive", get(archive_page::<B>))
        .route("/about", get(about_page::<B>))
        .route("/api/digests", get(api_digest_list::<B>))
        .route("/api/digest/{date}", get(api_digest::<B>))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ))
}

pub async fn serve<B: BlobStore + 'static>(
    state: AppState<B>,
    addr: &str,
) -> Result<(), CoreError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Digest web server listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

type Shared<B> = State<Arc<AppState<B>>>;

fn server_error(e: CoreError) -> Response {
    e.log_error();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_message("Something went wrong", &e.user_friendly_message())),
    )
        .into_response()
}

fn bad_date(date: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(render_message(
            "Invalid date",
            &format!("'{date}' is not a date in YYYY-MM-DD form."),
        )),
    )
        .into_response()
}

fn digest_not_found(date: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(render_message(
            "Digest not found",
            &format!("There is no digest for {date}."),
        )),
    )
        .into_response()
}

async fn index_page<B: BlobStore>(State(state): Shared<B>) -> Response {
    let digests = match digest_list(&state.store).await {
        Ok(digests) => digests,
        Err(e) => return server_error(e),
    };
    let stats = match site_stats(&state.store, state.subreddits.len()).await {
        Ok(stats) => stats,
        Err(e) => return server_error(e),
    };

    let recent = &digests[..digests.len().min(RECENT_DIGESTS)];
    Html(render_index(recent, digests.len(), &stats)).into_response()
}

async fn digest_page<B: BlobStore>(State(state): Shared<B>, Path(date): Path<String>) -> Response {
    if parse_date_key(&date).is_err() {
        return bad_date(&date);
    }

    let markdown = match state.store.load_digest(&date).await {
        Ok(Some(markdown)) => markdown,
        Ok(None) => return digest_not_found(&date),
        Err(e) => return server_error(e),
    };
    let digests = match digest_list(&state.store).await {
        Ok(digests) => digests,
        Err(e) => return server_error(e),
    };
    let stats = match digest_stats(&state.store, &date, &state.subreddits).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Digest stats for {} unavailable: {}", date, e);
            None
        }
    };

    let html = state.renderer.render(&markdown);
    Html(render_digest(
        &DigestSummary::for_date(&date),
        &html,
        &neighbours(&digests, &date),
        stats.as_ref(),
    ))
    .into_response()
}

async fn archive_page<B: BlobStore>(State(state): Shared<B>) -> Response {
    match digest_list(&state.store).await {
        Ok(digests) => Html(render_archive(&digests)).into_response(),
        Err(e) => server_error(e),
    }
}

async fn about_page<B: BlobStore>(State(state): Shared<B>) -> Response {
    match site_stats(&state.store, state.subreddits.len()).await {
        Ok(stats) => Html(render_about(&stats, &state.subreddits)).into_response(),
        Err(e) => server_error(e),
    }
}

async fn api_digest_list<B: BlobStore>(State(state): Shared<B>) -> Response {
    match digest_list(&state.store).await {
        Ok(digests) => Json(json!({ "digests": digests })).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.user_friendly_message()),
    }
}

async fn api_digest<B: BlobStore>(State(state): Shared<B>, Path(date): Path<String>) -> Response {
    if parse_date_key(&date).is_err() {
        return api_error(StatusCode::BAD_REQUEST, "Invalid date");
    }

    match state.store.load_digest(&date).await {
        Ok(Some(content)) => {
            let html = state.renderer.render(&content);
            Json(json!({ "date": date, "content": content, "html": html })).into_response()
        }
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Digest not found"),
        Err(e) => {
            e.log_error();
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.user_friendly_message())
        }
    }
}

fn api_error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}
