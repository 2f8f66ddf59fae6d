use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tracing::info;

use crate::render;

/// The prerendered page, shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    page: Bytes,
}

impl AppState {
    pub fn new(page: String) -> Self {
        Self {
            page: Bytes::from(page),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(render::STYLESHEET_PATH, get(stylesheet))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<Bytes> {
    Html(state.page.clone())
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        render::stylesheet(),
    )
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
