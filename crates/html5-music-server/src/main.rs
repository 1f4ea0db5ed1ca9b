use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ROOT: &str = "static";

#[derive(Clone)]
struct AppState {
    root: Arc<PathBuf>,
}

/// Relative file path for a request path, or `None` if the path tries to
/// leave the static directory.
fn sanitize_path(request: &str) -> Option<PathBuf> {
    let relative = request.strip_prefix('/').unwrap_or(request);
    if relative.is_empty() {
        return Some(PathBuf::from("index.html"));
    }
    let mut path = PathBuf::new();
    for segment in relative.split('/') {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(['\\', ':'])
        {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js") => "text/javascript",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

fn not_found(path: &str) -> Response {
    log::info!("404 {path}");
    StatusCode::NOT_FOUND.into_response()
}

async fn send_file(root: &Path, relative: &Path, request: &str) -> Response {
    match tokio::fs::read(root.join(relative)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(relative))], bytes).into_response(),
        Err(_) => not_found(request),
    }
}

async fn favicon(State(state): State<AppState>) -> Response {
    send_file(&state.root, Path::new("img/favicon.png"), "/favicon.ico").await
}

async fn asset(State(state): State<AppState>, uri: Uri) -> Response {
    match sanitize_path(uri.path()) {
        Some(relative) => send_file(&state.root, &relative, uri.path()).await,
        None => not_found(uri.path()),
    }
}

fn router(root: PathBuf) -> Router {
    Router::new()
        .route("/favicon.ico", get(favicon))
        .fallback(asset)
        .with_state(AppState {
            root: Arc::new(root),
        })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info!("shutting down");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("PORT is not a port number: {value}"))?,
        Err(_) => DEFAULT_PORT,
    };
    let root = PathBuf::from(
        std::env::var("HTML5_MUSIC_STATIC").unwrap_or_else(|_| DEFAULT_ROOT.to_string()),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    log::info!("serving {} on http://{addr}", root.display());

    axum::serve(listener, router(root))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
