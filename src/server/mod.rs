// src/server/mod.rs

//! Development HTTP server.
//!
//! Serves the output directory and pushes a reload signal to connected
//! browsers whenever a task reports fresh output. Not correctness-critical:
//! notification delivery is best-effort, and the server only stops when the
//! process does.

pub mod reload;

pub use reload::ReloadHub;

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::model::ServerSection;

/// Script served at `/__livereload.js` and injected into HTML responses.
const RELOAD_SCRIPT: &str = "\
new EventSource('/__livereload').onmessage = () => location.reload();\n";

struct ServerState {
    root: PathBuf,
    hub: ReloadHub,
}

/// Serve `root` until the process exits.
///
/// With `external = true` the listener binds all interfaces (the public
/// tunnel equivalent); otherwise loopback only.
pub async fn serve(root: PathBuf, section: ServerSection, hub: ReloadHub) -> Result<()> {
    let ip: IpAddr = if section.external {
        Ipv4Addr::UNSPECIFIED.into()
    } else {
        Ipv4Addr::LOCALHOST.into()
    };
    let addr = SocketAddr::new(ip, section.port);

    let state = Arc::new(ServerState { root, hub });
    let app = Router::new()
        .route("/__livereload", get(livereload_events))
        .route("/__livereload.js", get(livereload_script))
        .fallback(get(serve_static))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;

    info!("dev server listening on http://{addr}/");
    if section.external {
        info!(port = section.port, "external access enabled on all interfaces");
    }

    axum::serve(listener, app)
        .await
        .context("dev server terminated")
}

async fn livereload_script() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        RELOAD_SCRIPT,
    )
        .into_response()
}

/// SSE stream: one `reload` event per notification from the hub.
async fn livereload_events(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.hub.subscribe();

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    return Some((Ok(Event::default().data("reload")), rx));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn serve_static(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(rel) = sanitize_path(uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut path = state.root.join(rel);
    if path.is_dir() {
        path = path.join("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let ct = content_type(&path);
            let body = if ct == "text/html" {
                inject_reload_script(&bytes)
            } else {
                bytes
            };
            ([(header::CONTENT_TYPE, ct)], body).into_response()
        }
        Err(err) => {
            debug!(?path, %err, "static file miss");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Reject traversal outside the output root.
fn sanitize_path(uri_path: &str) -> Option<PathBuf> {
    let trimmed = uri_path.trim_start_matches('/');
    let mut clean = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(c) => clean.push(c),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(clean)
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Append the live-reload script tag, before `</body>` when present.
fn inject_reload_script(html: &[u8]) -> Vec<u8> {
    const TAG: &str = "<script src=\"/__livereload.js\"></script>";
    let text = String::from_utf8_lossy(html);
    let injected = match text.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &text[..pos], TAG, &text[pos..]),
        None => format!("{text}{TAG}"),
    };
    injected.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_traversal() {
        assert!(sanitize_path("/../etc/passwd").is_none());
        assert_eq!(
            sanitize_path("/styles/main.css"),
            Some(PathBuf::from("styles/main.css"))
        );
        assert_eq!(sanitize_path("/"), Some(PathBuf::new()));
    }

    #[test]
    fn content_type_covers_build_outputs() {
        assert_eq!(content_type(Path::new("index.html")), "text/html");
        assert_eq!(content_type(Path::new("styles/main.min.css")), "text/css");
        assert_eq!(content_type(Path::new("img/sprites/sprite.svg")), "image/svg+xml");
        assert_eq!(content_type(Path::new("mystery.bin")), "application/octet-stream");
    }

    #[test]
    fn reload_script_lands_before_body_close() {
        let html = b"<html><body><p>hi</p></body></html>";
        let out = String::from_utf8(inject_reload_script(html)).unwrap();
        assert!(out.contains("__livereload.js\"></script></body>"));
    }

    #[test]
    fn reload_script_appended_without_body_tag() {
        let out = String::from_utf8(inject_reload_script(b"<p>hi</p>")).unwrap();
        assert!(out.ends_with("</script>"));
    }
}
