//! The `serve` task: local static server with live reload.
//!
//! Serves the output directory over HTTP and pushes reload notifications
//! to connected browsers over a WebSocket. A filesystem watcher on the
//! output tree bumps a version counter whenever a build lands; served
//! HTML gets a small client injected that reloads the page when the
//! version changes.
//!
//! The server runs on a background thread hosting its own tokio runtime
//! and is registered as a service; the port is bound synchronously in the
//! task body so a port collision fails the task instead of dying silently
//! in the background.

use crate::pipeline::PipelineContext;
use crate::tasks::{TaskError, TaskResult};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as AxumPath, State as AxumState};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::net::TcpListener;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant};

/// WebSocket endpoint the reload client connects to.
pub const RELOAD_ENDPOINT: &str = "/__reload";

/// Shared server state.
struct ServerState {
    root: PathBuf,
    version: AtomicU64,
    reload_tx: broadcast::Sender<u64>,
}

/// Start the static server service.
pub fn start(ctx: &PipelineContext) -> TaskResult {
    let root = ctx.dist_dir();
    std::fs::create_dir_all(&root)?;

    let addr = format!("127.0.0.1:{}", ctx.config().server.port);
    let listener = TcpListener::bind(&addr).map_err(|e| TaskError::ServerBind {
        addr: addr.clone(),
        source: e,
    })?;
    listener.set_nonblocking(true).map_err(|e| TaskError::ServerBind {
        addr: addr.clone(),
        source: e,
    })?;
    let local_addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or(addr);

    let state = Arc::new(ServerState {
        root: root.clone(),
        version: AtomicU64::new(0),
        reload_tx: broadcast::channel(256).0,
    });

    let thread_state = Arc::clone(&state);
    let handle = thread::Builder::new()
        .name("sitepack-serve".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("serve: failed to start runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(serve_loop(listener, thread_state));
        })
        .map_err(TaskError::Io)?;
    ctx.services().register("serve", handle);

    Ok(format!("serving {} at http://{}", root.display(), local_addr))
}

/// Run the HTTP server until the process exits.
async fn serve_loop(listener: TcpListener, state: Arc<ServerState>) {
    let watcher_state = Arc::clone(&state);
    tokio::spawn(async move {
        reload_loop(watcher_state).await;
    });

    let app = Router::new()
        .route(RELOAD_ENDPOINT, get(ws_reload))
        .route("/", get(route_index))
        .route("/{*path}", get(route_any))
        .with_state(state);

    let listener = match tokio::net::TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("serve: failed to adopt listener: {}", e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("serve: server failed: {}", e);
    }
}

/// Watch the output tree and broadcast a new version after each change
/// burst settles.
async fn reload_loop(state: Arc<ServerState>) {
    let (_watcher, mut rx) = match start_fs_watcher(&state.root) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("serve: live reload disabled: {}", e);
            return;
        }
    };

    while rx.recv().await.is_some() {
        debounce_fs_events(&mut rx).await;
        let next = state.version.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = state.reload_tx.send(next);
    }
}

/// Absorb a burst of change events before broadcasting once.
async fn debounce_fs_events(rx: &mut mpsc::UnboundedReceiver<()>) {
    let debounce_window = Duration::from_millis(120);
    let mut deadline = Instant::now() + debounce_window;
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => break,
            maybe = rx.recv() => {
                if maybe.is_none() {
                    break;
                }
                deadline = Instant::now() + debounce_window;
                sleep.as_mut().reset(deadline);
            }
        }
    }
}

fn start_fs_watcher(
    root: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>), String> {
    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let tx_cb = tx.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if res.is_ok() {
            let _ = tx_cb.send(());
        }
    })
    .map_err(|e| format!("failed to initialize filesystem watcher: {e}"))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| format!("failed to watch {}: {e}", root.display()))?;

    Ok((watcher, rx))
}

async fn ws_reload(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<Arc<ServerState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_reload_socket(socket, state))
}

/// Push the current version, then every subsequent one, until the client
/// goes away.
async fn handle_reload_socket(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.reload_tx.subscribe();
    let initial = state.version.load(Ordering::SeqCst);

    if socket
        .send(Message::Text(initial.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
            next = rx.recv() => {
                match next {
                    Ok(version) => {
                        if socket
                            .send(Message::Text(version.to_string().into()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn route_index(AxumState(state): AxumState<Arc<ServerState>>) -> Response {
    serve_path(&state, "").await
}

async fn route_any(
    AxumPath(path): AxumPath<String>,
    AxumState(state): AxumState<Arc<ServerState>>,
) -> Response {
    serve_path(&state, &path).await
}

async fn serve_path(state: &ServerState, raw_path: &str) -> Response {
    let rel = match sanitize_rel_path(raw_path) {
        Some(rel) => rel,
        None => return (StatusCode::BAD_REQUEST, "invalid path").into_response(),
    };

    let mut file = state.root.join(&rel);
    if rel.as_os_str().is_empty() || file.is_dir() {
        file = file.join("index.html");
    }
    if !file.is_file() {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    serve_static(&file).await
}

/// Reject parent-directory and absolute components.
fn sanitize_rel_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let rel = PathBuf::from(trimmed);
    for comp in rel.components() {
        if matches!(
            comp,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            return None;
        }
    }
    Some(rel)
}

async fn serve_static(path: &Path) -> Response {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read {}: {e}", path.display()),
            )
                .into_response();
        }
    };

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if matches!(ext, "html" | "htm") {
        let html = inject_reload_script(String::from_utf8_lossy(&bytes).into_owned());
        return Html(html).into_response();
    }

    let content_type = match ext {
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "map" | "json" => "application/json; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    };

    let mut response = bytes.into_response();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

/// Inject the live-reload client before `</body>` (or append if the page
/// has no body close tag). Already-injected pages pass through.
fn inject_reload_script(mut html: String) -> String {
    if html.contains(RELOAD_ENDPOINT) {
        return html;
    }

    let script = r#"<script>
(function(){
  var current = null;
  var reconnectTimer = null;

  function connect(){
    var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
    var ws = new WebSocket(proto + location.host + '/__reload');

    ws.onmessage = function(event){
      var next = Number(event && event.data || 0);
      if (!Number.isFinite(next)) return;
      if (current === null) {
        current = next;
        return;
      }
      if (next !== current) {
        location.reload();
      }
    };

    ws.onclose = function(){
      if (reconnectTimer) clearTimeout(reconnectTimer);
      reconnectTimer = setTimeout(connect, 600);
    };

    ws.onerror = function(){
      try { ws.close(); } catch (_) {}
    };
  }

  connect();
})();
</script>"#;

    if let Some(idx) = html.rfind("</body>") {
        html.insert_str(idx, script);
    } else {
        html.push_str(script);
    }

    html
}
