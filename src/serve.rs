//! Development server with rebuild-on-request.
//!
//! A `tiny_http` server serves the output root (the parent of the collection
//! directory) from a small pool of worker threads:
//!
//! - `/` redirects to `/stanza/`
//! - any request under `/stanza/<name>/` (except `/stanza/assets/`) first asks
//!   the provider to rebuild if the sources changed
//! - files are served as-is, directories through their `index.html`
//! - every response carries `Access-Control-Allow-Origin: *` so stanzas can
//!   be embedded from other origins during development
//!
//! ```text
//!  worker 1 ─┐
//!  worker 2 ─┼─▶ route ─▶ rebuild_if_required (mutex) ─▶ resolve ─▶ respond
//!  worker N ─┘
//! ```
//!
//! A failed rebuild is logged and the previous output keeps being served.

use crate::output;
use crate::provider::StanzaProvider;
use crate::stanza::ASSETS_DIR;
use std::borrow::Cow;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Ports tried after the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Where `/` redirects to.
pub const COLLECTION_PATH: &str = "/stanza/";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("invalid interface address '{0}'")]
    Interface(String),
    #[error("failed to bind after {attempts} attempts (ports {first}-{last}): {message}")]
    Bind {
        attempts: u16,
        first: u16,
        last: u16,
        message: String,
    },
    #[error("failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("invalid header {0}")]
    Header(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server settings resolved from config and command-line flags.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub interface: String,
    pub port: u16,
    pub workers: usize,
    pub development: bool,
}

/// State shared by the worker threads.
pub struct ServerState {
    provider: Mutex<StanzaProvider>,
    output_root: PathBuf,
    dist_dir: PathBuf,
    development: bool,
}

impl ServerState {
    /// `dist_dir` is the collection directory the provider builds into;
    /// `output_root` is the directory served at `/`.
    pub fn new(
        provider: StanzaProvider,
        output_root: impl Into<PathBuf>,
        dist_dir: impl Into<PathBuf>,
        development: bool,
    ) -> Self {
        Self {
            provider: Mutex::new(provider),
            output_root: output_root.into(),
            dist_dir: dist_dir.into(),
            development,
        }
    }

    fn rebuild_if_required(&self) {
        // A panic mid-build leaves the provider usable; the next build starts
        // from scratch anyway.
        let mut provider = self
            .provider
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match provider.rebuild_if_required(&self.dist_dir, self.development) {
            Ok(Some(report)) => output::print_build_report(&report),
            Ok(None) => {}
            Err(e) => eprintln!("ERROR during rebuild: {e}"),
        }
    }
}

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve the built collection until Ctrl+C.
///
/// The caller runs the initial build; this only binds, spawns the workers and
/// waits for them.
pub fn serve(state: ServerState, options: &ServeOptions) -> Result<(), ServeError> {
    let interface: IpAddr = options
        .interface
        .parse()
        .map_err(|_| ServeError::Interface(options.interface.clone()))?;

    let (server, addr) = try_bind_port(interface, options.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let workers = options.workers.max(1);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        println!("shutting down...");
        // Each call releases one blocked worker.
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })?;

    output::print_server_banner(
        &state.output_root,
        &addr.to_string(),
        workers,
        options.development,
    );

    for handle in spawn_workers(server, Arc::new(state), workers) {
        if handle.join().is_err() {
            eprintln!("worker thread panicked");
        }
    }
    Ok(())
}

/// Start `count` threads pulling requests from `server` until it is unblocked.
pub fn spawn_workers(
    server: Arc<Server>,
    state: Arc<ServerState>,
    count: usize,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|_| {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    if let Err(e) = handle_request(request, &state) {
                        eprintln!("request error: {e}");
                    }
                }
            })
        })
        .collect()
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
pub fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr), ServeError> {
    let mut last_error = String::new();
    let mut last_port = base_port;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        last_port = port;

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    println!("port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ServeError::Bind {
        attempts: max_retries,
        first: base_port,
        last: last_port,
        message: last_error,
    })
}

// ============================================================================
// Routing
// ============================================================================

/// What to do with a request path.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Redirect(String),
    Serve { path: String, rebuild: bool },
    Forbidden,
}

/// Classify a request URL. The query string and fragment are ignored.
pub fn route(url: &str) -> Route {
    let raw = url.split(['?', '#']).next().unwrap_or_default();
    let path = urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string());

    if path.is_empty() || path == "/" {
        return Route::Redirect(COLLECTION_PATH.to_string());
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Route::Forbidden;
    }

    let rebuild = stanza_segment(&path).is_some_and(|segment| segment != ASSETS_DIR);
    Route::Serve { path, rebuild }
}

/// The `<name>` in `/stanza/<name>/...`.
fn stanza_segment(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(COLLECTION_PATH)?;
    let (segment, _) = rest.split_once('/')?;
    (!segment.is_empty()).then_some(segment)
}

/// Result of mapping a request path onto the output root.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// A directory requested without the trailing slash.
    AddSlash(String),
    NotFound,
}

/// Request resolution order:
/// 1. Exact file match → serve file
/// 2. Directory without trailing slash → redirect to `path/`
/// 3. Directory with index.html → serve index.html
/// 4. Nothing found → 404
pub fn resolve(root: &Path, path: &str) -> Resolved {
    let local = root.join(path.trim_start_matches('/'));

    if local.is_file() {
        return Resolved::File(local);
    }
    if local.is_dir() {
        if !path.ends_with('/') {
            return Resolved::AddSlash(format!("{path}/"));
        }
        let index = local.join("index.html");
        if index.is_file() {
            return Resolved::File(index);
        }
    }
    Resolved::NotFound
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(request: Request, state: &ServerState) -> Result<(), ServeError> {
    match route(request.url()) {
        Route::Redirect(location) => respond_redirect(request, 302, &location),
        Route::Forbidden => respond_text(request, 403, "403 Forbidden"),
        Route::Serve { path, rebuild } => {
            if rebuild {
                state.rebuild_if_required();
            }
            match resolve(&state.output_root, &path) {
                Resolved::File(file) => respond_file(request, &file),
                Resolved::AddSlash(location) => respond_redirect(request, 301, &location),
                Resolved::NotFound => respond_text(request, 404, "404 Not Found"),
            }
        }
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header, ServeError> {
    Header::from_bytes(name, value).map_err(|()| ServeError::Header(format!("{name}: {value}")))
}

fn cors() -> Result<Header, ServeError> {
    header("Access-Control-Allow-Origin", "*")
}

/// Serve a file with appropriate content type.
fn respond_file(request: Request, path: &Path) -> Result<(), ServeError> {
    let content = fs::read(path)?;
    let response = Response::from_data(content)
        .with_header(header("Content-Type", guess_content_type(path))?)
        .with_header(cors()?);
    request.respond(response)?;
    Ok(())
}

fn respond_redirect(request: Request, status: u16, location: &str) -> Result<(), ServeError> {
    let response = Response::empty(StatusCode(status))
        .with_header(header("Location", location)?)
        .with_header(cors()?);
    request.respond(response)?;
    Ok(())
}

fn respond_text(request: Request, status: u16, body: &str) -> Result<(), ServeError> {
    let response = Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", "text/plain; charset=utf-8")?)
        .with_header(cors()?);
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json" | "jsonld") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
