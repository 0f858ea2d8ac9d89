//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, route matching,
//! dispatch to the page, API and static handlers, error rendering and access
//! logging.

use futures_util::FutureExt;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::{HeaderMap, Method, Request};
use std::any::Any;
use std::borrow::Cow;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppState;
use crate::error::{AppError, ErrorFormat};
use crate::handler::{pages, products, static_files};
use crate::http::{self, HttpResponse};
use crate::ingest::IngestError;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, Matched, RouteAction, ROUTES};

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let is_head = parts.method == Method::HEAD;

    let mut entry = state.config.logging.access_log.then(|| {
        AccessLogEntry::from_request(
            peer_addr,
            &parts.method,
            &parts.uri,
            parts.version,
            &parts.headers,
        )
    });

    let max_body_size = state.config.http.max_body_size;
    let read_timeout = Duration::from_secs(state.config.performance.read_timeout);
    let body = tokio::time::timeout(read_timeout, read_body(&parts.headers, body, max_body_size))
        .await
        .unwrap_or(Err(AppError::RequestTimeout(read_timeout)));
    let response = match body {
        Ok(bytes) => respond(Request::from_parts(parts, bytes), &state).await,
        Err(e) => {
            let format = error_format(&parts.method, parts.uri.path());
            render_error(e, format, &parts.method, parts.uri.path())
        }
    };

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.complete(response.status().as_u16(), body_bytes, started.elapsed());
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    let response = http::with_server_header(response, &state.config.http.server_name);
    Ok(if is_head {
        http::strip_body(response)
    } else {
        response
    })
}

/// Route a request whose body has been read and produce exactly one response.
///
/// Handler errors and panics are converted into error responses here.
pub async fn respond(req: Request<Bytes>, state: &AppState) -> HttpResponse {
    let path = req.uri().path().to_string();
    let Some(matched) = routing::match_route(req.method(), &path, ROUTES) else {
        return render_error(
            AppError::not_found("Page not found!"),
            ErrorFormat::Html,
            req.method(),
            &path,
        );
    };

    let result = AssertUnwindSafe(dispatch(matched, &req, state))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(AppError::Internal(panic_message(payload.as_ref()))));

    result.unwrap_or_else(|e| render_error(e, matched.action.error_format(), req.method(), &path))
}

/// Dispatch to the handler of a matched route
async fn dispatch(
    matched: Matched<'_>,
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<HttpResponse, AppError> {
    match matched.action {
        RouteAction::Favicon => static_files::serve_favicon(state).await,
        RouteAction::Overview => pages::overview(state).await,
        RouteAction::ProductPage => pages::product(req.uri().query(), state).await,
        RouteAction::AdminPage => Ok(pages::admin(state)),
        RouteAction::CreateProduct => products::create(req, state).await,
        RouteAction::ListProducts => products::list(req.uri().query(), state).await,
        RouteAction::GetProduct => products::get(matched.capture, state).await,
        RouteAction::UpdateProduct => products::update(matched.capture, req, state).await,
        RouteAction::DeleteProduct => products::delete(matched.capture, state).await,
        RouteAction::PublicFile | RouteAction::StaticAsset => {
            static_files::serve_from(&state.public_dir, matched.capture).await
        }
        RouteAction::DirectImage => {
            static_files::serve_from(state.images_dir(), matched.capture).await
        }
    }
}

/// Read the request body, rejecting it once it exceeds `max_body_size`
async fn read_body(
    headers: &HeaderMap,
    body: Incoming,
    max_body_size: u64,
) -> Result<Bytes, AppError> {
    let too_large = || AppError::Ingestion(IngestError::TooLarge {
        limit: max_body_size,
    });

    if let Some(size) = declared_length(headers) {
        if size > max_body_size {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(too_large());
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => Err(too_large()),
        Err(e) => Err(AppError::Internal(format!("Failed to read request body: {e}"))),
    }
}

/// Content-Length, when present and well-formed
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get("content-length")?;
    match value.to_str().ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(size) => Some(size),
        None => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            None
        }
    }
}

fn error_format(method: &Method, path: &str) -> ErrorFormat {
    routing::match_route(method, path, ROUTES)
        .map_or(ErrorFormat::Html, |m| m.action.error_format())
}

fn render_error(error: AppError, format: ErrorFormat, method: &Method, path: &str) -> HttpResponse {
    if error.is_server_error() {
        logger::log_error(&format!("{method} {path} failed: {error}"));
    }
    error.into_response(format)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Handler panicked: {message}")
}

/// First value of a query parameter, percent-decoded (`+` is a space)
pub fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<Cow<'a, str>> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_component(key) == name).then(|| decode_component(value))
    })
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['+', '%']) {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(spaced),
    }
}
