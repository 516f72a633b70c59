//! Request-scoped context and HTTP logging.
//!
//! Every request runs inside a task-local [`RequestContext`] carrying its
//! request id and whether error details may be shown to the caller. Error
//! rendering reads it through [`error_details_exposed`] so no global state is
//! involved.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::{cell::RefCell, fmt, future::Future, time::Instant};
use tower_http::trace::MakeSpan;
use uuid::Uuid;

use crate::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID tracking information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_request<B>(request: &Request<B>) -> Self {
        request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
                    .map(RequestId::new)
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    /// When set, error bodies carry a `stack` and internal messages verbatim.
    pub expose_error_details: bool,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, expose_error_details: bool) -> Self {
        Self {
            request_id: RequestId::new(request_id),
            expose_error_details,
        }
    }
}

tokio::task_local! {
    static CURRENT_REQUEST: RefCell<Option<RequestContext>>;
}

pub async fn scope_request_context<Fut, R>(context: RequestContext, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST
        .scope(RefCell::new(Some(context)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST
        .try_with(|cell| cell.borrow().as_ref().map(|ctx| ctx.request_id.clone()))
        .ok()
        .flatten()
}

/// Whether the running request may see internal error details.
/// Outside a request scope this is always `false`.
pub fn error_details_exposed() -> bool {
    CURRENT_REQUEST
        .try_with(|cell| {
            cell.borrow()
                .as_ref()
                .map(|ctx| ctx.expose_error_details)
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Assigns a request id, echoes it back in `x-request-id` and runs the rest
/// of the stack inside a [`RequestContext`].
pub async fn request_context_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = RequestId::from_request(&request);
    request.extensions_mut().insert(request_id.clone());

    let context = RequestContext {
        request_id: request_id.clone(),
        expose_error_details: !state.config.is_production(),
    };

    let mut response = scope_request_context(context, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    tracing::debug!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::warn!(method = %method, uri = %uri, status = status.as_u16(), duration_ms, "Request failed");
    } else {
        tracing::info!(method = %method, uri = %uri, status = status.as_u16(), duration_ms, "Request completed");
    }

    response
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = RequestId::from_request(request);
        tracing::info_span!(
            "http.request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}
