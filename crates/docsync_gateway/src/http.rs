//! HTTP binding for the gateway.

use crate::error::{GatewayError, GatewayResult};
use crate::handler::{GatewayResponse, SyncGateway};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

#[derive(Clone)]
struct HttpState {
    gateway: SyncGateway,
    modified_header: HeaderName,
}

/// Builds the axum router serving `gateway`.
///
/// `GET /health` answers `OK`. Every other path goes through
/// [`SyncGateway::handle`].
///
/// # Errors
///
/// Returns [`GatewayError::Config`] if the configured header name is invalid.
pub fn router(gateway: SyncGateway) -> GatewayResult<Router> {
    let config = gateway.config();
    let modified_header = HeaderName::from_bytes(config.modified_header.as_bytes())
        .map_err(|e| GatewayError::Config(format!("modified_header: {e}")))?;
    let body_limit = config.max_body_bytes;

    let state = HttpState {
        gateway,
        modified_header,
    };

    Ok(Router::new()
        .route("/health", get(|| async { "OK" }))
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state))
}

async fn dispatch(
    State(state): State<HttpState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let response = state.gateway.handle(&method, uri.path(), &body);
    into_http(response, &state.modified_header)
}

fn into_http(response: GatewayResponse, modified_header: &HeaderName) -> Response {
    let GatewayResponse {
        status,
        body,
        last_modified,
    } = response;
    let content_type = body.content_type();

    let mut http = (status, body.into_bytes()).into_response();
    let headers = http.headers_mut();
    match content_type {
        Some(media) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(media));
        }
        None => {
            headers.remove(CONTENT_TYPE);
        }
    }
    if let Some(stamp) = last_modified {
        headers.insert(modified_header.clone(), HeaderValue::from(stamp));
    }
    http
}
