// Workload forwarding handler
use axum::{
    extract::{Extension, OriginalUri, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::models::Identity;
use crate::proxy::common::utils::{build_target_url, split_workload_path};
use crate::proxy::server::AppState;
use crate::proxy::upstream::client::{method_has_body, UpstreamClient};

const FORWARD_ERROR: &str = "Error forwarding request to remote host";

/// Handler bound to every workload route
pub async fn handle_forward(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let identity = identity.map(|Extension(identity)| identity);
    forward_request(&state, method, &uri, &headers, identity.as_ref(), body).await
}

/// Resolve the workload from the path and relay the request to its host
pub async fn forward_request(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    identity: Option<&Identity>,
    body: Bytes,
) -> Response {
    let Some(parts) = split_workload_path(uri.path()) else {
        return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
    };

    let Some(workload) = state.registry.get(parts.workload) else {
        return (
            StatusCode::NOT_FOUND,
            format!("Workload {} not found", parts.workload),
        )
            .into_response();
    };

    let target_url = build_target_url(
        &state.upstream_scheme,
        &workload.host,
        &parts.sub_path,
        uri.query(),
    );
    info!("Forwarding {} {} -> {}", method, uri.path(), target_url);

    match relay(state, method, &target_url, &workload.host, headers, identity, body).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error forwarding request to {}: {}", target_url, e);
            (StatusCode::INTERNAL_SERVER_ERROR, FORWARD_ERROR).into_response()
        }
    }
}

async fn relay(
    state: &AppState,
    method: Method,
    target_url: &str,
    host: &str,
    headers: &HeaderMap,
    identity: Option<&Identity>,
    body: Bytes,
) -> AppResult<Response> {
    let upstream_headers = UpstreamClient::build_headers(headers, host, identity)?;
    let body = method_has_body(&method).then_some(body);

    let upstream = state
        .upstream
        .forward(method, target_url, upstream_headers, body)
        .await?;
    debug!(
        "Upstream {} answered {} ({} bytes)",
        target_url,
        upstream.status,
        upstream.body.len()
    );

    let mut response = (upstream.status, upstream.body).into_response();
    // Only the upstream decides the content type
    response.headers_mut().remove(header::CONTENT_TYPE);
    response.headers_mut().extend(upstream.headers);
    Ok(response)
}
