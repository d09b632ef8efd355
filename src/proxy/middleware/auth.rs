// Azure AD authentication middleware
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::proxy::server::AppState;

/// Bearer token gate for secured workloads
///
/// On success the normalized `Identity` is stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match state.authenticator.authenticate(request.headers()).await {
        Ok(identity) => {
            tracing::debug!(
                "Authenticated {} for {} {}",
                identity.id,
                request.method(),
                request.uri().path()
            );
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            match &e {
                AuthError::Provider(_) => tracing::error!("Authentication error: {}", e),
                _ => tracing::warn!("Rejected {}: {}", request.uri().path(), e),
            }
            Err(e)
        }
    }
}
