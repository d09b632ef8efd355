// Gateway-owned endpoints: config dump, secure echo, catch-all info
use axum::{
    extract::{Extension, OriginalUri, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use crate::models::Identity;
use crate::proxy::azure_ad::AzureAdValidator;
use crate::proxy::server::AppState;

/// Body of the catch-all route
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access: Option<String>,
}

impl UserInfo {
    pub fn from_identity(identity: Option<&Identity>) -> Self {
        match identity {
            Some(identity) => Self {
                user: identity.display_name().to_string(),
                authenticated: true,
                last_access: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            },
            None => Self {
                user: "unauthenticated".to_string(),
                authenticated: false,
                last_access: None,
            },
        }
    }
}

/// GET /config
pub async fn handle_config(State(state): State<AppState>) -> Response {
    Json(state.hosts.as_ref()).into_response()
}

/// GET /secure
pub async fn handle_secure(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(json!({
        "message": "This is a secure endpoint",
        "user": identity,
    }))
}

/// Catch-all for paths no route claimed
///
/// A bearer token is checked opportunistically; any failure just means
/// the caller is reported as unauthenticated.
pub async fn handle_info(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::NOT_FOUND,
            format!("Cannot {} {}", method, uri.path()),
        )
            .into_response();
    }

    let identity = match AzureAdValidator::bearer_token(&headers) {
        Some(token) => match state.authenticator.validate(token).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!("Info request token not accepted: {}", e);
                None
            }
        },
        None => None,
    };

    Json(UserInfo::from_identity(identity.as_ref())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_unauthenticated() {
        let info = serde_json::to_value(UserInfo::from_identity(None)).unwrap();
        assert_eq!(
            info,
            json!({ "user": "unauthenticated", "authenticated": false })
        );
    }

    #[test]
    fn test_user_info_authenticated() {
        let identity = Identity {
            id: "oid-1".to_string(),
            name: None,
            roles: vec![],
            scope: String::new(),
        };
        let info = serde_json::to_value(UserInfo::from_identity(Some(&identity))).unwrap();
        assert_eq!(info["user"], "authenticated user");
        assert_eq!(info["authenticated"], true);
        let last_access = info["lastAccess"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(last_access).is_ok());
        assert!(last_access.ends_with('Z'));
    }
}
