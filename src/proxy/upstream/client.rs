// Upstream client implementation
// Relays gateway requests to workload hosts

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use reqwest::{redirect, Client};

use crate::error::{AppError, AppResult};
use crate::models::Identity;
use crate::proxy::config::UpstreamProxyConfig;

/// Request headers passed through to the workload host
pub const FORWARDED_HEADERS: &[&str] = &[
    "accept",
    "accept-language",
    "content-type",
    "user-agent",
    "cache-control",
    "if-match",
    "if-none-match",
    "if-modified-since",
    "x-request-id",
    "x-correlation-id",
];

/// Response headers relayed back to the caller
pub const RELAYED_RESPONSE_HEADERS: &[&str] = &[
    "content-type",
    "content-language",
    "location",
    "cache-control",
    "etag",
    "last-modified",
    "expires",
    "vary",
];

pub const IDENTITY_ID_HEADER: &str = "x-identity-id";
pub const IDENTITY_NAME_HEADER: &str = "x-identity-name";

/// Upstream reply relayed back to the caller
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Allow-listed upstream headers only
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(
        timeout_secs: u64,
        proxy_config: Option<&UpstreamProxyConfig>,
    ) -> AppResult<Self> {
        // Redirects are the caller's business
        let http_client = crate::utils::http::client_builder(timeout_secs, proxy_config)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { http_client })
    }

    /// Build outbound headers
    ///
    /// Allow-listed caller headers, `host` rewritten to the upstream host and
    /// identity headers when the caller was authenticated.
    pub fn build_headers(
        incoming: &HeaderMap,
        host: &str,
        identity: Option<&Identity>,
    ) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for &name in FORWARDED_HEADERS {
            for value in incoming.get_all(name) {
                headers.append(HeaderName::from_static(name), value.clone());
            }
        }

        headers.insert(
            header::HOST,
            HeaderValue::from_str(host)
                .map_err(|e| AppError::Forward(format!("Invalid upstream host '{}': {}", host, e)))?,
        );

        if let Some(identity) = identity {
            insert_identity_header(&mut headers, IDENTITY_ID_HEADER, &identity.id);
            insert_identity_header(
                &mut headers,
                IDENTITY_NAME_HEADER,
                identity.name.as_deref().unwrap_or(""),
            );
        }

        Ok(headers)
    }

    /// Issue the request and buffer the upstream reply
    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> AppResult<UpstreamResponse> {
        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = relayed_headers(response.headers());
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Whether the method carries a request body upstream
pub fn method_has_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn relayed_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &name in RELAYED_RESPONSE_HEADERS {
        for value in upstream.get_all(name) {
            headers.append(HeaderName::from_static(name), value.clone());
        }
    }
    headers
}

fn insert_identity_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_bytes(value.as_bytes()) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(_) => {
            tracing::warn!("Dropping {} header: value is not a valid header", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    fn identity(name: Option<&str>) -> Identity {
        Identity {
            id: "oid-1".to_string(),
            name: name.map(str::to_string),
            roles: vec![],
            scope: String::new(),
        }
    }

    #[test]
    fn test_build_headers_allow_list() {
        let mut incoming = HeaderMap::new();
        incoming.insert("accept", HeaderValue::from_static("application/json"));
        incoming.insert("authorization", HeaderValue::from_static("Bearer secret"));
        incoming.insert("cookie", HeaderValue::from_static("session=1"));
        incoming.insert("host", HeaderValue::from_static("gateway.local"));
        incoming.insert("x-request-id", HeaderValue::from_static("req-1"));

        let headers = UpstreamClient::build_headers(&incoming, "api.example.com", None).unwrap();
        assert_eq!(headers["accept"], "application/json");
        assert_eq!(headers["host"], "api.example.com");
        assert_eq!(headers["x-request-id"], "req-1");
        assert!(headers.get("authorization").is_none());
        assert!(headers.get("cookie").is_none());
        assert!(headers.get(IDENTITY_ID_HEADER).is_none());
    }

    #[test]
    fn test_build_headers_identity() {
        let headers = UpstreamClient::build_headers(
            &HeaderMap::new(),
            "api.example.com",
            Some(&identity(Some("Ada"))),
        )
        .unwrap();
        assert_eq!(headers[IDENTITY_ID_HEADER], "oid-1");
        assert_eq!(headers[IDENTITY_NAME_HEADER], "Ada");

        let headers =
            UpstreamClient::build_headers(&HeaderMap::new(), "api.example.com", Some(&identity(None)))
                .unwrap();
        assert_eq!(headers[IDENTITY_NAME_HEADER], "");
    }

    #[test]
    fn test_build_headers_rejects_bad_host() {
        assert!(UpstreamClient::build_headers(&HeaderMap::new(), "bad\nhost", None).is_err());
    }

    #[test]
    fn test_method_has_body() {
        assert!(method_has_body(&Method::POST));
        assert!(method_has_body(&Method::PUT));
        assert!(method_has_body(&Method::PATCH));
        assert!(!method_has_body(&Method::GET));
        assert!(!method_has_body(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_forward_relays_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/items").body("{\"a\":1}");
            then.status(201)
                .header("content-type", "application/json")
                .body("{\"id\":7}");
        });

        let client = UpstreamClient::new(5, None).unwrap();
        let response = client
            .forward(
                Method::POST,
                &server.url("/v1/items"),
                HeaderMap::new(),
                Some(Bytes::from_static(b"{\"a\":1}")),
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.headers["content-type"], "application/json");
        assert_eq!(response.body, Bytes::from_static(b"{\"id\":7}"));
    }

    #[tokio::test]
    async fn test_forward_does_not_follow_redirects() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/old");
            then.status(302)
                .header("location", "/new")
                .header("cache-control", "no-store")
                .header("set-cookie", "upstream=1");
        });

        let client = UpstreamClient::new(5, None).unwrap();
        let response = client
            .forward(Method::GET, &server.url("/old"), HeaderMap::new(), None)
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.headers["location"], "/new");
        assert_eq!(response.headers["cache-control"], "no-store");
        assert!(response.headers.get("set-cookie").is_none());
    }

    #[tokio::test]
    async fn test_forward_connection_error() {
        let client = UpstreamClient::new(5, None).unwrap();
        let result = client
            .forward(Method::GET, "http://127.0.0.1:1/", HeaderMap::new(), None)
            .await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }
}
