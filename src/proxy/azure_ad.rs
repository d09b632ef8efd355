// Azure AD bearer token validation
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::AuthError;
use crate::models::Identity;
use crate::proxy::config::AzureAdConfig;

/// Minimum spacing between two JWKS refreshes
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Subset of the OpenID discovery document we rely on
#[derive(Debug, Deserialize)]
struct OpenIdMetadata {
    jwks_uri: String,
}

/// Claims carried by Azure AD access tokens
#[derive(Debug, Deserialize)]
struct AzureClaims {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    scp: Option<String>,
}

impl AzureClaims {
    fn into_identity(self) -> Result<Identity, AuthError> {
        let id = self
            .oid
            .filter(|v| !v.is_empty())
            .or(self.sub.filter(|v| !v.is_empty()))
            .ok_or_else(|| AuthError::InvalidToken("Token has no oid or sub claim".to_string()))?;

        Ok(Identity {
            id,
            name: self.name,
            roles: self.roles.unwrap_or_default(),
            scope: self.scp.unwrap_or_default(),
        })
    }
}

/// Signing keys and the moment they were last fetched
#[derive(Default)]
struct KeyCache {
    keys: Option<JwkSet>,
    refreshed_at: Option<Instant>,
}

impl KeyCache {
    fn find(&self, kid: &str) -> Option<Jwk> {
        self.keys.as_ref()?.find(kid).cloned()
    }

    fn refreshed_within(&self, interval: Duration) -> bool {
        self.refreshed_at.is_some_and(|at| at.elapsed() < interval)
    }
}

/// Validates bearer tokens against the tenant's published signing keys.
///
/// Keys are discovered through the OpenID metadata document and cached.
/// An unknown `kid` triggers a refresh, at most once per
/// `MIN_REFRESH_INTERVAL`; refreshes run one at a time under the write lock.
pub struct AzureAdValidator {
    http_client: Client,
    metadata_url: String,
    audience: String,
    issuer: String,
    validate_issuer: bool,
    refresh_interval: Duration,
    cache: RwLock<KeyCache>,
}

impl AzureAdValidator {
    pub fn new(config: &AzureAdConfig, http_client: Client) -> Self {
        if config.tenant_id.is_empty() || config.client_id.is_empty() {
            tracing::warn!(
                "AZURE_TENANT_ID or AZURE_CLIENT_ID is not set, secured workloads will reject all tokens"
            );
        }

        Self {
            http_client,
            metadata_url: config.metadata_url(),
            audience: config.audience.clone(),
            issuer: config.issuer(),
            validate_issuer: config.validate_issuer,
            refresh_interval: MIN_REFRESH_INTERVAL,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    /// Extract the token from an `Authorization: Bearer ...` header
    pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token)
        } else {
            None
        }
    }

    /// Authenticate a request from its headers
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = Self::bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.validate(token).await
    }

    /// Verify signature, expiry, audience and issuer, then normalize claims
    pub async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let token_header =
            decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = token_header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::InvalidToken("Token header has no kid".to_string()))?;

        let jwk = self.find_key(kid).await?;
        if !key_accepts(&jwk.algorithm, token_header.alg) {
            return Err(AuthError::InvalidToken(format!(
                "Algorithm {:?} does not match signing key '{}'",
                token_header.alg, kid
            )));
        }
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| AuthError::Provider(format!("Unusable signing key '{}': {}", kid, e)))?;

        let mut validation = Validation::new(token_header.alg);
        validation.set_audience(&[self.audience.as_str()]);
        if self.validate_issuer {
            validation.set_issuer(&[self.issuer.as_str()]);
        }

        let data = decode::<AzureClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        data.claims.into_identity()
    }

    async fn find_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.cache.read().await.find(kid) {
            return Ok(jwk);
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(jwk) = cache.find(kid) {
            return Ok(jwk);
        }
        if cache.refreshed_within(self.refresh_interval) {
            return Err(AuthError::InvalidToken(format!(
                "Unknown signing key '{}'",
                kid
            )));
        }

        tracing::debug!("Signing key '{}' not cached, refreshing JWKS", kid);
        let keys = self.fetch_keys().await?;
        cache.keys = Some(keys);
        cache.refreshed_at = Some(Instant::now());

        cache
            .find(kid)
            .ok_or_else(|| AuthError::InvalidToken(format!("Unknown signing key '{}'", kid)))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let metadata: OpenIdMetadata = self.get_json(&self.metadata_url).await?;
        let keys: JwkSet = self.get_json(&metadata.jwks_uri).await?;
        tracing::info!(
            "Loaded {} signing keys from {}",
            keys.keys.len(),
            metadata.jwks_uri
        );
        Ok(keys)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AuthError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::Provider(format!("Parse {} failed: {}", url, e)))
    }
}

/// Whether a token algorithm belongs to the key's family
fn key_accepts(params: &AlgorithmParameters, alg: Algorithm) -> bool {
    match params {
        AlgorithmParameters::RSA(_) => matches!(
            alg,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        AlgorithmParameters::EllipticCurve(_) => {
            matches!(alg, Algorithm::ES256 | Algorithm::ES384)
        }
        AlgorithmParameters::OctetKey(_) => {
            matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
        }
        AlgorithmParameters::OctetKeyPair(_) => matches!(alg, Algorithm::EdDSA),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}
