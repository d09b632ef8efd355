use crate::error::AppResult;
use crate::models::{AppConfig, HostsConfig, ProviderKind};
use crate::proxy::azure_ad::AzureAdValidator;
use crate::proxy::config::ProxyConfig;
use crate::proxy::handlers;
use crate::proxy::middleware::{auth_middleware, logging_middleware};
use crate::proxy::registry::WorkloadRegistry;
use crate::proxy::upstream::UpstreamClient;
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Json, Response},
    routing::{get, MethodRouter},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Request body limit for forwarded writes
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for OpenID discovery and JWKS requests (seconds)
const IDENTITY_PROVIDER_TIMEOUT: u64 = 15;

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    /// Hosts document as loaded, served by /config
    pub hosts: Arc<HostsConfig>,
    pub registry: Arc<WorkloadRegistry>,
    pub upstream: Arc<UpstreamClient>,
    pub authenticator: Arc<AzureAdValidator>,
    pub upstream_scheme: String,
}

impl AppState {
    /// Build state from a settled hosts document.
    ///
    /// Taking the loaded document by value is what sequences route
    /// installation after the config fetch.
    pub fn new(config: &AppConfig, hosts: HostsConfig) -> AppResult<Self> {
        let registry = WorkloadRegistry::from_hosts(&hosts);
        let upstream = UpstreamClient::new(
            config.proxy.request_timeout,
            Some(&config.proxy.upstream_proxy),
        )?;
        let idp_client = crate::utils::http::create_client_with_proxy(
            IDENTITY_PROVIDER_TIMEOUT,
            Some(&config.proxy.upstream_proxy),
        )?;

        Ok(Self {
            hosts: Arc::new(hosts),
            registry: Arc::new(registry),
            upstream: Arc::new(upstream),
            authenticator: Arc::new(AzureAdValidator::new(&config.azure, idp_client)),
            upstream_scheme: config.proxy.upstream_scheme.clone(),
        })
    }
}

/// Build the full router: gateway endpoints, workload routes, catch-all
pub fn build_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/config", get(handlers::info::handle_config))
        .route("/healthz", get(health_check_handler))
        .route(
            "/secure",
            secured(get(handlers::info::handle_secure), &state),
        );

    install_workload_routes(app, &state)
        .fallback(handlers::info::handle_info)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Bind `GET /name` and `GET|POST|PUT|DELETE|PATCH /name/` and `/name/*` per workload
///
/// Must run exactly once per router; a second pass would register
/// duplicate routes.
pub fn install_workload_routes(
    mut app: Router<AppState>,
    state: &AppState,
) -> Router<AppState> {
    use handlers::forward::handle_forward;

    for (name, workload) in state.registry.iter() {
        info!("Setting up routes for workload: {}", name);

        let exact = get(handle_forward);
        let nested = get(handle_forward)
            .post(handle_forward)
            .put(handle_forward)
            .delete(handle_forward)
            .patch(handle_forward);

        let (exact, nested) = match workload.provider {
            ProviderKind::Open => (exact, nested),
            ProviderKind::AzureSecured => (secured(exact, state), secured(nested, state)),
        };

        // `*rest` never matches an empty remainder, so `/name/` needs its own route
        app = app
            .route(&format!("/{}", name), exact)
            .route(&format!("/{}/", name), nested.clone())
            .route(&format!("/{}/*rest", name), nested);

        info!(
            "Routes registered for {} with provider: {}",
            name, workload.provider
        );
    }

    app
}

/// Put the authentication gate in front of a route
fn secured(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ))
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        config: &ProxyConfig,
        state: AppState,
    ) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let app = build_router(state);

        // Bind address
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Gateway server started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        info!("Gateway server stopped listening");
                        break;
                    }
                }
            }
        });

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        Ok((server_instance, handle))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
