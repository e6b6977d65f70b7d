use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use wayfare_api::ApiError;
use wayfare_storage::DynCountryStore;

use crate::auth::JwtVerifier;
use crate::cache::DynCache;
use crate::countries::{CountryService, handlers as countries};
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub countries: CountryService,
    pub config: Arc<AppConfig>,
    /// `None` when auth is disabled; admin routes are then open.
    pub verifier: Option<JwtVerifier>,
}

pub struct WayfareServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let request_timeout = state.config.request_timeout();

    let admin = Router::new()
        .route(
            "/api/countries/cache/invalidate",
            post(countries::invalidate_cache),
        )
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            app_middleware::require_bearer,
        ));

    Router::new()
        // Health and info endpoints
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        // Country lookups; static segments win over `{code}`
        .route("/api/countries", get(countries::list_countries))
        .route("/api/countries/all", get(countries::list_all))
        .route("/api/countries/continents", get(countries::list_continents))
        .route("/api/countries/popular", get(countries::list_popular))
        .route("/api/countries/{code}", get(countries::get_country))
        .merge(admin)
        .with_state(state)
        // Layers wrap bottom-up: request id is outermost so the trace span can read it
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::record_metrics))
        .layer(middleware::from_fn(app_middleware::request_id))
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::request_timeout("Request timed out")
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::internal("Internal server error")
    }
}

/// Assembles a [`WayfareServer`] from configuration.
///
/// Store and cache default to the configured backends; tests inject their own.
pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    store: Option<DynCountryStore>,
    cache: Option<DynCache>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            store: None,
            cache: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_store(mut self, store: DynCountryStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cache(mut self, cache: DynCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn build(self) -> anyhow::Result<WayfareServer> {
        self.config.validate().map_err(anyhow::Error::msg)?;

        let store = match self.store {
            Some(store) => store,
            None => crate::create_country_store(&self.config).await?,
        };
        let cache = match self.cache {
            Some(cache) => cache,
            None => Arc::new(crate::create_cache_backend(&self.config.redis).await),
        };

        crate::metrics::init_metrics();

        let verifier = JwtVerifier::from_settings(&self.config.auth);
        if verifier.is_none() {
            tracing::warn!("Auth disabled, cache invalidation endpoint is unauthenticated");
        }

        tracing::info!(
            store.backend = store.backend_name(),
            store.connected = store.is_connected(),
            cache.mode = cache.mode(),
            "Country service ready"
        );

        let state = AppState {
            countries: CountryService::new(store, cache),
            config: Arc::new(self.config),
            verifier,
        };
        let app = build_app(state.clone());

        Ok(WayfareServer {
            addr: self.addr,
            app,
            state,
        })
    }
}

impl WayfareServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already-bound listener until ctrl-c.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        tracing::info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
