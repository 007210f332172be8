//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the echo fallback
//! - Wire up middleware (request ID, tracing, timeout, CORS, policy enforcement)
//! - Bind server to listener
//! - Apply configuration updates by swapping the gateway state

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request},
    middleware,
    response::Json,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::Principal;
use crate::config::GatewayConfig;
use crate::events::EventPublisher;
use crate::http::middleware::security::security_middleware;
use crate::http::request::request_id;
use crate::lifecycle::startup::{self, Gateway, StartupError};
use crate::lifecycle::Shutdown;
use crate::security::features::CorsSettings;

/// Application state injected into middleware.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ArcSwap<Gateway>>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(ArcSwap::from_pointee(gateway)),
        }
    }
}

/// HTTP server for the policy gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    /// CORS settings the layer was built with; fixed for the process lifetime.
    cors: Option<CorsSettings>,
    /// Outlives reloads so registered listeners keep receiving events.
    publisher: Arc<EventPublisher>,
}

impl HttpServer {
    /// Assemble the gateway state from `config` and build the router around it.
    pub fn new(config: &GatewayConfig) -> Result<Self, StartupError> {
        Ok(Self::with_gateway(config, startup::assemble(config)?))
    }

    /// Build the router around an already assembled gateway.
    pub fn with_gateway(config: &GatewayConfig, gateway: Gateway) -> Self {
        let cors = gateway.rules.features().cors.clone();
        let publisher = gateway.responder.publisher().clone();
        let state = AppState::new(gateway);
        let router = build_router(
            state.clone(),
            cors.as_ref(),
            Duration::from_secs(config.timeouts.request_secs),
        );
        Self {
            router,
            state,
            cors,
            publisher,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Rebuild the gateway state from `config` and publish it atomically.
    ///
    /// On failure the previous state stays published. The event publisher is carried over.
    pub fn apply_config(&self, config: &GatewayConfig) -> Result<(), StartupError> {
        apply_config(&self.state, self.cors.as_ref(), &self.publisher, config)
    }

    /// Run the server until `shutdown` fires, applying configuration updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: Option<mpsc::UnboundedReceiver<GatewayConfig>>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(mut updates) = config_updates {
            let state = self.state.clone();
            let cors = self.cors.clone();
            let publisher = self.publisher.clone();
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        update = updates.recv() => match update {
                            Some(config) => {
                                if let Err(e) = apply_config(&state, cors.as_ref(), &publisher, &config) {
                                    tracing::error!(error = %e, "Config reload rejected. Keeping current policy");
                                }
                            }
                            None => break,
                        },
                        _ = stop.recv() => break,
                    }
                }
                tracing::debug!("Config reload loop stopped");
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::wait(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_config(
    state: &AppState,
    cors: Option<&CorsSettings>,
    publisher: &Arc<EventPublisher>,
    config: &GatewayConfig,
) -> Result<(), StartupError> {
    let gateway = startup::assemble_with_publisher(config, publisher.clone())?;
    if gateway.rules.features().cors.as_ref() != cors {
        tracing::warn!("CORS settings changed; they take effect after a restart");
    }
    if Duration::from_millis(config.events.listener_budget_ms) != publisher.budget() {
        tracing::warn!("Event listener budget changed; it takes effect after a restart");
    }
    state.gateway.store(Arc::new(gateway));
    tracing::info!("Policy reloaded");
    Ok(())
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, cors: Option<&CorsSettings>, request_timeout: Duration) -> Router {
    let router = Router::new()
        .fallback(echo_handler)
        .layer(middleware::from_fn_with_state(state, security_middleware));

    let router = match cors {
        Some(settings) => router.layer(cors_layer(settings)),
        None => router,
    };

    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Translate CORS settings into a tower-http layer. `"*"` entries mean any.
pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins = if wildcard(&settings.allowed_origins) {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(settings.allowed_origins.iter().filter_map(|o| {
            HeaderValue::from_str(o)
                .inspect_err(|_| tracing::warn!(origin = %o, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    // Credentials cannot be combined with a literal `*`; mirror the request instead.
    let methods = match (wildcard(&settings.allowed_methods), settings.allow_credentials) {
        (true, false) => AllowMethods::from(Any),
        (true, true) => AllowMethods::mirror_request(),
        (false, _) => AllowMethods::list(
            settings
                .allowed_methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.as_bytes()).ok()),
        ),
    };
    let headers = match (wildcard(&settings.allowed_headers), settings.allow_credentials) {
        (true, false) => AllowHeaders::from(Any),
        (true, true) => AllowHeaders::mirror_request(),
        (false, _) => AllowHeaders::list(
            settings
                .allowed_headers
                .iter()
                .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok()),
        ),
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(settings.allow_credentials)
        .max_age(Duration::from_secs(settings.max_age_secs))
}

fn wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

/// Stand-in for the protected application: echoes what the policy let through.
async fn echo_handler(req: Request<Body>) -> Json<serde_json::Value> {
    let principal = req.extensions().get::<Principal>().cloned();
    let request_id = request_id(req.headers());

    Json(serde_json::json!({
        "method": req.method().as_str(),
        "path": req.uri().path(),
        "request_id": request_id,
        "principal": principal,
    }))
}
