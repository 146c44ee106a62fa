use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware,
    response::Response,
    routing::{MethodRouter, get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};
use verihub_auth::checkpoint::CheckpointMachine;
use verihub_auth::http::{
    VerifyState, confirm_checkpoint_handler, generate_handler, method_not_allowed,
    session_handler, start_checkpoint_handler, validate_handler, verify_handler,
};
use verihub_auth::middleware::{CallerKey, INTERNAL_ERROR_MESSAGE, failure_response};

use crate::{
    config::AppConfig,
    handlers,
    middleware::{self as app_middleware, RequestId},
};

/// Shared router state.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub verify: VerifyState,
    pub checkpoints: CheckpointMachine,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            verify: VerifyState::from_config(&cfg.auth),
            checkpoints: CheckpointMachine::in_memory(&cfg.auth.checkpoint),
        }
    }
}

impl FromRef<AppState> for CallerKey {
    fn from_ref(state: &AppState) -> Self {
        state.verify.caller.clone()
    }
}

pub struct VerihubServer {
    addr: SocketAddr,
    app: Router,
    checkpoints: CheckpointMachine,
    sweep_interval: Duration,
}

pub fn build_app(cfg: &AppConfig) -> Router {
    build_app_with_state(cfg, AppState::from_config(cfg))
}

// Every route answers unsupported methods with the JSON 405 body.
fn only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed)
}

pub fn build_app_with_state(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Token issuance and validation
        .route("/generate", only(post(generate_handler)))
        .route("/api/generate", only(post(generate_handler)))
        .route("/validate", only(post(validate_handler)))
        .route("/api/validate", only(post(validate_handler)))
        .route("/verify", only(get(verify_handler)))
        // Checkpoint sessions
        .route("/sessions/{slug}", only(get(session_handler)))
        .route(
            "/sessions/{slug}/checkpoints/{step}/start",
            only(post(start_checkpoint_handler)),
        )
        .route(
            "/sessions/{slug}/checkpoints/{step}/confirm",
            only(post(confirm_checkpoint_handler)),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        // Middleware stack (innermost first: panic guard -> body limit -> trace -> compression/cors -> request id)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.as_str().to_string())
                        .unwrap_or_default();
                    // Only the path is recorded: /verify carries the token in its query.
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
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
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(app_middleware::request_id))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");
    failure_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
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

    pub fn build(self) -> VerihubServer {
        let state = AppState::from_config(&self.config);
        let checkpoints = state.checkpoints.clone();
        let app = build_app_with_state(&self.config, state);

        VerihubServer {
            addr: self.addr,
            app,
            checkpoints,
            sweep_interval: self.config.sweep_interval(),
        }
    }
}

impl VerihubServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        let sweeper = spawn_session_sweeper(self.checkpoints, self.sweep_interval);
        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        result?;
        Ok(())
    }
}

/// Periodically drops checkpoint sessions older than their TTL.
pub fn spawn_session_sweeper(
    checkpoints: CheckpointMachine,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = checkpoints.sweep().await {
                tracing::warn!(error = %e, "checkpoint session sweep failed");
            }
        }
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
