//! HTTP server facade for bookshelf with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    routing::get,
    Router,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::{Timestamp, Uuid};

use bookshelf_kernel::{settings::ServerSettings, Db, InitCtx, ModuleRegistry};

pub mod error;
pub mod router;

use error::AppError;
use router::RouterBuilder;

/// Serve `app` on the configured address until a shutdown signal arrives
pub async fn start_server(app: Router, settings: &ServerSettings) -> anyhow::Result<()> {
    let address = settings.bind_address();
    tracing::info!("starting HTTP server on {}", address);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to address {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, ctx: &InitCtx<'_>) -> Router {
    let mut router_builder = RouterBuilder::new()
        .route("/healthz", get(health_check))
        .route("/readyz", get(readiness_check).with_state(ctx.db.clone()));

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes(ctx));
    }

    // Layers last so they wrap every route above
    router_builder
        .with_openapi(registry)
        .with_timeout(ctx.settings.server.request_timeout_ms)
        .with_request_id()
        .with_cors()
        .with_tracing()
        .build()
}

/// Liveness endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Readiness endpoint: the database must answer
async fn readiness_check(State(db): State<Db>) -> Result<&'static str, AppError> {
    db.ping()
        .await
        .map_err(|err| AppError::unavailable(format!("database unreachable: {err:#}")))?;
    Ok("ready")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

/// Request ID generator for tracing
#[derive(Clone)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
