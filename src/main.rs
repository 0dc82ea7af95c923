// src/main.rs
use anyhow::Result;
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::{error, info};

use healthz::{
    config,
    health::{self, CheckContext, Healthz, Status},
    metrics::MetricsRegistry,
    server::{HealthzHandler, ServerBuilder},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing(&["healthz=debug", "hyper=info"])?;
    // Check panics are logged by the registry itself.
    health::install_quiet_panic_hook();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config_or_default(&config_path).await?;

    let metrics_registry = MetricsRegistry::new()?;

    // A missing or unwritable identity file stops the process here.
    let mut healthz = Healthz::new(config.healthz.clone())?;
    register_builtin_checks(&mut healthz);
    let healthz = Arc::new(healthz.with_metrics(metrics_registry.collector()));

    if config.metrics.enabled {
        let metrics_addr: SocketAddr = (config.server.listen_addr.ip(), config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry, config.metrics.path.clone()).await?;
    }

    info!(
        service_id = %healthz.service_id(),
        checks = healthz.check_count(),
        "Starting health endpoint on {}{}",
        config.server.listen_addr,
        config.server.path
    );

    ServerBuilder::new(config.server.listen_addr)
        .with_handler(HealthzHandler::new(healthz, config.server.path.clone()))
        .serve_with_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn register_builtin_checks(healthz: &mut Healthz) {
    let started = Instant::now();
    healthz.add_check("process", "uptime", move |ctx: &mut CheckContext<'_>| {
        ctx.set("uptime_seconds", started.elapsed().as_secs().to_string());
        Status::Pass
    });

    let service_file = healthz.config().service_file.clone();
    healthz.add_check("filesystem", "service_file", move |ctx: &mut CheckContext<'_>| {
        service_file_status(ctx, &service_file)
    });
}

fn service_file_status(ctx: &mut CheckContext<'_>, path: &str) -> Status {
    match std::fs::metadata(Path::new(path)) {
        Ok(meta) if meta.len() > 0 && !meta.permissions().readonly() => Status::Pass,
        Ok(meta) if meta.len() > 0 => {
            ctx.note(format!("{} is read-only", path));
            Status::Warning
        }
        Ok(_) => {
            ctx.note(format!("{} is empty", path));
            Status::Fail
        }
        Err(e) => {
            ctx.note(format!("{}: {}", path, e));
            Status::Fail
        }
    }
}

async fn start_metrics_server(
    addr: SocketAddr,
    registry: MetricsRegistry,
    path: String,
) -> Result<()> {
    let registry = Arc::new(registry);
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move {
                    let response = if req.uri().path() != path.as_str() {
                        text_response(StatusCode::NOT_FOUND, Body::from("Not Found"))
                    } else {
                        match registry.gather() {
                            Ok(metrics) => {
                                let mut response = text_response(StatusCode::OK, Body::from(metrics));
                                response.headers_mut().insert(
                                    hyper::header::CONTENT_TYPE,
                                    hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
                                );
                                response
                            }
                            Err(e) => {
                                error!("Failed to encode metrics: {}", e);
                                text_response(StatusCode::INTERNAL_SERVER_ERROR, Body::empty())
                            }
                        }
                    };
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_service);

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

fn text_response(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
