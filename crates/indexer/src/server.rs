use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};


const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";


async fn get_metrics(Extension(registry): Extension<Arc<Registry>>) -> Response {
    let mut buffer = String::new();
    match prometheus_client::encoding::text::encode(&mut buffer, &registry) {
        Ok(_) => (
            [(CONTENT_TYPE, HeaderValue::from_static(OPENMETRICS_CONTENT_TYPE))],
            buffer
        ).into_response(),
        Err(err) => {
            error!(err =? err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}


pub fn build_router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .layer(Extension(Arc::new(registry)))
}


pub async fn run_metrics_server(
    registry: Registry,
    port: u16,
    shutdown: CancellationToken
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("serving metrics at {}", addr);

    axum::serve(listener, build_router(registry))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
