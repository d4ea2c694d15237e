//! The HTTP front-end of the converter.
//!
//! A single endpoint is exposed:
//!
//! - `POST /api/certificate/convert`: converts the uploaded `pfxFile` using the given `password`
//!   and returns the DER encoded certificate, as `certificate.cer`.
mod convert;
mod error;

pub use error::HttpRequestError;

use crate::config::HttpSettings;
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use pfx_certificate::CertificateConverter;
use pfx_certificate::PfxConverter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub const CONVERT_ENDPOINT: &str = "/api/certificate/convert";

/// The routes of the HTTP service, using the given converter
pub fn router(converter: Arc<dyn CertificateConverter>, max_upload_size: usize) -> Router {
    convert::convert_router(converter).layer(DefaultBodyLimit::max(max_upload_size))
}

/// Serve the HTTP endpoint until the process receives Ctrl-C
pub async fn serve(settings: HttpSettings) -> anyhow::Result<()> {
    let address = SocketAddr::new(settings.bind_address, settings.port);
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding the HTTP endpoint to {address}"))?;
    serve_with_listener(listener, settings.max_upload_size, shutdown_signal()).await
}

pub async fn serve_with_listener(
    listener: TcpListener,
    max_upload_size: usize,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let address = listener.local_addr()?;
    let app = router(Arc::new(PfxConverter), max_upload_size);

    info!(%address, max_upload_size, "Listening for PFX conversion requests");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serving HTTP requests")?;
    info!("HTTP endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for the shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
