//! HTTP + WebSocket backing service for the web transport strategy.
//!
//! The service exposes `POST /api/:method`, `GET /ws/:channel`, and `GET /health`. Method
//! dispatch answers with placeholder defaults; the surrounding middleware stack (CORS,
//! compression, security headers, body limit, session cookie, tracing) and production static
//! bundle serving are fully configured.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod session;
pub mod ws;

use std::{io, net::SocketAddr};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

pub use config::{ConfigError, ServerConfig};
pub use dispatch::handle_ipc_method;
pub use error::ApiError;
pub use session::SessionSettings;

/// Maximum accepted request body size.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Content security policy sent with every response.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
style-src 'self' 'unsafe-inline'; \
img-src 'self' data: https:; \
connect-src 'self' ws: wss: https:";

/// Failures while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The server loop failed.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Builds the application router for `config`.
pub fn app(config: &ServerConfig) -> Router {
    let session_settings = SessionSettings::new(config.session_secret.as_str(), config.production);

    let mut router = Router::new()
        .route("/health", get(routes::health))
        .route("/api/:method", post(routes::ipc_method))
        .route("/ws/:channel", get(ws::channel_socket));

    if config.production {
        let index = config.static_dir.join("index.html");
        router = router
            .fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(middleware::from_fn_with_state(session_settings, session::session_layer))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(security_header(
            header::CONTENT_SECURITY_POLICY,
            CONTENT_SECURITY_POLICY,
        ))
        .layer(security_header(header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .layer(security_header(header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .layer(security_header(header::REFERRER_POLICY, "no-referrer"))
        .layer(
            CorsLayer::new()
                .allow_origin(config.client_origin.clone())
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}

fn security_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
}

/// Serves `config` on an already bound listener until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, config: &ServerConfig) -> Result<(), ServerError> {
    axum::serve(listener, app(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

/// Binds the configured port on all interfaces and serves until shutdown.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(
        %addr,
        production = config.production,
        client_origin = ?config.client_origin,
        "web server listening"
    );
    serve(listener, &config).await?;
    info!("web server stopped");
    Ok(())
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
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}
