//! HTTP/HTTPS server startup logic.
//!
//! Supports two TLS modes:
//! - Manual: user-provided certificate files (default)
//! - None: plain HTTP
//!
//! Startup is fail-fast: missing certificate files, malformed PEM data, and
//! bind failures all abort before the server accepts a single connection.

use std::net::SocketAddr;
use std::path::Path;

use axum::extract::Request;
use axum::response::Redirect;
use axum::routing::any;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use crate::config::{AppConfig, TlsConfig, TlsMode};

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),

    #[error("Certificate file not found: {0}")]
    MissingCertificate(String),

    #[error("Private key file not found: {0}")]
    MissingKey(String),

    #[error("Failed to load TLS configuration: {0}")]
    TlsSetup(String),

    #[error("Failed to bind or serve {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the configured listen address.
pub fn listen_addr(config: &AppConfig) -> Result<SocketAddr, ServerError> {
    format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .map_err(|e| {
            ServerError::InvalidAddr(format!(
                "{}:{} ({})",
                config.http.host, config.http.port, e
            ))
        })
}

/// Verify the certificate and key files exist before any socket operation.
///
/// One-time startup precondition, no retry. The error names exactly which
/// file is missing so a typo in the config is obvious.
pub fn check_cert_files(cert_path: &str, key_path: &str) -> Result<(), ServerError> {
    if !Path::new(cert_path).is_file() {
        return Err(ServerError::MissingCertificate(cert_path.to_string()));
    }
    if !Path::new(key_path).is_file() {
        return Err(ServerError::MissingKey(key_path.to_string()));
    }
    Ok(())
}

/// Start the HTTP/HTTPS server based on configuration.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, config: &AppConfig) -> Result<(), ServerError> {
    let addr = listen_addr(config)?;

    match config.tls.mode {
        TlsMode::None => {
            tracing::warn!(
                "TLS disabled - server running on plain HTTP (anyone on the network can read the traffic)"
            );
            start_plain_server(app, addr).await
        }
        TlsMode::Manual => start_manual_tls_server(app, addr, &config.tls).await,
    }
}

/// Start a plain HTTP server (no TLS).
async fn start_plain_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    tracing::info!(%addr, "Starting HTTP server (no TLS)");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Start the HTTPS server with user-provided certificates.
async fn start_manual_tls_server(
    app: Router,
    addr: SocketAddr,
    tls: &TlsConfig,
) -> Result<(), ServerError> {
    check_cert_files(&tls.cert_path, &tls.key_path)?;

    tracing::info!(%addr, cert = %tls.cert_path, key = %tls.key_path, "Starting HTTPS server");

    // Loads the chain and key and fails on malformed PEM data or a key that
    // does not match the certificate.
    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| ServerError::TlsSetup(format!("Failed to load certificates: {}", e)))?;

    if tls.redirect_http {
        spawn_redirect_server(tls.redirect_port, addr.port());
    }

    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Spawn a plain-HTTP listener that redirects every request to HTTPS.
///
/// Runs in the background and does not block startup; a failure here is
/// logged but does not take down the HTTPS listener.
fn spawn_redirect_server(http_port: u16, https_port: u16) {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], http_port));

        tracing::info!(http_port, https_port, "Starting HTTP->HTTPS redirect listener");

        let app = Router::new().fallback(any(move |req: Request| async move {
            let host = req
                .headers()
                .get(http::header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            let host = host.split(':').next().unwrap_or(host);
            let path = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");

            let target = if https_port == 443 {
                format!("https://{}{}", host, path)
            } else {
                format!("https://{}:{}{}", host, https_port, path)
            };
            Redirect::permanent(&target)
        }));

        if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
            tracing::error!(error = %e, "HTTP redirect listener failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpServerConfig;

    #[test]
    fn listen_addr_parses_configured_host_and_port() {
        let config = AppConfig {
            http: HttpServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8443,
            },
            ..AppConfig::default()
        };
        assert_eq!(
            listen_addr(&config).unwrap(),
            "127.0.0.1:8443".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn listen_addr_rejects_garbage_host() {
        let config = AppConfig {
            http: HttpServerConfig {
                host: "not a host".to_string(),
                port: 8443,
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            listen_addr(&config),
            Err(ServerError::InvalidAddr(_))
        ));
    }

    #[test]
    fn check_cert_files_names_the_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("certificate.crt");
        let key = dir.path().join("private.key");

        let err = check_cert_files(cert.to_str().unwrap(), key.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ServerError::MissingCertificate(ref p) if p.contains("certificate.crt")));

        std::fs::write(&cert, b"dummy").unwrap();
        let err = check_cert_files(cert.to_str().unwrap(), key.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ServerError::MissingKey(ref p) if p.contains("private.key")));

        std::fs::write(&key, b"dummy").unwrap();
        check_cert_files(cert.to_str().unwrap(), key.to_str().unwrap()).unwrap();
    }
}
