//! HTTP server module with TLS support.
//!
//! This module provides the HTTPS listener with two modes:
//! - **Manual (default)**: user-provided certificate and key files
//! - **None**: plain HTTP (explicit opt-out for development)
//!
//! It also hosts the static file service the listener dispatches to and an
//! optional HTTP to HTTPS redirect listener.

pub mod server;
pub mod static_files;

pub use server::{check_cert_files, listen_addr, start_server, ServerError};
