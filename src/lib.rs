//! Lanshare - ad-hoc HTTPS static file server for local networks.
//!
//! Serves a directory read-only over TLS so another device on the network
//! (typically a phone pointed at a development machine) can fetch files.
//! The flow is deliberately small: load a certificate/key pair, bind a TLS
//! listener, and hand every decrypted connection to a static file service.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;
