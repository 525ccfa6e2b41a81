//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file and defines
//! constants for default paths, the listen address, and cache headers.
//! `AppConfig` is the root configuration struct; it is built once at startup
//! and never mutated afterwards, so every component sees the same settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// HTTP Response Cache Control
// =============================================================================
// Shared files change out from under the server all the time (that is the
// point of ad-hoc sharing), so responses are marked as immediately stale and
// clients revalidate on every request.

/// Max-age for served files, in seconds
pub const HTTP_CACHE_FILE_MAX_AGE: u32 = 0;

// Pre-formatted Cache-Control header value (compile-time string concatenation)
pub const CACHE_CONTROL_FILES: &str =
    formatcp!("private, max-age={}", HTTP_CACHE_FILE_MAX_AGE);

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "lanshare.toml";

/// Default listen address (all IPv4 interfaces)
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;

/// Default certificate file, looked up in the working directory
pub const DEFAULT_CERT_FILE: &str = "certificate.crt";

/// Default private key file, looked up in the working directory
pub const DEFAULT_KEY_FILE: &str = "private.key";

/// Default directory to serve (the working directory)
pub const DEFAULT_SERVE_ROOT: &str = ".";

/// Index file resolved for directory requests
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Default port for the optional HTTP->HTTPS redirect listener
pub const DEFAULT_REDIRECT_PORT: u16 = 80;

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "lanshare=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// TLS configuration
    #[serde(default)]
    pub tls: TlsConfig,
    /// Static serving configuration
    #[serde(default)]
    pub serve: ServeConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_BIND_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }
}

/// TLS operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// User-provided certificate and key files (default)
    Manual,
    /// Plain HTTP, no TLS (development escape hatch)
    None,
}

/// TLS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    #[serde(default = "TlsConfig::default_mode")]
    pub mode: TlsMode,
    /// Path to the PEM certificate chain
    #[serde(default = "TlsConfig::default_cert_path")]
    pub cert_path: String,
    /// Path to the PEM private key
    #[serde(default = "TlsConfig::default_key_path")]
    pub key_path: String,
    /// Spawn a plain-HTTP listener that redirects to HTTPS
    #[serde(default)]
    pub redirect_http: bool,
    /// Port for the redirect listener
    #[serde(default = "TlsConfig::default_redirect_port")]
    pub redirect_port: u16,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            mode: Self::default_mode(),
            cert_path: Self::default_cert_path(),
            key_path: Self::default_key_path(),
            redirect_http: false,
            redirect_port: Self::default_redirect_port(),
        }
    }
}

impl TlsConfig {
    fn default_mode() -> TlsMode {
        TlsMode::Manual
    }

    fn default_cert_path() -> String {
        DEFAULT_CERT_FILE.to_string()
    }

    fn default_key_path() -> String {
        DEFAULT_KEY_FILE.to_string()
    }

    fn default_redirect_port() -> u16 {
        DEFAULT_REDIRECT_PORT
    }
}

/// Static serving configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Directory served read-only, with its subdirectories
    #[serde(default = "ServeConfig::default_root")]
    pub root: PathBuf,
    /// Render HTML listings for directories without an index file
    #[serde(default = "ServeConfig::default_directory_listing")]
    pub directory_listing: bool,
    /// File resolved for directory requests before falling back to a listing
    #[serde(default = "ServeConfig::default_index_file")]
    pub index_file: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            directory_listing: Self::default_directory_listing(),
            index_file: Self::default_index_file(),
        }
    }
}

impl ServeConfig {
    fn default_root() -> PathBuf {
        PathBuf::from(DEFAULT_SERVE_ROOT)
    }

    fn default_directory_listing() -> bool {
        true
    }

    fn default_index_file() -> String {
        DEFAULT_INDEX_FILE.to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file if it exists; otherwise fall back to defaults.
    ///
    /// Used for the default config path so the binary runs with no files
    /// present. An explicitly passed `--config` goes through
    /// [`load`](AppConfig::load) instead and fails on a missing file.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.host.is_empty() {
            return Err(ConfigError::Validation(
                "http.host must not be empty".to_string(),
            ));
        }
        if self.tls.mode == TlsMode::Manual {
            if self.tls.cert_path.is_empty() {
                return Err(ConfigError::Validation(
                    "tls.cert_path must not be empty in manual TLS mode".to_string(),
                ));
            }
            if self.tls.key_path.is_empty() {
                return Err(ConfigError::Validation(
                    "tls.key_path must not be empty in manual TLS mode".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_constants() {
        let config = AppConfig::default();
        assert_eq!(config.http.host, DEFAULT_BIND_HOST);
        assert_eq!(config.http.port, DEFAULT_PORT);
        assert_eq!(config.tls.mode, TlsMode::Manual);
        assert_eq!(config.tls.cert_path, DEFAULT_CERT_FILE);
        assert_eq!(config.tls.key_path, DEFAULT_KEY_FILE);
        assert_eq!(config.serve.root, PathBuf::from(DEFAULT_SERVE_ROOT));
        assert!(config.serve.directory_listing);
        assert_eq!(config.serve.index_file, DEFAULT_INDEX_FILE);
        assert_eq!(config.logging.format, DEFAULT_LOG_FORMAT);
    }

    #[test]
    fn parses_full_config() {
        let toml = r#"
            [http]
            host = "127.0.0.1"
            port = 8443

            [tls]
            mode = "manual"
            cert_path = "tls/server.crt"
            key_path = "tls/server.key"
            redirect_http = true
            redirect_port = 8080

            [serve]
            root = "/srv/share"
            directory_listing = false

            [logging]
            format = "json"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 8443);
        assert_eq!(config.tls.cert_path, "tls/server.crt");
        assert!(config.tls.redirect_http);
        assert_eq!(config.tls.redirect_port, 8080);
        assert_eq!(config.serve.root, PathBuf::from("/srv/share"));
        assert!(!config.serve.directory_listing);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: AppConfig = toml::from_str("[http]\nport = 9000\n").unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, DEFAULT_BIND_HOST);
        assert_eq!(config.tls.mode, TlsMode::Manual);
        assert!(config.serve.directory_listing);
    }

    #[test]
    fn tls_none_mode_parses() {
        let config: AppConfig = toml::from_str("[tls]\nmode = \"none\"\n").unwrap();
        assert_eq!(config.tls.mode, TlsMode::None);
    }

    #[test]
    fn load_or_default_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.http.port, DEFAULT_PORT);
    }

    #[test]
    fn load_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppConfig::load(dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn load_rejects_empty_cert_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lanshare.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[tls]\ncert_path = \"\"").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }
}
