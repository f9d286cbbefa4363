//! `[serve]` section configuration.
//!
//! Contains HTTP server and file watcher settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in gazette.toml - server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"    # Listen on all interfaces
/// production_port = 8080
/// development_port = 8081
/// debounce_ms = 300        # File-change coalescing window
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port for production mode (default: 3000).
    #[serde(default = "defaults::serve::production_port")]
    #[educe(Default = defaults::serve::production_port())]
    pub production_port: u16,

    /// HTTP port for development mode, `gazette server --devel` (default: 3001).
    #[serde(default = "defaults::serve::development_port")]
    #[educe(Default = defaults::serve::development_port())]
    pub development_port: u16,

    /// Enable file watcher for live rebuild on changes.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,

    /// File-change coalescing window in milliseconds.
    /// Rapid events within this window trigger a single rebuild.
    #[serde(default = "defaults::serve::debounce_ms")]
    #[educe(Default = defaults::serve::debounce_ms())]
    pub debounce_ms: u64,

    /// Number of request worker threads.
    #[serde(default = "defaults::serve::workers")]
    #[educe(Default = defaults::serve::workers())]
    pub workers: usize,

    /// Grace period for in-flight requests on shutdown, in milliseconds.
    #[serde(default = "defaults::serve::grace_ms")]
    #[educe(Default = defaults::serve::grace_ms())]
    pub grace_ms: u64,
}

impl ServeConfig {
    /// Port for the requested mode.
    pub const fn port(&self, devel: bool) -> u16 {
        if devel {
            self.development_port
        } else {
            self.production_port
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Config;

    #[test]
    fn test_serve_config() {
        let config = r#"
            [site]
            title = "Test"

            [serve]
            interface = "0.0.0.0"
            production_port = 8080
            development_port = 8081
            watch = false
        "#;
        let config: Config = toml::from_str(config).unwrap();

        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.production_port, 8080);
        assert_eq!(config.serve.development_port, 8081);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = r#"
            [site]
            title = "Test"
        "#;
        let config: Config = toml::from_str(config).unwrap();

        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.production_port, 3000);
        assert_eq!(config.serve.development_port, 3001);
        assert!(config.serve.watch);
        assert_eq!(config.serve.debounce_ms, 300);
        assert_eq!(config.serve.workers, 4);
        assert_eq!(config.serve.grace_ms, 5000);
    }

    #[test]
    fn test_port_selection() {
        let config = r#"
            [site]
            title = "Test"

            [serve]
            production_port = 80
            development_port = 8080
        "#;
        let config: Config = toml::from_str(config).unwrap();

        assert_eq!(config.serve.port(false), 80);
        assert_eq!(config.serve.port(true), 8080);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [site]
            title = "Test"

            [serve]
            unknown_field = "should_fail"
        "#;
        let result: Result<Config, _> = toml::from_str(config);

        assert!(result.is_err());
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = r#"
            [site]
            title = "Test"

            [serve]
            production_port = 9000
        "#;
        let config: Config = toml::from_str(config).unwrap();

        // production port is overridden
        assert_eq!(config.serve.production_port, 9000);
        // everything else uses defaults
        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.development_port, 3001);
        assert!(config.serve.watch);
    }
}
