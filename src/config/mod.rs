//! Site configuration management for `gazette.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[site]`    | Site metadata (title, author, language)           |
//! | `[content]` | Content directories (posts, pages, templates)     |
//! | `[serve]`   | HTTP server (ports, interface, watch, debounce)   |
//! | `[extra]`   | Free-form fields passed to templates unchanged    |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My Blog"
//! author = "Alice"
//!
//! [content]
//! posts = "posts"
//! pages = "pages"
//! templates = "templates"
//!
//! [serve]
//! production_port = 3000
//! development_port = 3001
//!
//! [extra]
//! analytics_id = "UA-12345"
//! ```
//!
//! A `Config` value is an immutable snapshot: it is loaded, anchored to the
//! site root and validated once, then shared read-only. Hot reload replaces
//! the whole value through [`ConfigHandle`], never mutates it.

mod content;
pub mod defaults;
mod error;
mod handle;
mod serve;
mod site;

pub use content::ContentConfig;
pub use error::ConfigError;
pub use handle::ConfigHandle;
pub use serve::ServeConfig;
pub use site::SiteConfig;

use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing gazette.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Absolute path to the site root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub site: SiteConfig,

    /// Content directory layout
    #[serde(default)]
    pub content: ContentConfig,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// User-defined extra fields, passed to templates unchanged
    #[serde(default)]
    pub extra: toml::Table,
}

impl Config {
    /// Parse configuration from a TOML string.
    ///
    /// The result is not anchored to any root; use [`Config::load`] for the
    /// full load-anchor-validate sequence.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load, anchor and validate configuration from a file path.
    ///
    /// Fails when the file is missing or malformed, or when a configured
    /// content directory does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;

        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.config_path = normalize_path(path);
        config.anchor(&root);
        config.validate()?;

        Ok(config)
    }

    /// Anchor all content paths to the site root and normalize to absolute.
    fn anchor(&mut self, root: &Path) {
        self.root = normalize_path(root);
        self.content.posts = normalize_path(&self.root.join(&self.content.posts));
        self.content.pages = normalize_path(&self.root.join(&self.content.pages));
        self.content.templates = normalize_path(&self.root.join(&self.content.templates));
    }

    /// Validate that the configured directories exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, path) in [
            ("[content.posts]", &self.content.posts),
            ("[content.pages]", &self.content.pages),
            ("[content.templates]", &self.content.templates),
        ] {
            if !path.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "{name} directory not found: {}",
                    path.display()
                )));
            }
        }

        if self.serve.workers == 0 {
            return Err(ConfigError::Validation(
                "[serve.workers] must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let config_str = r#"
            [site]
            title = "My Blog"
            author = "Test Author"
        "#;
        let config = Config::from_str(config_str).unwrap();

        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.site.author, "Test Author");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let invalid_config = r#"
            [site
            title = "My Blog"
        "#;
        let result = Config::from_str(invalid_config);

        assert!(result.is_err());
    }

    #[test]
    fn test_extra_fields() {
        let config = r#"
            [site]
            title = "Test"

            [extra]
            custom_field = "custom_value"
            number_field = 42
        "#;
        let config = Config::from_str(config).unwrap();

        assert_eq!(
            config.extra.get("custom_field").and_then(|v| v.as_str()),
            Some("custom_value")
        );
        assert_eq!(
            config.extra.get("number_field").and_then(|v| v.as_integer()),
            Some(42)
        );
    }

    #[test]
    fn test_extra_fields_nested() {
        let config = r#"
            [site]
            title = "Test"

            [extra.social]
            twitter = "@user"
            github = "username"
        "#;
        let config = Config::from_str(config).unwrap();

        let social = config.extra.get("social").and_then(|v| v.as_table());
        assert!(social.is_some());
        let social = social.unwrap();
        assert_eq!(social.get("twitter").and_then(|v| v.as_str()), Some("@user"));
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let config = r#"
            [site]
            title = "Test"

            [unknown_section]
            field = "value"
        "#;
        let result = Config::from_str(config);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/gazette.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }

    #[test]
    fn test_load_anchors_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for sub in ["posts", "pages", "templates"] {
            fs::create_dir(root.join(sub)).unwrap();
        }
        let config_path = root.join("gazette.toml");
        fs::write(&config_path, "[site]\ntitle = \"Test\"\n").unwrap();

        let config = Config::load(&config_path).unwrap();
        assert!(config.content.posts.is_absolute());
        assert!(config.content.posts.ends_with("posts"));
        assert!(config.root.is_absolute());
    }

    #[test]
    fn test_load_rejects_missing_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // Only posts exists; pages and templates are missing
        fs::create_dir(root.join("posts")).unwrap();
        let config_path = root.join("gazette.toml");
        fs::write(&config_path, "[site]\ntitle = \"Test\"\n").unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.site.title, "");
        assert_eq!(config.serve.production_port, 3000);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_default_config_round_trips() {
        // `gazette init` serializes the default config; it must parse back.
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_str(&serialized).unwrap();
        assert_eq!(parsed.serve.production_port, 3000);
        assert_eq!(parsed.site.posts_per_page, 10);
    }
}
