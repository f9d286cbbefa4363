//! `[content]` section configuration.
//!
//! Paths to the directories holding posts, pages and templates.
//! Relative paths are anchored to the site root when the config is loaded.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in gazette.toml - content directory layout.
///
/// # Example
/// ```toml
/// [content]
/// posts = "posts"
/// pages = "pages"
/// templates = "templates"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Directory holding post source files.
    #[serde(default = "defaults::content::posts")]
    #[educe(Default = defaults::content::posts())]
    pub posts: PathBuf,

    /// Directory holding page source files.
    #[serde(default = "defaults::content::pages")]
    #[educe(Default = defaults::content::pages())]
    pub pages: PathBuf,

    /// Directory holding tera templates.
    #[serde(default = "defaults::content::templates")]
    #[educe(Default = defaults::content::templates())]
    pub templates: PathBuf,
}
