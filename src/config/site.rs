//! `[site]` section configuration.
//!
//! Contains basic site information like title, author, description, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in gazette.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [site]
/// title = "My Blog"
/// description = "A personal blog about systems programming"
/// author = "Alice"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title displayed in browser tab and headers.
    pub title: String,

    /// Author name for meta tags and templates.
    #[serde(default = "defaults::site::author")]
    #[educe(Default = defaults::site::author())]
    pub author: String,

    /// Site description for SEO meta tags.
    #[serde(default)]
    pub description: String,

    /// BCP 47 language code (e.g., "en-US", "fr").
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,

    /// Posts per index listing page. 0 disables pagination (one index page).
    #[serde(default = "defaults::site::posts_per_page")]
    #[educe(Default = defaults::site::posts_per_page())]
    pub posts_per_page: usize,
}
