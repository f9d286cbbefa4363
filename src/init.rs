//! Site scaffolding: `init` creates the directory structure, `create` and
//! `page` copy the blank template into the right content directory.

use crate::{
    config::Config,
    content::{ContentItem, ContentKind},
    log,
};
use anyhow::{Context, Result, bail};
use chrono::Local;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config filename
pub const CONFIG_FILE: &str = "gazette.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &["posts", "pages", "templates"];

/// Default templates written by `init`, embedded at compile time
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("index.html", include_str!("embed/index.html")),
    ("post.html", include_str!("embed/post.html")),
    ("page.html", include_str!("embed/page.html")),
];

/// Blank content file used by `create`/`page`
const BLANK_TEMPLATE: &str = include_str!("embed/blank.md");

// ============================================================================
// init
// ============================================================================

/// Create a new site with default structure at `root`.
pub fn new_site(root: &Path, has_name: bool) -> Result<()> {
    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `gazette init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_default_templates(root)?;
    init_welcome_post(root)?;

    log!("init"; "new site at {}", root.display());
    log!("init"; "run `gazette server` inside it to go live");
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `gazette init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Write the embedded default templates
fn init_default_templates(root: &Path) -> Result<()> {
    let templates = root.join("templates");
    for (name, content) in DEFAULT_TEMPLATES {
        fs::write(templates.join(name), content)?;
    }
    Ok(())
}

/// Write a first post so the fresh site has something to serve
fn init_welcome_post(root: &Path) -> Result<()> {
    let today = Local::now().date_naive();
    let path = root.join("posts").join(format!("{today}-welcome.md"));
    fs::write(&path, BLANK_TEMPLATE.replace("{title}", "Welcome"))?;
    Ok(())
}

// ============================================================================
// create / page
// ============================================================================

/// Create a blank post or page named `title`, returning its path.
///
/// The file is parsed back once to surface slug/front-matter problems at
/// creation time instead of at the next rebuild.
pub fn create_blank(config: &Config, title: &str, kind: ContentKind) -> Result<PathBuf> {
    let title = title.trim();
    if title.is_empty() {
        bail!("A {} needs a name: `gazette {} <NAME>`", kind.as_str(), match kind {
            ContentKind::Post => "create",
            ContentKind::Page => "page",
        });
    }

    let stem = slug::slugify(title);
    if stem.is_empty() {
        bail!("`{title}` does not produce a usable filename");
    }

    let (dir, filename) = match kind {
        ContentKind::Post => {
            let today = Local::now().date_naive();
            (&config.content.posts, format!("{today}-{stem}.md"))
        }
        ContentKind::Page => (&config.content.pages, format!("{stem}.md")),
    };

    let path = dir.join(filename);
    if path.exists() {
        bail!("`{}` already exists", path.display());
    }

    fs::write(&path, BLANK_TEMPLATE.replace("{title}", title))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let item = ContentItem::load(&path, kind)?;
    log!("create"; "{} `{}` at {} (slug: /{})",
         kind.as_str(), title, path.display(), item.slug);
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
