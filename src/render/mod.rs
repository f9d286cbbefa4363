//! Rendering: content + templates → servable site snapshot.
//!
//! [`render`] is a pure function of its inputs: the same content set,
//! template set and config always produce byte-identical output. All site
//! state it needs travels in the tera context; nothing global is read.

mod markdown;
mod templates;

pub use markdown::render_markdown;
pub use templates::{REQUIRED_TEMPLATES, TemplateSet};

use crate::{
    config::Config,
    content::{ContentItem, ContentSet},
    snapshot::SiteSnapshot,
};
use rayon::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{name}`: {reason}")]
    Template { name: String, reason: String },

    #[error("failed to render `{item}`: {reason}")]
    Render { item: String, reason: String },
}

/// Flatten a tera error chain into one line.
///
/// `tera::Error`'s `Display` is only the outermost frame; the useful detail
/// (missing variable, filter failure) lives in its sources.
pub(crate) fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

// ============================================================================
// Rendering
// ============================================================================

/// Render the full site.
///
/// Each item is rendered with the template for its kind; the index listing
/// pages carry the reverse-chronological post summaries, split by
/// `site.posts_per_page`. The returned snapshot has version 0; the caller
/// stamps it on install.
pub fn render(
    set: &ContentSet,
    templates: &TemplateSet,
    config: &Config,
) -> Result<SiteSnapshot, RenderError> {
    let site = site_context(config);
    let posts = set.posts();
    let summaries: Vec<Value> = posts.iter().map(|item| summary(item)).collect();

    let rendered_posts: BTreeMap<String, String> = posts
        .par_iter()
        .map(|item| {
            let html = render_item(item, templates, &site, &summaries)?;
            Ok((item.slug.clone(), html))
        })
        .collect::<Result<_, RenderError>>()?;

    let pages: Vec<&ContentItem> = set.pages().collect();
    let rendered_pages: BTreeMap<String, String> = pages
        .par_iter()
        .map(|item| {
            let html = render_item(item, templates, &site, &summaries)?;
            Ok((item.slug.clone(), html))
        })
        .collect::<Result<_, RenderError>>()?;

    let index = render_index(templates, &site, &summaries, config.site.posts_per_page)?;

    Ok(SiteSnapshot {
        version: 0,
        index,
        posts: rendered_posts,
        pages: rendered_pages,
    })
}

/// Render one post or page with the template for its kind.
fn render_item(
    item: &ContentItem,
    templates: &TemplateSet,
    site: &Value,
    summaries: &[Value],
) -> Result<String, RenderError> {
    let content = render_markdown(&item.body);

    let mut context = tera::Context::new();
    context.insert("site", site);
    context.insert("posts", summaries);
    context.insert(
        "page",
        &json!({
            "title": item.title,
            "slug": item.slug,
            "url": format!("/{}", item.slug),
            "date": item.date.map(|d| d.to_string()),
            "content": content,
            "extra": item.extra,
        }),
    );

    templates
        .render(item.kind.template(), &context)
        .map_err(|err| RenderError::Render {
            item: item.source.display().to_string(),
            reason: describe(&err),
        })
}

/// Render the index listing pages, one per `posts_per_page` chunk.
///
/// `posts_per_page == 0` disables pagination; there is always at least one
/// index page, even for an empty site.
fn render_index(
    templates: &TemplateSet,
    site: &Value,
    summaries: &[Value],
    posts_per_page: usize,
) -> Result<Vec<String>, RenderError> {
    let per_page = if posts_per_page == 0 {
        summaries.len().max(1)
    } else {
        posts_per_page
    };

    let chunks: Vec<&[Value]> = if summaries.is_empty() {
        vec![&[]]
    } else {
        summaries.chunks(per_page).collect()
    };
    let total = chunks.len();

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let number = i + 1;
            let prev = match number {
                1 => None,
                2 => Some("/".to_string()),
                n => Some(format!("/page/{}", n - 1)),
            };
            let next = (number < total).then(|| format!("/page/{}", number + 1));

            let mut context = tera::Context::new();
            context.insert("site", site);
            context.insert("posts", chunk);
            context.insert(
                "pagination",
                &json!({ "number": number, "total": total, "prev": prev, "next": next }),
            );

            templates
                .render("index.html", &context)
                .map_err(|err| RenderError::Render {
                    item: format!("index page {number}"),
                    reason: describe(&err),
                })
        })
        .collect()
}

// ============================================================================
// Context construction
// ============================================================================

/// Site-wide template context: `[site]` fields plus `[extra]` unchanged.
fn site_context(config: &Config) -> Value {
    json!({
        "title": config.site.title,
        "author": config.site.author,
        "description": config.site.description,
        "language": config.site.language,
        "extra": config.extra,
    })
}

/// Post summary entry for listing contexts.
fn summary(item: &ContentItem) -> Value {
    json!({
        "title": item.title,
        "slug": item.slug,
        "url": format!("/{}", item.slug),
        "date": item.date.map(|d| d.to_string()),
        "extra": item.extra,
    })
}

// ============================================================================
// Tests
// ============================================================================
