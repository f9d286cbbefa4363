//! The in-memory content store.
//!
//! A [`ContentSet`] is the parsed form of everything under the posts and
//! pages directories. Building is fail-fast: one malformed file aborts the
//! whole build, so a half-updated site never replaces a consistent one.

use super::item::{ContentItem, ContentKind};
use crate::config::Config;
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// Content scanning and parsing errors
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("duplicate {kind} slug `{slug}`: {first} and {second}")]
    DuplicateSlug {
        kind: &'static str,
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Immutable set of parsed posts and pages, keyed by source path.
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    items: BTreeMap<PathBuf, ContentItem>,
}

impl ContentSet {
    /// Scan the configured posts and pages directories and parse every
    /// eligible file.
    ///
    /// Fail-fast: the first malformed file aborts the entire build.
    pub fn build(config: &Config) -> Result<Self, ContentError> {
        let mut items = BTreeMap::new();

        for (dir, kind) in [
            (&config.content.posts, ContentKind::Post),
            (&config.content.pages, ContentKind::Page),
        ] {
            for path in markup_files(dir) {
                let item = ContentItem::load(&path, kind)?;
                items.insert(path, item);
            }
        }

        let set = Self { items };
        set.check_slugs()?;
        Ok(set)
    }

    /// Re-parse only the changed paths and merge with the rest of `self`.
    ///
    /// Deleted files drop out of the set; paths outside the content
    /// directories (or without a markup extension) are ignored. Functionally
    /// identical to a full [`ContentSet::build`].
    pub fn build_incremental(
        &self,
        changed: &[PathBuf],
        config: &Config,
    ) -> Result<Self, ContentError> {
        let mut items = self.items.clone();

        for path in changed {
            let Some(kind) = classify_source(path, config) else {
                continue;
            };
            if path.is_file() {
                let item = ContentItem::load(path, kind)?;
                items.insert(path.clone(), item);
            } else {
                items.remove(path);
            }
        }

        let set = Self { items };
        set.check_slugs()?;
        Ok(set)
    }

    /// All posts in reverse-chronological order (ties broken by slug).
    pub fn posts(&self) -> Vec<&ContentItem> {
        let mut posts: Vec<_> = self
            .items
            .values()
            .filter(|item| item.kind == ContentKind::Post)
            .collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        posts
    }

    /// All pages, in source-path order.
    pub fn pages(&self) -> impl Iterator<Item = &ContentItem> {
        self.items
            .values()
            .filter(|item| item.kind == ContentKind::Page)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slugs must be unique within a kind; a collision fails the build
    /// rather than silently overwriting one of the items.
    fn check_slugs(&self) -> Result<(), ContentError> {
        let mut seen: BTreeMap<(ContentKind, &str), &Path> = BTreeMap::new();

        for item in self.items.values() {
            if let Some(first) = seen.insert((item.kind, &item.slug), &item.source) {
                return Err(ContentError::DuplicateSlug {
                    kind: item.kind.as_str(),
                    slug: item.slug.clone(),
                    first: first.to_path_buf(),
                    second: item.source.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Which content directory a path belongs to, if any.
///
/// Used by incremental builds and by the rebuild task to route watcher
/// events; non-markup files are not content.
pub fn classify_source(path: &Path, config: &Config) -> Option<ContentKind> {
    if !has_markup_extension(path) {
        return None;
    }
    if path.starts_with(&config.content.posts) {
        Some(ContentKind::Post)
    } else if path.starts_with(&config.content.pages) {
        Some(ContentKind::Page)
    } else {
        None
    }
}

fn has_markup_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "markdown")
    )
}

/// Collect markup files under a directory, skipping hidden entries.
fn markup_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            !entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_markup_extension(path))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site_fixture() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["posts", "pages", "templates"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join("gazette.toml"), "[site]\ntitle = \"Test\"\n").unwrap();
        let config = Config::load(&dir.path().join("gazette.toml")).unwrap();
        (dir, config)
    }

    fn write_post(config: &Config, name: &str, content: &str) -> PathBuf {
        let path = config.content.posts.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn write_page(config: &Config, name: &str, content: &str) -> PathBuf {
        let path = config.content.pages.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_build_scans_posts_and_pages() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-hello.md", "---\ntitle: Hello\n---\nHi");
        write_post(&config, "2023-02-01-later.md", "---\ntitle: Later\n---\nMore");
        write_page(&config, "about.md", "---\ntitle: About\n---\nWho");

        let set = ContentSet::build(&config).unwrap();
        assert_eq!(set.len(), 3);

        let posts = set.posts();
        assert_eq!(posts.len(), 2);
        // Reverse-chronological
        assert_eq!(posts[0].slug, "later");
        assert_eq!(posts[1].slug, "hello");
        assert_eq!(set.pages().count(), 1);
    }

    #[test]
    fn test_build_ignores_non_markup_and_hidden() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-hello.md", "---\ntitle: Hello\n---\nHi");
        write_post(&config, "notes.txt", "not content");
        write_post(&config, ".2023-01-01-draft.md", "---\ntitle: Draft\n---\n");

        let set = ContentSet::build(&config).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_build_fails_fast_on_bad_file() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-good.md", "---\ntitle: Good\n---\nOk");
        write_post(&config, "2023-01-02-bad.md", "no front matter here");

        let err = ContentSet::build(&config).unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[test]
    fn test_build_rejects_duplicate_slug_within_kind() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-hello.md", "---\ntitle: A\n---\nOne");
        write_post(&config, "2023-02-01-hello.md", "---\ntitle: B\n---\nTwo");

        let err = ContentSet::build(&config).unwrap_err();
        match err {
            ContentError::DuplicateSlug { kind, slug, .. } => {
                assert_eq!(kind, "post");
                assert_eq!(slug, "hello");
            }
            other => panic!("expected DuplicateSlug, got {other}"),
        }
    }

    #[test]
    fn test_same_slug_across_kinds_is_allowed() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-about.md", "---\ntitle: A\n---\nPost");
        write_page(&config, "about.md", "---\ntitle: B\n---\nPage");

        let set = ContentSet::build(&config).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_incremental_matches_full_rebuild() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-hello.md", "---\ntitle: Hello\n---\nHi");
        let keep = write_post(&config, "2023-02-01-keep.md", "---\ntitle: Keep\n---\nOk");
        let set = ContentSet::build(&config).unwrap();

        // Modify one file, add another, delete a third
        let changed = write_post(&config, "2023-01-01-hello.md", "---\ntitle: Hello\n---\nBye");
        let added = write_post(&config, "2023-03-01-new.md", "---\ntitle: New\n---\nFresh");
        fs::remove_file(&keep).unwrap();

        let incremental = set
            .build_incremental(&[changed, added, keep], &config)
            .unwrap();
        let full = ContentSet::build(&config).unwrap();

        let inc: Vec<_> = incremental.posts().iter().map(|p| (p.slug.clone(), p.body.clone())).collect();
        let ful: Vec<_> = full.posts().iter().map(|p| (p.slug.clone(), p.body.clone())).collect();
        assert_eq!(inc, ful);
    }

    #[test]
    fn test_incremental_fails_fast_and_leaves_previous_usable() {
        let (_dir, config) = site_fixture();
        let path = write_post(&config, "2023-01-01-hello.md", "---\ntitle: Hello\n---\nHi");
        let set = ContentSet::build(&config).unwrap();

        write_post(&config, "2023-01-01-hello.md", "---\nbroken: [\n---\nHi");
        assert!(set.build_incremental(&[path], &config).is_err());

        // The previous set is untouched by the failed rebuild
        assert_eq!(set.posts()[0].body, "Hi");
    }

    #[test]
    fn test_incremental_ignores_unrelated_paths() {
        let (dir, config) = site_fixture();
        write_post(&config, "2023-01-01-hello.md", "---\ntitle: Hello\n---\nHi");
        let set = ContentSet::build(&config).unwrap();

        let unrelated = dir.path().join("templates").join("post.html");
        let next = set.build_incremental(&[unrelated], &config).unwrap();
        assert_eq!(next.len(), set.len());
    }

    #[test]
    fn test_incremental_detects_new_slug_collision() {
        let (_dir, config) = site_fixture();
        write_post(&config, "2023-01-01-hello.md", "---\ntitle: A\n---\nOne");
        let set = ContentSet::build(&config).unwrap();

        let added = write_post(&config, "2023-02-01-hello.md", "---\ntitle: B\n---\nTwo");
        let err = set.build_incremental(&[added], &config).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateSlug { .. }));
    }

    #[test]
    fn test_classify_source() {
        let (_dir, config) = site_fixture();

        let post = config.content.posts.join("2023-01-01-x.md");
        let page = config.content.pages.join("about.md");
        let template = config.content.templates.join("post.html");

        assert_eq!(classify_source(&post, &config), Some(ContentKind::Post));
        assert_eq!(classify_source(&page, &config), Some(ContentKind::Page));
        assert_eq!(classify_source(&template, &config), None);
        assert_eq!(
            classify_source(&config.content.posts.join("notes.txt"), &config),
            None
        );
    }
}
