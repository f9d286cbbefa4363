//! A single post or page, parsed from its source file.

use super::front_matter;
use super::set::ContentError;
use chrono::NaiveDate;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// What a content file is, which decides its template and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentKind {
    Post,
    Page,
}

impl ContentKind {
    /// Template file used to render items of this kind.
    pub const fn template(self) -> &'static str {
        match self {
            Self::Post => "post.html",
            Self::Page => "page.html",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }
}

/// One post or page: parsed metadata plus raw markup body.
///
/// Identity is the source file path; the item is recreated whenever its
/// source changes and dropped when the source is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Source file path (identity).
    pub source: PathBuf,

    pub kind: ContentKind,

    pub title: String,

    /// Publication date. Always `Some` for posts, `None` for pages.
    pub date: Option<NaiveDate>,

    /// URL slug, unique within a kind.
    pub slug: String,

    /// Raw markup body (markdown).
    pub body: String,

    /// Free-form front-matter fields, passed to templates unchanged.
    pub extra: BTreeMap<String, Value>,
}

impl ContentItem {
    /// Read and parse one content file.
    ///
    /// Post dates come from front-matter `date:`, falling back to a
    /// `YYYY-MM-DD-` filename prefix; a post with neither fails the build.
    pub fn load(path: &Path, kind: ContentKind) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path).map_err(|err| ContentError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;

        let (fm, body) = front_matter::parse(&raw).map_err(|reason| ContentError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ContentError::Parse {
                path: path.to_path_buf(),
                reason: "invalid file name".into(),
            })?;
        let (stem_date, stem_slug) = split_date_prefix(stem);

        let date = match kind {
            ContentKind::Post => {
                Some(
                    fm.date
                        .or(stem_date)
                        .ok_or_else(|| ContentError::Parse {
                            path: path.to_path_buf(),
                            reason: "post has no `date:` and no YYYY-MM-DD- filename prefix".into(),
                        })?,
                )
            }
            ContentKind::Page => None,
        };

        let slug = fm.slug.unwrap_or_else(|| slug::slugify(stem_slug));
        if slug.is_empty() {
            return Err(ContentError::Parse {
                path: path.to_path_buf(),
                reason: "slug is empty after normalization".into(),
            });
        }

        Ok(Self {
            source: path.to_path_buf(),
            kind,
            title: fm.title,
            date,
            slug,
            body: body.to_string(),
            extra: fm.extra,
        })
    }
}

/// Split a `YYYY-MM-DD-` prefix off a file stem.
///
/// `"2023-01-01-hello"` → `(Some(2023-01-01), "hello")`,
/// `"about"` → `(None, "about")`.
fn split_date_prefix(stem: &str) -> (Option<NaiveDate>, &str) {
    if stem.len() > 11 && stem.as_bytes()[10] == b'-' {
        if let Some(date) = front_matter::parse_date(&stem[..10]) {
            return (Some(date), &stem[11..]);
        }
    }
    (None, stem)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_split_date_prefix() {
        let (date, rest) = split_date_prefix("2023-01-01-hello");
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(rest, "hello");

        assert_eq!(split_date_prefix("about"), (None, "about"));
        assert_eq!(split_date_prefix("2023-99-99-bad"), (None, "2023-99-99-bad"));
        // Prefix without a following slug component is not a date prefix
        assert_eq!(split_date_prefix("2023-01-01"), (None, "2023-01-01"));
    }

    #[test]
    fn test_load_post_with_filename_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "2023-01-01-hello.md",
            "---\ntitle: Hello\n---\n\nHi there",
        );

        let item = ContentItem::load(&path, ContentKind::Post).unwrap();
        assert_eq!(item.title, "Hello");
        assert_eq!(item.slug, "hello");
        assert_eq!(item.date, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(item.body, "Hi there");
    }

    #[test]
    fn test_load_post_front_matter_date_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "2023-01-01-hello.md",
            "---\ntitle: Hello\ndate: 2024-06-15\n---\nBody.",
        );

        let item = ContentItem::load(&path, ContentKind::Post).unwrap();
        assert_eq!(item.date, NaiveDate::from_ymd_opt(2024, 6, 15));
    }

    #[test]
    fn test_load_post_without_date_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "hello.md", "---\ntitle: Hello\n---\nBody.");

        let err = ContentItem::load(&path, ContentKind::Post).unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn test_load_page_has_no_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "about.md", "---\ntitle: About\n---\nWho we are.");

        let item = ContentItem::load(&path, ContentKind::Page).unwrap();
        assert_eq!(item.slug, "about");
        assert_eq!(item.date, None);
    }

    #[test]
    fn test_load_slug_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "2023-01-01-some-post.md",
            "---\ntitle: Post\nslug: custom\n---\nBody.",
        );

        let item = ContentItem::load(&path, ContentKind::Post).unwrap();
        assert_eq!(item.slug, "custom");
    }

    #[test]
    fn test_load_slug_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "2023-01-01-Héllo World.md",
            "---\ntitle: Hello\n---\nBody.",
        );

        let item = ContentItem::load(&path, ContentKind::Post).unwrap();
        assert_eq!(item.slug, "hello-world");
    }

    #[test]
    fn test_load_malformed_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "2023-01-01-bad.md",
            "---\ntitle: [unclosed\n---\nBody.",
        );

        let err = ContentItem::load(&path, ContentKind::Post).unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err =
            ContentItem::load(Path::new("/nonexistent/post.md"), ContentKind::Post).unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }

    #[test]
    fn test_kind_template_names() {
        assert_eq!(ContentKind::Post.template(), "post.html");
        assert_eq!(ContentKind::Page.template(), "page.html");
    }
}
