//! The servable site snapshot and its atomically-swappable handle.
//!
//! A [`SiteSnapshot`] is the fully rendered site at one point in time:
//! index listing pages plus every post and page as final HTML. It is built
//! off to the side by the rebuild task and installed with a single atomic
//! pointer store, so request handlers observe either the old or the new
//! site in full, never a mix.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 SnapshotHandle (ArcSwap)                    │
//! │                                                             │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐    │
//! │  │  Worker 1   │     │  Worker 2   │     │  Rebuild    │    │
//! │  │  (request)  │     │  (request)  │     │  task       │    │
//! │  └──────┬──────┘     └──────┬──────┘     └──────┬──────┘    │
//! │         │                   │                   │           │
//! │         ▼                   ▼                   ▼           │
//! │     current()           current()           install()       │
//! │    (lock-free)         (lock-free)      (atomic replace)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use arc_swap::ArcSwap;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable, fully rendered site. The unit of atomic replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteSnapshot {
    /// Monotonically increasing build number, stamped on install.
    /// Surfaced to clients as the `ETag` header.
    pub version: u64,

    /// Rendered index listing pages; `index[0]` is served at `/`,
    /// `index[n-1]` at `/page/{n}`. Always at least one entry.
    pub index: Vec<String>,

    /// Rendered posts by slug.
    pub posts: BTreeMap<String, String>,

    /// Rendered pages by slug.
    pub pages: BTreeMap<String, String>,
}

impl SiteSnapshot {
    /// Placeholder used before the first build is installed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rendered document for a slug. Posts shadow pages on collision.
    pub fn lookup(&self, slug: &str) -> Option<&str> {
        self.posts
            .get(slug)
            .or_else(|| self.pages.get(slug))
            .map(String::as_str)
    }

    /// Index listing page, 1-based.
    pub fn index_page(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.index.get(i))
            .map(String::as_str)
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Shared slot holding the currently served snapshot.
///
/// Single writer (the rebuild task), many lock-free readers (request
/// workers). A reader's `Arc` stays valid across later installs, so an
/// in-flight request keeps serving the snapshot it started with.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: ArcSwap<SiteSnapshot>,
    next_version: AtomicU64,
}

impl SnapshotHandle {
    /// Create a handle with `initial` installed as version 1.
    pub fn new(initial: SiteSnapshot) -> Self {
        let handle = Self {
            current: ArcSwap::from_pointee(SiteSnapshot::empty()),
            next_version: AtomicU64::new(1),
        };
        handle.install(initial);
        handle
    }

    /// Get the currently served snapshot. Wait-free.
    #[inline]
    pub fn current(&self) -> Arc<SiteSnapshot> {
        self.current.load_full()
    }

    /// Stamp `snapshot` with the next version and atomically make it the
    /// served site. Returns the stamped version.
    pub fn install(&self, mut snapshot: SiteSnapshot) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        snapshot.version = version;
        self.current.store(Arc::new(snapshot));
        version
    }
}

// =============================================================================
// Tests
// =============================================================================
