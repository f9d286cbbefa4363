//! File system watcher for live rebuild.
//!
//! Monitors the posts, pages and template directories plus the config file,
//! coalesces rapid events, and emits change notifications on a channel. The
//! watcher never rebuilds anything itself; detection and compilation stay
//! decoupled, with the rebuild task on the other end of the channel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Watcher Thread                          │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌─────────────────────┐     │
//! │  │ notify   │───▶│ Debouncer│───▶│ changes channel ────────▶ │ rebuild task
//! │  │ events   │    │ (300ms)  │    └─────────────────────┘     │
//! │  └──────────┘    └──────────┘                                │
//! │        │                                                     │
//! │        └── lost watch? re-establish with backoff             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ordering: events for a given path are delivered in occurrence order by
//! notify, and a coalesced batch carries the path's final state, which is
//! all a rebuild looks at.

use crate::log;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
    },
    time::{Duration, Instant},
};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Idle poll interval; bounds how quickly the loop observes a stop request.
const IDLE_TICK_MS: u64 = 250;

/// Re-watch backoff bounds for lost watches.
const REWATCH_BACKOFF_MIN_MS: u64 = 250;
const REWATCH_BACKOFF_MAX_MS: u64 = 8000;

/// Watcher errors
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file watcher")]
    Init(#[source] notify::Error),

    #[error("failed to watch `{path}`")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events into a single change notification.
pub struct Debouncer {
    window: Duration,
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    /// Record an event's paths, filtering editor temp files.
    pub fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    /// True once the coalescing window has elapsed since the last event.
    pub fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self.last_event.is_some_and(|t| t.elapsed() >= self.window)
    }

    /// Drain the pending batch.
    pub fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    /// How long the event loop may block before checking state again.
    pub fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_millis(IDLE_TICK_MS)
        } else {
            self.window
        }
    }
}

// =============================================================================
// Watch Targets
// =============================================================================

/// One watched root with its mode, tracked so a lost watch can be
/// re-established.
struct WatchTarget {
    path: PathBuf,
    mode: RecursiveMode,
    broken: bool,
}

/// Watched roots plus re-establish backoff state.
struct WatchSet {
    targets: Vec<WatchTarget>,
    backoff: Duration,
    next_attempt: Option<Instant>,
}

impl WatchSet {
    fn establish(watcher: &mut RecommendedWatcher, roots: Vec<(PathBuf, RecursiveMode)>) -> Result<Self, WatchError> {
        let mut targets = Vec::with_capacity(roots.len());
        for (path, mode) in roots {
            watcher
                .watch(&path, mode)
                .map_err(|source| WatchError::Watch {
                    path: path.clone(),
                    source,
                })?;
            targets.push(WatchTarget {
                path,
                mode,
                broken: false,
            });
        }
        Ok(Self {
            targets,
            backoff: Duration::from_millis(REWATCH_BACKOFF_MIN_MS),
            next_attempt: None,
        })
    }

    /// Mark the watch containing `path` as lost.
    fn mark_broken(&mut self, path: &Path) {
        for target in &mut self.targets {
            if !target.broken && (path == target.path || path.starts_with(&target.path)) {
                log!("watch"; "lost watch on {}", target.path.display());
                target.broken = true;
                self.next_attempt.get_or_insert_with(Instant::now);
            }
        }
    }

    /// Try to re-establish lost watches, doubling the backoff on failure.
    fn recover(&mut self, watcher: &mut RecommendedWatcher) {
        let due = self
            .next_attempt
            .is_some_and(|at| Instant::now() >= at);
        if !due {
            return;
        }

        let mut still_broken = false;
        for target in self.targets.iter_mut().filter(|t| t.broken) {
            watcher.unwatch(&target.path).ok();
            match watcher.watch(&target.path, target.mode) {
                Ok(()) => {
                    log!("watch"; "re-established watch on {}", target.path.display());
                    target.broken = false;
                }
                Err(_) => still_broken = true,
            }
        }

        if still_broken {
            self.backoff = (self.backoff * 2)
                .min(Duration::from_millis(REWATCH_BACKOFF_MAX_MS));
            self.next_attempt = Some(Instant::now() + self.backoff);
        } else {
            self.backoff = Duration::from_millis(REWATCH_BACKOFF_MIN_MS);
            self.next_attempt = None;
        }
    }

    /// A Remove event on a watched root means the OS watch is gone.
    fn note_event(&mut self, event: &Event) {
        if matches!(event.kind, EventKind::Remove(_)) {
            let roots: Vec<PathBuf> = self
                .targets
                .iter()
                .map(|t| t.path.clone())
                .collect();
            for path in &event.paths {
                if roots.iter().any(|root| root == path) {
                    self.mark_broken(path);
                }
            }
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Blocking watcher loop; runs on its own thread for the life of the server.
///
/// Debounced change batches go out on `changes`. Returns when `stop` is set
/// (observed within the idle tick) or when the notify backend goes away.
/// Dropping the sender on exit tells the rebuild task to finish.
pub fn watch_loop(
    roots: Vec<(PathBuf, RecursiveMode)>,
    debounce: Duration,
    changes: Sender<Vec<PathBuf>>,
    stop: Arc<AtomicBool>,
) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).map_err(WatchError::Init)?;
    let mut watches = WatchSet::establish(&mut watcher, roots)?;

    log_watch_summary(&watches);

    let mut debouncer = Debouncer::new(debounce);

    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => {
                watches.note_event(&event);
                debouncer.add(event);
            }
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                log!("watch"; "error: {err}");
                for path in &err.paths {
                    watches.mark_broken(path);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if debouncer.ready() {
                    let batch = debouncer.take();
                    if changes.send(batch).is_err() {
                        // Rebuild task is gone; nothing left to notify.
                        break;
                    }
                }
                watches.recover(&mut watcher);
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

fn log_watch_summary(watches: &WatchSet) {
    let paths: Vec<String> = watches
        .targets
        .iter()
        .map(|t| t.path.display().to_string())
        .collect();
    log!("watch"; "watching: {}", paths.join(", "));
}

// =============================================================================
// Tests
// =============================================================================
