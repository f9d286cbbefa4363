//! Lifecycle controller: startup ordering, the rebuild loop, shutdown.
//!
//! The [`Engine`] owns the state machine
//! `Stopped → Starting → Running → Stopping → Stopped` and wires the watcher
//! to the serving engine:
//!
//! ```text
//! ┌────────────────┐ changes ┌─────────────────┐ install ┌────────────────┐
//! │ Watcher Thread │────────▶│  Rebuild Thread │────────▶│ SnapshotHandle │
//! │ (notify+deb.)  │ channel │ (build+render)  │ ArcSwap │  (lock-free)   │
//! └────────────────┘         └─────────────────┘         └───────┬────────┘
//!                                                                │ current()
//!                                                     ┌──────────┴─────────┐
//!                                                     │  Request Workers   │
//!                                                     │  (tiny_http recv)  │
//!                                                     └────────────────────┘
//! ```
//!
//! [`Engine::run`] blocks until [`Engine::request_stop`] is called (or a
//! fatal startup error occurs). A rebuild failure during `Running` is logged
//! and leaves the prior snapshot live; the site degrades to stale, never to
//! broken. Rebuilds run one at a time; batches that arrive during a rebuild
//! coalesce into at most one pending rebuild.

use crate::{
    config::{Config, ConfigHandle},
    content::ContentSet,
    log,
    render::{self, TemplateSet},
    serve,
    snapshot::{SiteSnapshot, SnapshotHandle},
    watch,
};
use anyhow::{Context, Result, bail};
use notify::RecursiveMode;
use parking_lot::{Condvar, Mutex};
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::{Duration, Instant},
};
use tiny_http::Server;

// =============================================================================
// State Machine
// =============================================================================

/// Engine lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stopped,
    Starting,
    Running,
    Stopping,
}

// =============================================================================
// Engine
// =============================================================================

/// Owns the serving, watching and rebuilding threads.
pub struct Engine {
    config: Arc<ConfigHandle>,
    snapshot: Arc<SnapshotHandle>,
    state: Mutex<State>,
    state_changed: Condvar,
    stop: Arc<AtomicBool>,
    server: Mutex<Option<Arc<Server>>>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(ConfigHandle::new(config)),
            snapshot: Arc::new(SnapshotHandle::new(SiteSnapshot::empty())),
            state: Mutex::new(State::Stopped),
            state_changed: Condvar::new(),
            stop: Arc::new(AtomicBool::new(false)),
            server: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        *self.state.lock()
    }

    /// Build, bind and serve; blocks until stopped.
    ///
    /// Startup errors (bad templates, bad content, bind failure) are fatal
    /// and returned to the caller before any request is accepted.
    pub fn run(&self, devel: bool) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != State::Stopped {
                bail!("engine is already running");
            }
            *state = State::Starting;
            self.stop.store(false, Ordering::SeqCst);
        }
        self.state_changed.notify_all();

        let result = self.run_inner(devel);

        self.stop.store(true, Ordering::SeqCst);
        *self.server.lock() = None;
        {
            let mut state = self.state.lock();
            *state = State::Stopped;
        }
        self.state_changed.notify_all();

        result
    }

    /// Ask a running engine to stop. Non-blocking, idempotent, safe to call
    /// from a signal handler thread.
    pub fn request_stop(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                // A second stop is a no-op
                State::Stopped | State::Stopping => return,
                State::Starting | State::Running => *state = State::Stopping,
            }
        }
        self.stop.store(true, Ordering::SeqCst);

        // Wake workers stuck in recv() and the blocked run() call
        if let Some(server) = self.server.lock().as_ref() {
            let workers = self.config.current().serve.workers;
            for _ in 0..workers {
                server.unblock();
            }
        }
        self.state_changed.notify_all();
    }

    fn run_inner(&self, devel: bool) -> Result<()> {
        let config = self.config.current();

        // Initial build and render; the snapshot must be servable before the
        // socket opens.
        let templates = TemplateSet::load(&config.content.templates)
            .context("failed to compile templates")?;
        let content = ContentSet::build(&config).context("failed to build content")?;
        let initial =
            render::render(&content, &templates, &config).context("failed to render site")?;
        let version = self.snapshot.install(initial);
        log!("build"; "{} items rendered (snapshot v{version})", content.len());

        let port = config.serve.port(devel);
        let server = Arc::new(serve::bind(&config.serve.interface, port)?);
        *self.server.lock() = Some(Arc::clone(&server));
        log!("serve"; "http://{}:{}", config.serve.interface, port);
        if devel {
            log!("serve"; "running in development mode");
        }

        // Watcher → channel → rebuild pipeline
        let (changes_tx, changes_rx) = mpsc::channel();
        let mut background = Vec::new();
        if config.serve.watch {
            let roots = watch_roots(&config);
            let debounce = Duration::from_millis(config.serve.debounce_ms);
            let stop = Arc::clone(&self.stop);
            background.push(
                thread::Builder::new()
                    .name("gazette-watch".into())
                    .spawn(move || {
                        if let Err(err) = watch::watch_loop(roots, debounce, changes_tx, stop) {
                            log!("error"; "watcher failed: {err}");
                        }
                    })
                    .context("failed to spawn watcher thread")?,
            );

            let task = RebuildTask {
                config: Arc::clone(&self.config),
                snapshot: Arc::clone(&self.snapshot),
                stop: Arc::clone(&self.stop),
                content,
                templates,
            };
            background.push(
                thread::Builder::new()
                    .name("gazette-rebuild".into())
                    .spawn(move || task.run(&changes_rx))
                    .context("failed to spawn rebuild thread")?,
            );
        } else {
            drop(changes_tx);
        }

        // Request workers; each finishes its in-flight request before exiting
        let workers = config.serve.workers;
        let (done_tx, done_rx) = mpsc::channel();
        for n in 0..workers {
            let server = Arc::clone(&server);
            let snapshot = Arc::clone(&self.snapshot);
            let done = done_tx.clone();
            thread::Builder::new()
                .name(format!("gazette-serve-{n}"))
                .spawn(move || {
                    serve::worker_loop(&server, &snapshot);
                    // Release the listener before reporting done, so a
                    // subsequent run can rebind the port immediately
                    drop(server);
                    done.send(()).ok();
                })
                .context("failed to spawn request worker")?;
        }
        drop(done_tx);

        // Running; block here until stop is requested
        {
            let mut state = self.state.lock();
            if *state == State::Starting {
                *state = State::Running;
                self.state_changed.notify_all();
            }
            while *state == State::Running {
                self.state_changed.wait(&mut state);
            }
        }

        // Stopping: close the accept loop, then drain in-flight requests
        // within the grace period.
        for _ in 0..workers {
            server.unblock();
        }
        let deadline = Instant::now() + Duration::from_millis(config.serve.grace_ms);
        let mut finished = 0;
        while finished < workers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match done_rx.recv_timeout(remaining) {
                Ok(()) => finished += 1,
                Err(_) => {
                    log!("serve"; "grace period elapsed with {} request worker(s) busy",
                         workers - finished);
                    break;
                }
            }
        }

        // Watcher observes the stop flag; the rebuild task follows when the
        // change channel closes. An in-progress rebuild discards its result.
        for handle in background {
            handle.join().ok();
        }

        log!("serve"; "stopped");
        Ok(())
    }
}

/// Directories (and the config file) the watcher monitors.
fn watch_roots(config: &Config) -> Vec<(PathBuf, RecursiveMode)> {
    let mut roots = vec![
        (config.content.posts.clone(), RecursiveMode::Recursive),
        (config.content.pages.clone(), RecursiveMode::Recursive),
        (config.content.templates.clone(), RecursiveMode::Recursive),
    ];
    if config.config_path.is_file() {
        roots.push((config.config_path.clone(), RecursiveMode::NonRecursive));
    }
    roots
}

// =============================================================================
// Rebuild Task
// =============================================================================

/// Consumes change batches and turns them into snapshot installs.
///
/// Owns the working content and template sets so incremental builds stay
/// proportional to the change, not the site.
struct RebuildTask {
    config: Arc<ConfigHandle>,
    snapshot: Arc<SnapshotHandle>,
    stop: Arc<AtomicBool>,
    content: ContentSet,
    templates: TemplateSet,
}

impl RebuildTask {
    fn run(mut self, changes: &mpsc::Receiver<Vec<PathBuf>>) {
        while let Ok(first) = changes.recv() {
            // At most one pending rebuild: merge whatever queued while the
            // previous rebuild ran.
            let mut changed = first;
            while let Ok(more) = changes.try_recv() {
                changed.extend(more);
            }

            if self.stop.load(Ordering::Relaxed) {
                break;
            }

            match self.rebuild(&changed) {
                Ok(Some(version)) => log!("watch"; "rebuilt, serving snapshot v{version}"),
                Ok(None) => {}
                Err(err) => {
                    log!("error"; "rebuild failed, keeping last good snapshot: {err:#}");
                }
            }
        }
    }

    /// One rebuild pass: categorize the batch, build the candidate site off
    /// to the side, then a single atomic install.
    ///
    /// Returns the installed version, or `None` when the rebuild was skipped
    /// (config reload failure) or abandoned (shutdown started mid-build).
    fn rebuild(&mut self, changed: &[PathBuf]) -> Result<Option<u64>> {
        let mut config = self.config.current();

        let config_changed = changed.iter().any(|path| *path == config.config_path);
        let templates_changed = changed
            .iter()
            .any(|path| path.starts_with(&config.content.templates));

        if config_changed {
            if let Err(err) = self.config.reload() {
                log!("error"; "config reload failed, keeping previous config: {err:#}");
                return Ok(None);
            }
            config = self.config.current();
            log!("watch"; "config reloaded");
        }

        let templates = if templates_changed || config_changed {
            Some(TemplateSet::load(&config.content.templates)?)
        } else {
            None
        };

        let content = if config_changed {
            // Content paths may have moved; start over
            ContentSet::build(&config)?
        } else {
            self.content.build_incremental(changed, &config)?
        };

        let next = render::render(&content, templates.as_ref().unwrap_or(&self.templates), &config)?;

        // Shutdown started while we were building: abandon the result
        if self.stop.load(Ordering::Relaxed) {
            return Ok(None);
        }

        let version = self.snapshot.install(next);

        // Commit the working sets only once their snapshot is live
        self.content = content;
        if let Some(templates) = templates {
            self.templates = templates;
        }

        Ok(Some(version))
    }
}

// =============================================================================
// Tests
// =============================================================================
