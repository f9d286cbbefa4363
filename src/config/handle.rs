//! Config handle with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement. This
//! enables hot-reloading of `gazette.toml` during watch mode: readers keep
//! whatever `Arc<Config>` they loaded, new readers see the replacement.
//!
//! A failed reload (parse or validation error) leaves the previous config in
//! effect; the caller decides whether to skip the rebuild it was part of.

use super::{Config, ConfigError};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Shared configuration slot with atomic replacement.
///
/// Single writer (the rebuild task), any number of lock-free readers.
#[derive(Debug)]
pub struct ConfigHandle {
    inner: ArcSwap<Config>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    /// Get the current config as `Arc<Config>`.
    ///
    /// Wait-free; the returned `Arc` stays valid across later reloads.
    #[inline]
    pub fn current(&self) -> Arc<Config> {
        self.inner.load_full()
    }

    /// Re-read gazette.toml and atomically replace the current config.
    ///
    /// On any error the previous config stays live and is returned to
    /// service untouched.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let prev = self.current();
        let next = Config::load(&prev.config_path)?;
        self.inner.store(Arc::new(next));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site_fixture() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["posts", "pages", "templates"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        let config_path = dir.path().join("gazette.toml");
        fs::write(&config_path, "[site]\ntitle = \"First\"\n").unwrap();
        let config = Config::load(&config_path).unwrap();
        (dir, config)
    }

    #[test]
    fn test_reload_replaces_config() {
        let (dir, config) = site_fixture();
        let handle = ConfigHandle::new(config);
        assert_eq!(handle.current().site.title, "First");

        fs::write(
            dir.path().join("gazette.toml"),
            "[site]\ntitle = \"Second\"\n",
        )
        .unwrap();
        handle.reload().unwrap();
        assert_eq!(handle.current().site.title, "Second");
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let (dir, config) = site_fixture();
        let handle = ConfigHandle::new(config);

        fs::write(dir.path().join("gazette.toml"), "[site\nbroken").unwrap();
        assert!(handle.reload().is_err());
        // Prior config stays in effect
        assert_eq!(handle.current().site.title, "First");
    }

    #[test]
    fn test_old_readers_keep_their_snapshot() {
        let (dir, config) = site_fixture();
        let handle = ConfigHandle::new(config);
        let before = handle.current();

        fs::write(
            dir.path().join("gazette.toml"),
            "[site]\ntitle = \"Second\"\n",
        )
        .unwrap();
        handle.reload().unwrap();

        assert_eq!(before.site.title, "First");
        assert_eq!(handle.current().site.title, "Second");
    }
}
