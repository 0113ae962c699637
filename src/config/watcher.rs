//! Directive file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{adapt, Adapted, ConfigError};
use crate::modules::ModuleRegistry;

/// Re-adapts the configuration whenever the directive file changes.
///
/// The latest good result is published through [`ConfigWatcher::current`]
/// and sent on the update channel; failed reloads keep the previous one.
#[derive(Clone)]
pub struct ConfigWatcher {
    config_path: PathBuf,
    manifest_path: Option<PathBuf>,
    registry: Arc<ModuleRegistry>,
    current: Arc<ArcSwap<Adapted>>,
    update_tx: mpsc::UnboundedSender<Arc<Adapted>>,
}

impl ConfigWatcher {
    /// Create a watcher starting from `initial`.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(
        config_path: &Path,
        manifest_path: Option<&Path>,
        registry: Arc<ModuleRegistry>,
        initial: Adapted,
    ) -> (Self, mpsc::UnboundedReceiver<Arc<Adapted>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                config_path: config_path.to_path_buf(),
                manifest_path: manifest_path.map(Path::to_path_buf),
                registry,
                current: Arc::new(ArcSwap::from_pointee(initial)),
                update_tx,
            },
            update_rx,
        )
    }

    /// Shared handle to the latest adapted configuration.
    pub fn current(&self) -> Arc<ArcSwap<Adapted>> {
        Arc::clone(&self.current)
    }

    /// Adapt the files again and publish the result.
    pub fn reload(&self) -> Result<Arc<Adapted>, ConfigError> {
        let adapted = Arc::new(adapt(
            &self.config_path,
            self.manifest_path.as_deref(),
            &self.registry,
        )?);
        self.current.store(Arc::clone(&adapted));
        let _ = self.update_tx.send(Arc::clone(&adapted));
        Ok(adapted)
    }

    /// Start watching the directive file in a background thread.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.config_path.clone();
        let reloader = self.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Directive file change detected, reloading...");
                        if let Err(e) = reloader.reload() {
                            tracing::error!(error = %e, "Reload failed, keeping current configuration");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn watcher_for(dir: &Path) -> (ConfigWatcher, mpsc::UnboundedReceiver<Arc<Adapted>>, PathBuf) {
        let config = dir.join("Edgefile");
        fs::write(&config, "{\n  servers {\n    protocol {\n      allow_h2c\n    }\n  }\n}\n").unwrap();
        let registry = Arc::new(ModuleRegistry::with_standard_modules());
        let initial = adapt(&config, None, &registry).unwrap();
        let (watcher, rx) = ConfigWatcher::new(&config, None, registry, initial);
        (watcher, rx, config)
    }

    #[test]
    fn test_reload_publishes_new_config() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, mut rx, config) = watcher_for(dir.path());
        let current = watcher.current();
        assert!(current.load().servers["srv0"].allow_h2c);

        fs::write(&config, "{\n  servers {\n    max_header_size 2KB\n  }\n}\n").unwrap();
        let reloaded = watcher.reload().unwrap();

        assert_eq!(reloaded.servers["srv0"].max_header_bytes, 2_000);
        assert!(!current.load().servers["srv0"].allow_h2c);
        assert_eq!(rx.try_recv().unwrap(), reloaded);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, mut rx, config) = watcher_for(dir.path());

        fs::write(&config, "{\n  servers {\n    protocol {\n      bogus_flag\n    }\n  }\n}\n").unwrap();
        assert!(watcher.reload().is_err());

        assert!(watcher.current().load().servers["srv0"].allow_h2c);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_run_starts_watching() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, _rx, _config) = watcher_for(dir.path());
        assert!(watcher.run().is_ok());
    }
}
