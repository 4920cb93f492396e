//! Configuration file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Watches the configuration file and emits every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of the update channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive; dropping it
    /// stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Config file changed, reloading");
                    match load_config(&path) {
                        Ok(config) => {
                            if tx.send(config).is_err() {
                                tracing::debug!("Config receiver dropped, ignoring reload");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Rejected config reload, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ActionKind;
    use std::fs;

    fn text_action(body: &str) -> String {
        format!(
            r#"
            [[actions]]
            id = "home"
            kind = "text"
            body = "{body}"
            "#
        )
    }

    fn home_body(config: &AppConfig) -> Option<&str> {
        config.actions.iter().find_map(|action| match &action.kind {
            ActionKind::Text { body, .. } if action.id == "home" => Some(body.as_str()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_rewritten_file_is_sent_on_the_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, text_action("before")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&path, text_action("after")).unwrap();

        // A write may surface as several events; intermediate states are
        // either rejected or parsed as partial configs.
        let received = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(config) = updates.recv().await {
                if home_body(&config) == Some("after") {
                    return Some(config);
                }
            }
            None
        })
        .await
        .expect("no reload within the timeout");

        let config = received.expect("update channel closed");
        assert_eq!(config.actions.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_rewrite_is_not_sent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, text_action("before")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        let outcome = tokio::time::timeout(Duration::from_millis(500), async {
            while let Some(config) = updates.recv().await {
                if config.timeouts.request_secs == 0 {
                    return true;
                }
            }
            false
        })
        .await;
        assert!(!matches!(outcome, Ok(true)));
    }
}
