use garden_core::Message;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Quiet period used to fold the burst of events one save produces.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the page description and posts [`Message::ConfigReloaded`] on the
/// page queue after every change.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by renaming a temporary file over the original are still seen.
/// Watching stops when the handle is dropped.
pub struct ConfigWatcher {
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path` that reports to `queue`.
    ///
    /// The background task also ends when the queue is closed.
    pub fn spawn(path: impl AsRef<Path>, queue: mpsc::Sender<Message>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            task: tokio::spawn(watch_loop(path, queue)),
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn watch_loop(path: PathBuf, queue: mpsc::Sender<Message>) {
    use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

    let Some(dir) = path.parent().map(Path::to_path_buf) else {
        error!("Cannot watch '{}': no parent directory", path.display());
        return;
    };
    let file_name = path.file_name().map(|n| n.to_os_string());

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        warn!("Not watching '{}' for changes: {e}", dir.display());
        return;
    }

    info!("Watching page description: {}", path.display());

    let touches_page = |event: &Event| {
        use notify::EventKind::*;
        matches!(event.kind, Modify(_) | Create(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name)
    };

    while let Some(event) = sync_rx.recv().await {
        match event {
            Ok(e) if touches_page(&e) => {
                // Swallow the rest of this save.
                while let Ok(Some(_)) = tokio::time::timeout(DEBOUNCE, sync_rx.recv()).await {}
                debug!("Page description changed");
                if queue.send(Message::ConfigReloaded).await.is_err() {
                    break; // page gone
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Watcher error: {e}"),
        }
    }
}

