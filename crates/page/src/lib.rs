//! The plant page for `garden`.
//!
//! Owns the event loop and wires together all background tasks:
//! - stdin command reader (user actions)
//! - Plant Service requests (one task per request)
//! - per-widget countdown timers
//! - page description watcher (live reload on change)

pub mod command;
pub mod page;

pub use command::parse_command;
pub use page::{Flow, Page};

use garden_client::HttpPlantService;
use garden_config::{load as load_config, resolve_path, ConfigWatcher};
use garden_core::{Message, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Capacity of the page event queue.
const QUEUE_CAPACITY: usize = 64;

// ── Entry point ───────────────────────────────────────────────────────────────

/// Load the page description, then run the page until `quit` or end of
/// input.
pub async fn run() -> Result<()> {
    let path = resolve_path();
    let config = load_config(&path)?;
    let service = HttpPlantService::new(&config.service.base_url, config.service.timeout())?;
    info!(
        "{} plants on the page, Plant Service at {}",
        config.plants.len(),
        service.base_url()
    );

    let (queue, mut events) = mpsc::channel(QUEUE_CAPACITY);
    let mut page = Page::new(service, &config, queue.clone()).with_source(&path);
    let _watcher = ConfigWatcher::spawn(&path, queue.clone());
    tokio::spawn(read_commands(queue));

    page.update(Message::Render);
    while let Some(message) = events.recv().await {
        if page.update(message) == Flow::Exit {
            break;
        }
    }

    info!("garden shutting down");
    Ok(())
}

/// Forward stdin lines to the page as messages; end of input means quit.
async fn read_commands(queue: mpsc::Sender<Message>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let message = match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Some(message) => message,
                None => {
                    if !line.trim().is_empty() {
                        warn!("Unrecognised command: {line}");
                    }
                    continue;
                }
            },
            Ok(None) => Message::Shutdown,
            Err(e) => {
                error!("Cannot read stdin: {e}");
                Message::Shutdown
            }
        };

        let last = matches!(message, Message::Shutdown);
        if queue.send(message).await.is_err() || last {
            break; // page gone or input finished
        }
    }
}
