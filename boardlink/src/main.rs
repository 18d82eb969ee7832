//! boardlink — bridges a physical board to a remote chess server.
//!
//! Two long-lived flows share one piece of state: the watcher task folds
//! the remote event stream into the live session and drives the device
//! LEDs, while the foreground loop reads lines from the device and submits
//! the ones that look like moves. See `live` for the sharing discipline.

mod config;
mod device;
mod live;
mod render;
mod signals;
mod submit;
mod watcher;

use std::sync::Arc;

use anyhow::Context;
use board_client::HttpBoardApi;
use tokio::io::AsyncBufReadExt;

use config::Config;
use live::SharedGame;
use signals::LineSignalSink;
use submit::{SubmitOutcome, Submitter};
use watcher::Watcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let dev = device::open(&config.device)
        .with_context(|| format!("cannot open device {}", config.device.display()))?;
    tracing::info!(device = %config.device.display(), "device connected");

    let api = Arc::new(HttpBoardApi::new(&config.api_url, &config.token));
    let shared = SharedGame::new();

    let watcher = Watcher::new(
        api.clone(),
        shared.clone(),
        LineSignalSink::new(dev.writer),
        config.any_check,
    )
    .with_render();
    tokio::spawn(async move {
        if let Err(e) = watcher.run().await {
            tracing::error!("watcher stopped: {e:#}");
        }
    });

    let submitter = Submitter::new(api, shared);
    let mut lines = dev.reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match submitter.submit(line).await {
            SubmitOutcome::Sent => tracing::info!(mv = line, "move sent"),
            // Anything that isn't a move is a diagnostic line from the
            // device firmware; surface it as-is.
            SubmitOutcome::NotAMove => tracing::info!("device: {line}"),
            outcome => tracing::warn!(mv = line, "move not sent: {outcome}"),
        }
    }

    tracing::info!("device line channel closed");
    Ok(())
}
