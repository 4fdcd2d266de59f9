//! Live device event watching
//!
//! A producer task polls the device's event feed and forwards each event over
//! a channel; the caller drains the channel. Cancellation is cooperative: the
//! producer checks the token between events and drops its sender on the way
//! out, which is what ends the consumer's loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::service::{DeviceEvent, EventSource};

/// Pause between polls that returned nothing
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

const CHANNEL_CAPACITY: usize = 64;

/// Spawn the polling producer
///
/// The task ends when the token is cancelled, the receiver goes away, or the
/// feed returns an error (which becomes the task's result).
pub fn spawn_producer(
    source: Arc<dyn EventSource>,
    cancel: CancellationToken,
    tx: mpsc::Sender<DeviceEvent>,
    interval: Duration,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let mut since = 0u64;

        loop {
            let events = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = source.poll_events(since) => polled?,
            };

            if events.is_empty() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => continue,
                }
            }

            for event in events {
                if cancel.is_cancelled() {
                    debug!("event producer cancelled mid-batch");
                    return Ok(());
                }
                since = since.max(event.seq);
                if tx.send(event).await.is_err() {
                    return Ok(());
                }
            }
        }

        debug!("event producer stopped");
        Ok(())
    })
}

/// Cancel `cancel` when the process receives Ctrl+C
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    info!("interrupt received, stopping watch");
                    cancel.cancel();
                }
            }
        }
    })
}

/// Feed every event to `on_event` until cancelled or `limit` events were seen
///
/// Returns the number of events delivered.
pub async fn run<F>(
    source: Arc<dyn EventSource>,
    cancel: CancellationToken,
    limit: Option<usize>,
    interval: Duration,
    mut on_event: F,
) -> Result<usize>
where
    F: FnMut(&DeviceEvent),
{
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let producer = spawn_producer(source, cancel.clone(), tx, interval);

    let mut seen = 0usize;
    while let Some(event) = rx.recv().await {
        on_event(&event);
        seen += 1;
        if limit.is_some_and(|limit| seen >= limit) {
            cancel.cancel();
            break;
        }
    }
    // let a producer blocked on a full channel observe the closed receiver
    drop(rx);

    producer.await??;
    Ok(seen)
}
