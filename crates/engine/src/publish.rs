// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget event publishing.
//!
//! Lane operations hand events to [`Publisher::publish`] and move on. A
//! background task forwards them to the bus in order; bus errors, panics,
//! and publishes slower than [`PUBLISH_TIMEOUT`] are logged and never reach
//! the caller.
//!
//! The forwarding task starts on the first publish made inside a tokio
//! runtime. Events published before that are queued, so a publisher can be
//! built (and used) from synchronous code.

use helios_adapters::EventBus;
use helios_core::Event;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Longest a single bus publish may take before the event is dropped
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Event>,
    idle: Arc<Mutex<Option<Forwarder>>>,
}

struct Forwarder {
    rx: mpsc::UnboundedReceiver<Event>,
    bus: Arc<dyn EventBus>,
}

impl Publisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let publisher = Self { tx, idle: Arc::new(Mutex::new(Some(Forwarder { rx, bus }))) };
        publisher.start();
        publisher
    }

    /// Queue `event` for the bus. Never blocks and never fails.
    pub fn publish(&self, event: Event) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            tracing::warn!(topic = event.topic(), "publisher stopped, dropping event");
            return;
        }
        self.start();
    }

    /// Whether the forwarding task is running.
    pub fn is_started(&self) -> bool {
        self.idle.lock().is_none()
    }

    fn start(&self) {
        let Ok(handle) = Handle::try_current() else {
            return;
        };
        if let Some(forwarder) = self.idle.lock().take() {
            handle.spawn(forwarder.run());
        }
    }
}

impl Forwarder {
    async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            let topic = event.topic();
            let summary = event.log_summary();
            let bus = Arc::clone(&self.bus);
            // Own task per publish: a panicking bus must not end the loop.
            let publish = tokio::spawn(async move {
                tokio::time::timeout(PUBLISH_TIMEOUT, bus.publish(event)).await
            });
            match publish.await {
                Ok(Ok(Ok(()))) => tracing::trace!(topic, "published {summary}"),
                Ok(Ok(Err(e))) => tracing::warn!(topic, error = %e, "event publish failed"),
                Ok(Err(_)) => tracing::warn!(
                    topic,
                    timeout_ms = PUBLISH_TIMEOUT.as_millis() as u64,
                    "event publish timed out, dropping {summary}"
                ),
                Err(e) => tracing::error!(topic, error = %e, "event bus panicked"),
            }
        }
        tracing::debug!("event publisher stopped");
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
