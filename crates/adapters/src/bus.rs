// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus boundary.
//!
//! The bus itself lives outside this workspace; lanes only need somewhere to
//! publish lifecycle events. Publishing may fail, and callers are expected to
//! treat every failure as non-fatal.

use async_trait::async_trait;
use helios_core::Event;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from publish operations
#[derive(Debug, Error)]
pub enum BusError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("event bus closed")]
    Closed,
}

/// Adapter for publishing lane lifecycle events
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    async fn publish(&self, event: Event) -> Result<(), BusError>;
}

/// Bus that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventBus;

#[async_trait]
impl EventBus for NoopEventBus {
    async fn publish(&self, _event: Event) -> Result<(), BusError> {
        Ok(())
    }
}

/// Bus that forwards events into an mpsc channel owned by the embedding
/// process.
#[derive(Clone, Debug)]
pub struct ChannelEventBus {
    tx: mpsc::Sender<Event>,
}

impl ChannelEventBus {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventBus for ChannelEventBus {
    async fn publish(&self, event: Event) -> Result<(), BusError> {
        self.tx.send(event).await.map_err(|_| BusError::Closed)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{BusError, EventBus};
    use async_trait::async_trait;
    use helios_core::Event;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake bus recording every published event
    #[derive(Clone, Default)]
    pub struct FakeEventBus {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl FakeEventBus {
        pub fn new() -> Self {
            Self::default()
        }

        /// All recorded events, in publish order
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }

        /// Recorded topics, in publish order
        pub fn topics(&self) -> Vec<&'static str> {
            self.events.lock().iter().map(Event::topic).collect()
        }
    }

    #[async_trait]
    impl EventBus for FakeEventBus {
        async fn publish(&self, event: Event) -> Result<(), BusError> {
            self.events.lock().push(event);
            Ok(())
        }
    }

    /// How a [`FailingEventBus`] misbehaves
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum FailureMode {
        Error,
        Panic,
    }

    /// Fake bus whose every publish fails
    #[derive(Clone, Debug)]
    pub struct FailingEventBus {
        mode: FailureMode,
    }

    impl FailingEventBus {
        pub fn new(mode: FailureMode) -> Self {
            Self { mode }
        }
    }

    #[async_trait]
    impl EventBus for FailingEventBus {
        #[allow(clippy::panic)]
        async fn publish(&self, event: Event) -> Result<(), BusError> {
            match self.mode {
                FailureMode::Error => Err(BusError::PublishFailed(event.topic().to_string())),
                FailureMode::Panic => panic!("bus exploded publishing {}", event.topic()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FailingEventBus, FailureMode, FakeEventBus};

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
