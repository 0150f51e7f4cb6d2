//! Typed publish/subscribe channel for the active chapter and scene.
//!
//! The bus is injected where it is needed; there is no global instance.
//! Subscribers only see selections published after they subscribed.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use storyreel_models::Selection;

const CAPACITY: usize = 64;

/// Sender side of selection changes. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct SelectionBus {
    tx: broadcast::Sender<Selection>,
}

impl Default for SelectionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Deliver `selection` to every current subscriber; returns how many.
    pub fn publish(&self, selection: Selection) -> usize {
        self.tx.send(selection).unwrap_or(0)
    }

    pub fn subscribe(&self) -> SelectionSubscription {
        SelectionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SelectionSubscription {
    rx: broadcast::Receiver<Selection>,
}

impl SelectionSubscription {
    /// Next selection, or `None` once every bus handle is gone.
    /// Selections missed by a lagging listener are skipped.
    pub async fn recv(&mut self) -> Option<Selection> {
        loop {
            match self.rx.recv().await {
                Ok(selection) => return Some(selection),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "selection listener lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Selection> {
        loop {
            match self.rx.try_recv() {
                Ok(selection) => return Some(selection),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

/// The list-view side of the bus.
///
/// Tracks the active selection as soon as it is published and, once the
/// layout has had `settle` to catch up, asks for the latest one to be
/// scrolled into view. Dropping the follower stops it.
#[derive(Debug)]
pub struct SelectionFollower {
    active: watch::Receiver<Option<Selection>>,
    task: JoinHandle<()>,
}

impl SelectionFollower {
    /// Subscribe to `bus` and start following. Must be called inside a
    /// Tokio runtime.
    pub fn spawn<F>(bus: &SelectionBus, settle: Duration, on_scroll: F) -> Self
    where
        F: Fn(Selection) + Send + 'static,
    {
        let mut subscription = bus.subscribe();
        let (tx, active) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut pending = None;
            let settle_timer = tokio::time::sleep(settle);
            tokio::pin!(settle_timer);
            loop {
                tokio::select! {
                    next = subscription.recv() => match next {
                        Some(selection) => {
                            tx.send_replace(Some(selection));
                            pending = Some(selection);
                            // A newer selection restarts the settle window.
                            settle_timer.as_mut().reset(Instant::now() + settle);
                        }
                        None => break,
                    },
                    () = &mut settle_timer, if pending.is_some() => {
                        if let Some(selection) = pending.take() {
                            on_scroll(selection);
                        }
                    }
                }
            }
        });
        Self { active, task }
    }

    pub fn active(&self) -> Option<Selection> {
        *self.active.borrow()
    }

    /// Observe changes of the active selection.
    pub fn watch(&self) -> watch::Receiver<Option<Selection>> {
        self.active.clone()
    }
}

impl Drop for SelectionFollower {
    fn drop(&mut self) {
        self.task.abort();
    }
}
