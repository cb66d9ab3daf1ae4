//! Change notifier for a single watched file
//!
//! `subscribe` registers a non-recursive watch and returns a `Subscription`
//! carrying two streams: classified change events and backend errors. The
//! watch is released exactly once, when the subscription is dropped or
//! explicitly unsubscribed.

use crate::classify::classify;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use replicator_core::ChangeEvent;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors setting up a watch
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file watcher")]
    Create(#[source] notify::Error),

    #[error("failed to watch {}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// One item read from a subscription
#[derive(Debug)]
pub enum Notification {
    /// Classified change on the watched path
    Event(ChangeEvent),
    /// Backend error; the watch itself is still active
    Error(notify::Error),
}

/// Watch `path` for changes
pub fn subscribe(path: &Path) -> Result<Subscription, WatchError> {
    let (feed, mut subscription) = Subscription::detached(path);

    let mut watcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| feed.dispatch(res))
            .map_err(WatchError::Create)?;

    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Watch {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Watching {}", path.display());
    subscription.watcher = Some(watcher);
    Ok(subscription)
}

/// Active registration on the watched path
pub struct Subscription {
    path: PathBuf,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    errors: mpsc::UnboundedReceiver<notify::Error>,
    watcher: Option<RecommendedWatcher>,
}

/// Sending half of a subscription not backed by a filesystem watch
#[derive(Debug, Clone)]
pub struct SubscriptionFeed {
    pub events: mpsc::UnboundedSender<ChangeEvent>,
    pub errors: mpsc::UnboundedSender<notify::Error>,
}

impl SubscriptionFeed {
    /// True once the subscription has been dropped
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Route one backend callback onto the event or error stream
    ///
    /// A rescan request (kernel queue overflow) carries no paths and means
    /// changes were lost, so it is reported as an error.
    pub fn dispatch(&self, res: notify::Result<notify::Event>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                let _ = self.errors.send(e);
                return;
            }
        };

        if event.need_rescan() {
            let _ = self
                .errors
                .send(notify::Error::generic("event queue overflow, changes may have been missed"));
            return;
        }

        let observed_at = Instant::now();
        let Some(kind) = classify(&event.kind) else {
            return;
        };
        for path in event.paths {
            let _ = self.events.send(ChangeEvent::at(path, kind, observed_at));
        }
    }
}

impl Subscription {
    /// Subscription fed by hand instead of by a watcher
    pub fn detached(path: &Path) -> (SubscriptionFeed, Subscription) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let feed = SubscriptionFeed {
            events: event_tx,
            errors: error_tx,
        };
        let subscription = Subscription {
            path: path.to_path_buf(),
            events: event_rx,
            errors: error_rx,
            watcher: None,
        };
        (feed, subscription)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next event or backend error
    ///
    /// Returns `None` once the event stream has closed. Cancel safe.
    pub async fn next(&mut self) -> Option<Notification> {
        tokio::select! {
            event = self.events.recv() => event.map(Notification::Event),
            Some(err) = self.errors.recv() => Some(Notification::Error(err)),
        }
    }

    /// Release the watch now instead of on drop
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.path) {
                // The path may already be gone, which removes the watch anyway
                debug!("unwatch {} failed: {}", self.path.display(), e);
            }
            info!("Released watch on {}", self.path.display());
        }
        self.events.close();
        self.errors.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("watching", &self.watcher.is_some())
            .finish()
    }
}

/// Log a non-fatal backend error
pub fn report_error(path: &Path, err: &notify::Error) {
    warn!("Event watcher failed on {}: {}", path.display(), err);
}
