//! Debounce coordinator
//!
//! Consumes the notifier's events and errors together with the shutdown
//! signal, one at a time, and turns accepted writes into serialized
//! full-file transfers. A transfer runs to completion before the next
//! notification is read.

use owo_colors::OwoColorize;
use remote::{ConnectionProvider, TransferError, TransferExecutor};
use replicator_core::{ChangeEvent, OpKind, ReplicationTarget, ShutdownSignal};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, trace};
use watcher::notifier::report_error;
use watcher::{Debouncer, Decision, Notification, Subscription};

/// Conditions that end the coordinator with an error
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(
        "source file appears to have been deleted or is no longer accessible: {} ({kind})",
        .path.display()
    )]
    SourceGone { path: PathBuf, kind: OpKind },

    #[error("update {sequence} failed")]
    Transfer {
        sequence: u64,
        #[source]
        source: TransferError,
    },

    #[error("file watcher stopped delivering events for {}", .path.display())]
    NotifierClosed { path: PathBuf },
}

/// Totals reported when the coordinator stops cleanly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub transfers: u64,
    pub bytes: u64,
}

/// Per-transfer progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Started { sequence: u64 },
    Completed { sequence: u64, bytes: u64 },
    Failed { sequence: u64 },
}

type ProgressFn = Box<dyn FnMut(Progress) + Send>;

/// Operator-facing progress output
pub fn print_progress(progress: Progress) {
    match progress {
        Progress::Started { sequence } => {
            print!("Update {}...", sequence);
            let _ = std::io::stdout().flush();
        }
        Progress::Completed { bytes, .. } => {
            println!("{} {} bytes copied", "complete.".green(), bytes);
        }
        Progress::Failed { .. } => println!("{}", "failed".red()),
    }
}

pub struct Coordinator<C> {
    subscription: Subscription,
    executor: TransferExecutor<C>,
    debouncer: Debouncer,
    shutdown: ShutdownSignal,
    progress: ProgressFn,
    bytes: u64,
}

impl<C: ConnectionProvider> Coordinator<C> {
    /// Build a coordinator; the first debounce window starts now
    pub fn new(
        target: &ReplicationTarget,
        subscription: Subscription,
        connection: Arc<C>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            subscription,
            executor: TransferExecutor::new(connection, target),
            debouncer: Debouncer::new(target.min_interval(), Instant::now()),
            shutdown,
            progress: Box::new(print_progress),
            bytes: 0,
        }
    }

    /// Replace the default stdout progress output
    pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 'static) -> Self {
        self.progress = Box::new(f);
        self
    }

    /// Run until shutdown is requested or a fatal condition occurs
    ///
    /// Consumes the coordinator, so the subscription is released on every
    /// return path.
    pub async fn run(mut self) -> Result<RunSummary, CoordinatorError> {
        info!(
            "Replicating {} to {} (min interval {:?})",
            self.executor.source().display(),
            self.executor.destination(),
            self.debouncer.min_interval()
        );

        loop {
            tokio::select! {
                _ = self.shutdown.wait() => {
                    info!("Shutdown requested, stopping after {} updates", self.debouncer.accepted());
                    return Ok(self.summary());
                }
                next = self.subscription.next() => match next {
                    Some(Notification::Event(event)) => self.handle_event(event).await?,
                    Some(Notification::Error(err)) => report_error(self.subscription.path(), &err),
                    None => {
                        return Err(CoordinatorError::NotifierClosed {
                            path: self.subscription.path().to_path_buf(),
                        })
                    }
                },
            }
        }
    }

    async fn handle_event(&mut self, event: ChangeEvent) -> Result<(), CoordinatorError> {
        match self.debouncer.evaluate(&event) {
            Decision::SourceGone => Err(CoordinatorError::SourceGone {
                path: event.path,
                kind: event.kind,
            }),
            Decision::Suppress => {
                trace!("Debounced {} on {}", event.kind, event.path.display());
                Ok(())
            }
            Decision::Transfer(sequence) => {
                (self.progress)(Progress::Started { sequence });

                let bytes = match self.executor.transfer().await {
                    Ok(bytes) => bytes,
                    Err(source) => {
                        (self.progress)(Progress::Failed { sequence });
                        return Err(CoordinatorError::Transfer { sequence, source });
                    }
                };

                self.debouncer.record_transfer(Instant::now());
                self.bytes += bytes;
                (self.progress)(Progress::Completed { sequence, bytes });
                Ok(())
            }
        }
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            transfers: self.debouncer.accepted(),
            bytes: self.bytes,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use remote::RemoteError;
    use replicator_core::{shutdown_channel, ConfigFile, ShutdownTrigger};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use watcher::SubscriptionFeed;

    /// Provider writing to local paths
    pub(crate) struct LocalDir;

    #[async_trait]
    impl ConnectionProvider for LocalDir {
        type Writer = tokio::fs::File;

        async fn create_or_truncate(&self, remote_path: &str) -> Result<Self::Writer, RemoteError> {
            tokio::fs::File::create(remote_path)
                .await
                .map_err(|e| RemoteError::Create {
                    path: remote_path.to_string(),
                    source: Box::new(e),
                })
        }

        async fn close(&self) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    pub(crate) struct Setup {
        pub temp_dir: TempDir,
        pub target: ReplicationTarget,
    }

    impl Setup {
        pub fn new(min_interval_ms: u64) -> Self {
            let temp_dir = TempDir::new().unwrap();
            fs::create_dir(temp_dir.path().join("remote")).unwrap();
            fs::write(temp_dir.path().join("data.txt"), b"hello replica").unwrap();

            let file = ConfigFile {
                local_user: temp_dir.path().display().to_string(),
                min_update_period_ms: min_interval_ms,
                source_dir: temp_dir.path().display().to_string(),
                source_name: "data.txt".into(),
                target_dir: temp_dir.path().join("remote").display().to_string(),
                ..Default::default()
            };
            let target = ReplicationTarget::from_file(file).unwrap();
            Self { temp_dir, target }
        }

        pub fn source(&self) -> PathBuf {
            self.target.source_path()
        }

        pub fn replica(&self) -> PathBuf {
            PathBuf::from(self.target.destination_path())
        }
    }

    struct Harness {
        feed: SubscriptionFeed,
        trigger: ShutdownTrigger,
        progress: mpsc::UnboundedReceiver<Progress>,
        handle: JoinHandle<Result<RunSummary, CoordinatorError>>,
    }

    fn start(setup: &Setup) -> Harness {
        let (feed, subscription) = Subscription::detached(&setup.source());
        let (trigger, signal) = shutdown_channel();
        let (progress_tx, progress) = mpsc::unbounded_channel();

        let coordinator = Coordinator::new(&setup.target, subscription, Arc::new(LocalDir), signal)
            .on_progress(move |p| {
                let _ = progress_tx.send(p);
            });

        Harness {
            feed,
            trigger,
            progress,
            handle: tokio::spawn(coordinator.run()),
        }
    }

    impl Harness {
        fn send(&self, path: &Path, kind: OpKind, at: Instant) {
            self.feed.events.send(ChangeEvent::at(path, kind, at)).unwrap();
        }

        async fn completed(&mut self) -> (u64, u64) {
            loop {
                match self.progress.recv().await.unwrap() {
                    Progress::Completed { sequence, bytes } => return (sequence, bytes),
                    Progress::Started { .. } => continue,
                    Progress::Failed { sequence } => panic!("update {sequence} failed"),
                }
            }
        }

        async fn stop(self) -> (Result<RunSummary, CoordinatorError>, Vec<Progress>) {
            self.trigger.fire();
            finish(self.handle, self.progress).await
        }
    }

    async fn finish(
        handle: JoinHandle<Result<RunSummary, CoordinatorError>>,
        mut progress: mpsc::UnboundedReceiver<Progress>,
    ) -> (Result<RunSummary, CoordinatorError>, Vec<Progress>) {
        let result = handle.await.unwrap();
        let mut rest = Vec::new();
        while let Ok(p) = progress.try_recv() {
            rest.push(p);
        }
        (result, rest)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scenario_transfers_twice() {
        let setup = Setup::new(10);
        let mut h = start(&setup);
        let source = setup.source();

        // t=0 lies well beyond the startup window
        tokio::time::advance(ms(100)).await;
        let t0 = Instant::now();
        h.send(&source, OpKind::Write, t0);
        assert_eq!(h.completed().await, (1, 13));

        h.send(&source, OpKind::Write, t0 + ms(5));
        tokio::time::advance(ms(20)).await;
        h.send(&source, OpKind::Write, t0 + ms(20));
        assert_eq!(h.completed().await, (2, 13));

        let (result, rest) = h.stop().await;
        assert_eq!(result.unwrap(), RunSummary { transfers: 2, bytes: 26 });
        assert!(rest.is_empty());
        assert_eq!(fs::read(setup.replica()).unwrap(), b"hello replica");
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_inside_startup_window_is_filtered() {
        let setup = Setup::new(10);
        let h = start(&setup);

        h.send(&setup.source(), OpKind::Write, Instant::now() + ms(3));

        let (result, progress) = h.stop().await;
        assert_eq!(result.unwrap().transfers, 0);
        assert!(progress.is_empty());
        assert!(!setup.replica().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_produces_single_transfer() {
        let setup = Setup::new(50);
        let mut h = start(&setup);
        let source = setup.source();

        tokio::time::advance(ms(200)).await;
        let t0 = Instant::now();
        for offset in [0, 1, 4, 9, 20, 35, 50] {
            h.send(&source, OpKind::Write, t0 + ms(offset));
        }
        assert_eq!(h.completed().await.0, 1);

        let (result, progress) = h.stop().await;
        assert_eq!(result.unwrap().transfers, 1);
        assert!(progress.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_source_is_fatal_without_transfer() {
        let setup = Setup::new(10);
        let h = start(&setup);
        tokio::time::advance(ms(100)).await;

        fs::remove_file(setup.source()).unwrap();
        h.send(&setup.source(), OpKind::Remove, Instant::now());
        // Never reached: the loop has already ended
        h.send(&setup.source(), OpKind::Write, Instant::now());

        let (result, progress) = finish(h.handle, h.progress).await;
        match result.unwrap_err() {
            CoordinatorError::SourceGone { path, kind } => {
                assert_eq!(path, setup.source());
                assert_eq!(kind, OpKind::Remove);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(progress.is_empty());
        assert!(h.feed.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_failure_is_fatal() {
        let setup = Setup::new(10);
        let h = start(&setup);
        tokio::time::advance(ms(100)).await;

        // Write notification raced with a delete
        fs::remove_file(setup.source()).unwrap();
        h.send(&setup.source(), OpKind::Write, Instant::now());

        let (result, progress) = finish(h.handle, h.progress).await;
        assert!(matches!(
            result.unwrap_err(),
            CoordinatorError::Transfer {
                sequence: 1,
                source: TransferError::OpenSource { .. }
            }
        ));
        assert_eq!(
            progress,
            vec![Progress::Started { sequence: 1 }, Progress::Failed { sequence: 1 }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifier_errors_are_not_fatal() {
        let setup = Setup::new(10);
        let mut h = start(&setup);
        tokio::time::advance(ms(100)).await;

        h.feed
            .errors
            .send(notify::Error::generic("inotify queue overflow"))
            .unwrap();
        h.send(&setup.source(), OpKind::Write, Instant::now());
        assert_eq!(h.completed().await.0, 1);

        let (result, _) = h.stop().await;
        assert_eq!(result.unwrap().transfers, 1);
    }

    #[tokio::test]
    async fn test_shutdown_while_idle_releases_subscription() {
        let setup = Setup::new(10);
        let h = start(&setup);
        let feed = h.feed.clone();

        let (result, _) = tokio::time::timeout(Duration::from_secs(1), h.stop())
            .await
            .unwrap();

        assert_eq!(result.unwrap(), RunSummary::default());
        assert!(feed.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_trigger_does_not_stop_coordinator() {
        let setup = Setup::new(10);
        let Harness {
            feed,
            trigger,
            mut progress,
            handle,
        } = start(&setup);

        drop(trigger);
        tokio::time::advance(ms(100)).await;
        assert!(!handle.is_finished());

        feed.events
            .send(ChangeEvent::at(setup.source(), OpKind::Write, Instant::now()))
            .unwrap();
        assert_eq!(progress.recv().await, Some(Progress::Started { sequence: 1 }));
        assert!(matches!(
            progress.recv().await,
            Some(Progress::Completed { sequence: 1, .. })
        ));

        drop(feed);
        assert!(matches!(
            handle.await.unwrap(),
            Err(CoordinatorError::NotifierClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_notifier_is_fatal() {
        let setup = Setup::new(10);
        let h = start(&setup);

        drop(h.feed);
        let result = h.handle.await.unwrap();
        assert!(matches!(
            result,
            Err(CoordinatorError::NotifierClosed { .. })
        ));
    }
}
