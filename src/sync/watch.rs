use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use derive_more::Display;
use futures::{SinkExt, Stream, StreamExt};
use futures_channel::mpsc;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use snafu::prelude::*;
use tracing::{debug, error, info, warn};

use crate::mapping::resolve_absolute;
use crate::sync::{SyncPair, Synchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChangeKind {
    #[display("modified")]
    Modified,
    /// Renamed into place or newly created
    #[display("renamed")]
    Renamed,
    /// Deleted, or a kind the platform did not specify
    #[display("other")]
    Other,
}

impl ChangeKind {
    /// `None` for accesses. Reading a source while converting it raises
    /// those, so they never count as changes.
    pub fn classify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Access(_) => None,
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) => {
                Some(ChangeKind::Renamed)
            }
            EventKind::Modify(_) => Some(ChangeKind::Modified),
            EventKind::Any | EventKind::Remove(_) | EventKind::Other => Some(ChangeKind::Other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Recursive change notifications below one root.
///
/// Notifications are produced on the watcher's own thread and handed over
/// through a bounded channel; that thread blocks while the channel is full.
/// The stream ends only if the watcher shuts down.
pub struct Subscription {
    _watcher: RecommendedWatcher,
    events: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(root: &Path, capacity: usize) -> Result<Self, WatchError> {
        let (mut sender, events) = mpsc::channel::<ChangeEvent>(capacity);

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    warn!("Filesystem watcher reported an error: {err}");
                    return;
                }
            };
            let Some(kind) = ChangeKind::classify(&event.kind) else {
                return;
            };
            for path in event.paths {
                let change = ChangeEvent { path, kind };
                if let Err(err) = futures::executor::block_on(sender.send(change)) {
                    debug!("Dropping change notification, receiver is gone: {err}");
                }
            }
        })
        .context(SubscribeSnafu { path: root })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .context(SubscribeSnafu { path: root })?;

        Ok(Self {
            _watcher: watcher,
            events,
        })
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}

impl Synchronizer {
    /// Converts every eligible file touched below `pair.source` until the
    /// subscription ends. At most `max_concurrent` conversions run at once.
    pub async fn watch(
        &self,
        pair: &SyncPair,
        max_concurrent: NonZeroUsize,
    ) -> Result<(), WatchError> {
        let subscription = Subscription::new(&pair.source, max_concurrent.get())?;
        info!(
            "Watching {} for changes, writing to {}",
            pair.source.display(),
            pair.destination.display()
        );

        self.process_events(pair, subscription, max_concurrent).await;

        warn!("Stopped watching {}", pair.source.display());
        Ok(())
    }

    pub async fn process_events(
        &self,
        pair: &SyncPair,
        events: impl Stream<Item = ChangeEvent>,
        max_concurrent: NonZeroUsize,
    ) {
        if pair.source.is_dir() && !pair.destination.is_dir() {
            warn!(
                "Destination {} is not a directory, ignoring changes in {}",
                pair.destination.display(),
                pair.source.display()
            );
            return;
        }

        events
            .for_each_concurrent(Some(max_concurrent.get()), |event| async move {
                self.handle_event(pair, event).await;
            })
            .await;
    }

    async fn handle_event(&self, pair: &SyncPair, event: ChangeEvent) {
        let source_is_dir = pair.source.is_dir();
        let base = if source_is_dir {
            pair.source.as_path()
        } else {
            pair.source.parent().unwrap_or(pair.source.as_path())
        };
        let path = resolve_absolute(&event.path, base);
        debug!("Change ({}) at {}", event.kind, path.display());

        if !self.mapper().is_eligible(&path) {
            return;
        }

        let target = if source_is_dir {
            match self.mapper().mirror(&pair.source, &pair.destination, &path) {
                Some(target) => target,
                None => return,
            }
        } else if path == pair.source {
            self.mapper().single_file_destination(
                &path,
                &pair.destination,
                pair.destination.is_dir(),
            )
        } else {
            return;
        };

        if let Err(err) = self.convert_one(&path, &target).await {
            error!("{}", snafu::Report::from_error(err));
        }
    }
}

#[derive(Debug, Snafu)]
pub enum WatchError {
    #[snafu(display("Failed to watch {}", path.display()))]
    SubscribeError {
        path: PathBuf,
        source: notify::Error,
    },
}
