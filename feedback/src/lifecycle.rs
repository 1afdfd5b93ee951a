//! Run lifecycle: the facade front ends drive.
//!
//! Idle and watching are represented by whether an active run exists.
//! Starting a run retires the previous one first, so at most one watcher is
//! ever live and every event it produces carries that run's generation.

use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use verity_types::MessageSeverity;

use crate::document::DocumentId;
use crate::host::AnnotationHost;
use crate::store::AnnotationStore;
use crate::types::{FeedbackEvent, FeedbackOptions, RunOutcome};
use crate::watcher::{FeedbackWatcher, WatchError};

/// Channel capacity between the watch task and the lifecycle owner.
const EVENT_CHANNEL_CAPACITY: usize = 256;

struct ActiveRun {
    generation: u64,
    token: CancellationToken,
    directory: PathBuf,
    events: mpsc::Receiver<FeedbackEvent>,
    watcher: FeedbackWatcher,
}

/// Owns the host, the annotation store and the active run, if any.
///
/// All rendering happens through `&mut self`, so the store needs no locks.
pub struct RunLifecycle<H: AnnotationHost> {
    host: H,
    store: AnnotationStore,
    options: FeedbackOptions,
    run: Option<ActiveRun>,
    generation: u64,
}

impl<H: AnnotationHost> RunLifecycle<H> {
    #[must_use]
    pub fn new(host: H, options: FeedbackOptions) -> Self {
        let store = AnnotationStore::new(options.styles.clone(), options.matcher);
        Self {
            host,
            store,
            options,
            run: None,
            generation: 0,
        }
    }

    /// Begin a run: clear previous annotations, create a fresh run directory
    /// and watch it. Returns the directory to hand to the analysis tool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<PathBuf, WatchError> {
        self.retire();
        self.store.clear_all(&mut self.host);

        self.generation += 1;
        let generation = self.generation;
        let directory = self.options.root.join(format!("run-{}", Uuid::new_v4()));
        let token = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let watcher = match FeedbackWatcher::spawn(
            &directory,
            generation,
            self.options.delete_processed,
            token.clone(),
            event_tx,
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                remove_run_dir(&directory);
                return Err(e);
            }
        };

        tracing::info!(path = %directory.display(), generation, "Feedback run started");
        self.run = Some(ActiveRun {
            generation,
            token,
            directory: directory.clone(),
            events: event_rx,
            watcher,
        });
        Ok(directory)
    }

    /// End the active run. No-op when idle.
    ///
    /// Annotations stay on screen until the next `start` or `clear`. With an
    /// `outcome` and a configured summary, the pass/fail message is shown.
    pub fn end(&mut self, outcome: Option<RunOutcome>) {
        let Some(generation) = self.retire() else {
            return;
        };
        tracing::info!(generation, ?outcome, "Feedback run ended");

        if let (Some(outcome), Some(summary)) = (outcome, &self.options.summary) {
            if outcome.success() {
                self.host.show_message(MessageSeverity::Info, &summary.success);
            } else {
                self.host.show_message(MessageSeverity::Error, &summary.failure);
            }
        }
    }

    /// Cancel and forget the active run. Returns its generation.
    fn retire(&mut self) -> Option<u64> {
        let run = self.run.take()?;
        run.token.cancel();
        let ActiveRun {
            generation,
            directory,
            events,
            watcher,
            ..
        } = run;
        drop(events);
        drop(watcher);
        remove_run_dir(&directory);
        Some(generation)
    }

    /// Drain pending events without blocking, up to `budget`.
    pub fn poll_events(&mut self, budget: usize) -> usize {
        let mut count = 0;
        while count < budget {
            let event = match self.run.as_mut().map(|run| run.events.try_recv()) {
                Some(Ok(event)) => event,
                Some(Err(
                    mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected,
                ))
                | None => break,
            };
            self.handle_event(event);
            count += 1;
        }
        count
    }

    /// Wait for the next event and apply it.
    ///
    /// Returns `false` when idle or once the watcher has stopped. Cancel-safe.
    pub async fn next_event(&mut self) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        let event = run.events.recv().await;
        match event {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    fn handle_event(&mut self, event: FeedbackEvent) {
        let current = self.run.as_ref().map(|run| run.generation);
        if current != Some(event.generation) {
            tracing::debug!(
                generation = event.generation,
                path = %event.source.display(),
                "Discarding result from a retired run"
            );
            return;
        }
        match self.store.apply(&mut self.host, &event.event) {
            Ok(count) => {
                tracing::debug!(path = %event.source.display(), count, "Applied result");
            }
            Err(e) => {
                tracing::debug!(path = %event.source.display(), error = %e, "Rejected result");
            }
        }
    }

    /// Remove every annotation without touching the run.
    pub fn clear(&mut self) {
        self.store.clear_all(&mut self.host);
    }

    /// Redraw a document that just became visible.
    pub fn refresh(&mut self, document: &DocumentId) {
        self.store.redraw(&mut self.host, document);
    }

    #[must_use]
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn options(&self) -> &FeedbackOptions {
        &self.options
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.run.is_some()
    }

    /// Directory of the active run.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.run.as_ref().map(|run| run.directory.as_path())
    }

    /// Generation of the most recently started run; 0 before the first.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<H: AnnotationHost> Drop for RunLifecycle<H> {
    fn drop(&mut self) {
        self.retire();
    }
}

fn remove_run_dir(directory: &Path) {
    match std::fs::remove_dir_all(directory) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %directory.display(), error = %e, "Failed to remove run directory");
        }
    }
}
