//! Directory watcher: turns result files dropped into a run directory into
//! [`FeedbackEvent`]s.
//!
//! The OS watch is registered before [`FeedbackWatcher::spawn`] returns, so
//! every file the tool writes after that point is seen. The notify backend
//! thread only forwards raw notifications; reading, decoding and deleting
//! happen on a tokio task that exits when the run's token is cancelled.

use std::collections::HashSet;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::decode::decode;
use crate::types::FeedbackEvent;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to create feedback directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Handle to a running watch task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct FeedbackWatcher {
    directory: PathBuf,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedbackWatcher {
    /// Watch `directory` recursively (creating it if needed) and forward
    /// decoded results to `sender`, tagged with `generation`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        directory: &Path,
        generation: u64,
        delete_processed: bool,
        token: CancellationToken,
        sender: mpsc::Sender<FeedbackEvent>,
    ) -> Result<Self, WatchError> {
        std::fs::create_dir_all(directory).map_err(|source| WatchError::CreateDir {
            path: directory.to_path_buf(),
            source,
        })?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let watch_err = |source| WatchError::Watch {
            path: directory.to_path_buf(),
            source,
        };
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the task has stopped; nothing left to tell.
            let _ = raw_tx.send(res);
        })
        .map_err(watch_err)?;
        watcher
            .watch(directory, RecursiveMode::Recursive)
            .map_err(watch_err)?;

        let pump = Pump {
            generation,
            delete_processed,
            sender,
            handled: HashSet::new(),
        };
        let task = tokio::spawn(pump.run(watcher, raw_rx, token.clone()));
        tracing::debug!(
            path = %directory.display(),
            generation,
            "Watching feedback directory"
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            token,
            task: Some(task),
        })
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the task and wait for it to exit.
    pub async fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "Feedback watcher task failed");
        }
    }
}

impl Drop for FeedbackWatcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

fn wants(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any
            | EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Any | ModifyKind::Data(_) | ModifyKind::Name(_))
    )
}

struct Pump {
    generation: u64,
    delete_processed: bool,
    sender: mpsc::Sender<FeedbackEvent>,
    /// Files already forwarded that are still on disk (kept by policy, or
    /// undeletable). Later notifications for them are ignored.
    handled: HashSet<PathBuf>,
}

impl Pump {
    async fn run(
        mut self,
        watcher: RecommendedWatcher,
        mut raw: mpsc::UnboundedReceiver<notify::Result<Event>>,
        token: CancellationToken,
    ) {
        loop {
            let notification = tokio::select! {
                biased;
                () = token.cancelled() => break,
                notification = raw.recv() => match notification {
                    Some(n) => n,
                    None => break,
                },
            };
            match notification {
                Ok(event) if wants(event.kind) => {
                    if self.handle(event, &token).await.is_break() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Feedback watch error"),
            }
        }
        drop(watcher);
        tracing::debug!(generation = self.generation, "Feedback watcher stopped");
    }

    async fn handle(&mut self, event: Event, token: &CancellationToken) -> ControlFlow<()> {
        for path in event.paths {
            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    if e.kind() != io::ErrorKind::NotFound {
                        tracing::debug!(path = %path.display(), error = %e, "Cannot stat result path");
                    }
                    continue;
                }
            };
            if meta.is_dir() {
                // Files can land in a new subdirectory before its watch exists.
                self.scan(&path, token).await?;
            } else if meta.is_file() {
                self.process(&path, token).await?;
            }
        }
        ControlFlow::Continue(())
    }

    async fn scan(&mut self, dir: &Path, token: &CancellationToken) -> ControlFlow<()> {
        let mut pending = vec![dir.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                match entry.file_type().await {
                    Ok(kind) if kind.is_dir() => pending.push(path),
                    Ok(kind) if kind.is_file() => self.process(&path, token).await?,
                    _ => {}
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn process(&mut self, path: &Path, token: &CancellationToken) -> ControlFlow<()> {
        if self.handled.contains(path) {
            return ControlFlow::Continue(());
        }
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "Cannot read result file");
                }
                return ControlFlow::Continue(());
            }
        };
        let event = match decode(&bytes) {
            Ok(event) => event,
            Err(e) => {
                // Possibly a partial write; the completing write notifies again.
                tracing::debug!(path = %path.display(), error = %e, "Undecodable result file");
                return ControlFlow::Continue(());
            }
        };

        let feedback = FeedbackEvent {
            generation: self.generation,
            source: path.to_path_buf(),
            event,
        };
        let sent = tokio::select! {
            biased;
            () = token.cancelled() => false,
            res = self.sender.send(feedback) => res.is_ok(),
        };
        if !sent {
            return ControlFlow::Break(());
        }

        if !self.delete_processed {
            self.handled.insert(path.to_path_buf());
            return ControlFlow::Continue(());
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete result file");
                self.handled.insert(path.to_path_buf());
            }
        }
        ControlFlow::Continue(())
    }
}
