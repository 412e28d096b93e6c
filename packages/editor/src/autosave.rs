//! # Auto-save
//!
//! Background task that saves a shared [`EditSession`] periodically and
//! after a quiet period following the last edit. Saves are best-effort: a
//! failure is logged and the document stays dirty for the next attempt.
//!
//! The session lock is never held while the store is working, so edits keep
//! flowing during a save; the save guard in the session makes an overlapping
//! request a skip.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::persistence::{FunnelStore, StoreError};
use crate::session::EditSession;
use crate::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written under this id
    Saved(u64),

    /// Another save was still in flight
    Skipped,

    /// Nothing to save
    Clean,
}

/// Save a shared session if it is dirty
pub async fn save_now<S: FunnelStore + ?Sized>(
    session: &Mutex<EditSession>,
    store: &S,
) -> Result<SaveOutcome, EditorError> {
    let ticket = {
        let mut guard = session.lock().await;
        if !guard.is_dirty() {
            return Ok(SaveOutcome::Clean);
        }
        match guard.begin_save()? {
            Some(ticket) => ticket,
            None => return Ok(SaveOutcome::Skipped),
        }
    };

    let result = store.save(&ticket.record).await;

    let mut guard = session.lock().await;
    match result {
        Ok(id) => {
            guard.finish_save(&ticket, id);
            Ok(SaveOutcome::Saved(id))
        }
        Err(e) => {
            guard.fail_save(&e);
            Err(e.into())
        }
    }
}

/// Handle to a running auto-save task
pub struct AutoSaver {
    edits: Arc<Notify>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<SaveOutcome, EditorError>>,
}

impl AutoSaver {
    /// Start auto-saving with the intervals from `config`
    pub fn spawn<S>(session: Arc<Mutex<EditSession>>, store: Arc<S>, config: &EditorConfig) -> Self
    where
        S: FunnelStore + 'static,
    {
        Self::spawn_with(session, store, config.autosave_interval(), config.idle_debounce())
    }

    pub fn spawn_with<S>(
        session: Arc<Mutex<EditSession>>,
        store: Arc<S>,
        interval: Duration,
        idle: Duration,
    ) -> Self
    where
        S: FunnelStore + 'static,
    {
        let edits = Arc::new(Notify::new());
        let (shutdown, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(run(session, store, Arc::clone(&edits), shutdown_rx, interval, idle));
        info!(interval_secs = interval.as_secs(), idle_ms = idle.as_millis() as u64, "Auto-save started");

        Self {
            edits,
            shutdown,
            handle,
        }
    }

    /// Report an edit; restarts the idle debounce
    pub fn touch(&self) {
        self.edits.notify_one();
    }

    /// Stop the task, saving one last time if the document is dirty
    pub async fn shutdown(self) -> Result<SaveOutcome, EditorError> {
        // The task may already have stopped; the join below still reports it
        let _ = self.shutdown.send(());

        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Auto-save task ended abnormally");
                Err(StoreError::Unavailable(format!("auto-save task stopped: {}", e)).into())
            }
        }
    }
}

async fn run<S>(
    session: Arc<Mutex<EditSession>>,
    store: Arc<S>,
    edits: Arc<Notify>,
    mut shutdown: oneshot::Receiver<()>,
    interval: Duration,
    idle: Duration,
) -> Result<SaveOutcome, EditorError>
where
    S: FunnelStore + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut idle_deadline: Option<Instant> = None;

    loop {
        let deadline = idle_deadline;
        let quiet = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = &mut shutdown => break,
            _ = edits.notified() => {
                idle_deadline = Some(Instant::now() + idle);
                continue;
            }
            _ = ticker.tick() => debug!("Periodic auto-save"),
            _ = quiet => {
                idle_deadline = None;
                debug!("Idle auto-save");
            }
        }

        // Failures are already logged by the session and retried next round
        if let Ok(SaveOutcome::Saved(id)) = save_now(&session, store.as_ref()).await {
            debug!(funnel_id = id, "Auto-saved");
        }
    }

    let outcome = save_now(&session, store.as_ref()).await;
    info!(?outcome, "Auto-save stopped");
    outcome
}
