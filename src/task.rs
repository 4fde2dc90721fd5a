use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, warn};
use parking_lot::MutexGuard;

use crate::{App, app::AppState, windowing::ClientId};

const LOCK_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Handed to a background job. Everything that waits here gives up as soon
/// as the job is cancelled.
pub struct TaskContext {
    app: App,
    client: ClientId,
    token: CancelToken,
}

impl TaskContext {
    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Takes the global lock, or `None` once cancelled or the app stopped.
    ///
    /// The owning client joins its tasks while holding the lock, so this
    /// never blocks for long without looking at the cancel flag.
    pub fn lock(&self) -> Option<MutexGuard<'_, AppState>> {
        loop {
            if self.is_cancelled() || !self.app.is_running() {
                return None;
            }
            if let Some(guard) = self.app.try_lock_for(LOCK_SLICE) {
                if self.is_cancelled() {
                    return None;
                }
                return Some(guard);
            }
        }
    }

    /// Sleeps for `length`, waking early on cancellation. Returns whether
    /// the job should keep going.
    pub fn sleep(&self, length: Duration) -> bool {
        let until = Instant::now() + length;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= until {
                return true;
            }
            thread::sleep((until - now).min(LOCK_SLICE));
        }
        false
    }
}

/// A job running on its own thread on behalf of one client.
#[derive(Debug)]
pub struct BackgroundTask {
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    pub(crate) fn spawn(
        app: App,
        client: ClientId,
        job: impl FnOnce(TaskContext) + Send + 'static,
    ) -> io::Result<Self> {
        let token = CancelToken::default();
        let ctx = TaskContext {
            app,
            client,
            token: token.clone(),
        };
        let handle = thread::Builder::new()
            .name(format!("hearth-task-{}", client.raw()))
            .spawn(move || job(ctx))?;
        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels and waits for the thread to exit.
    pub fn join(mut self) {
        self.cancel();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            debug!("task joined from itself, detaching");
            return;
        }
        if handle.join().is_err() {
            warn!("background task panicked");
        }
    }
}
