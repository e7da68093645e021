//! Live-agent polling supervisor
//!
//! Owns at most one background task, keyed by the user whose history is
//! polled. The core re-syncs the key after every state change; a changed or
//! absent key tears the running task down.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct ActivePoll {
    user_id: i64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct PollingSupervisor {
    active: Option<ActivePoll>,
}

impl PollingSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the running task match `key`.
    ///
    /// `spawn` builds the task for a user id; it is only called when a new
    /// task is needed. Without a tokio runtime nothing is started and the
    /// next sync tries again.
    pub fn sync<F, Fut>(&mut self, key: Option<i64>, spawn: F)
    where
        F: FnOnce(i64, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let (Some(user_id), Some(active)) = (key, &self.active) {
            if active.user_id == user_id && !active.handle.is_finished() {
                return;
            }
        }

        self.stop();

        let Some(user_id) = key else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            debug!(user_id, "no runtime available, live agent polling deferred");
            return;
        };

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(spawn(user_id, cancel.clone()));
        info!(user_id, "live agent polling started");
        self.active = Some(ActivePoll {
            user_id,
            cancel,
            handle,
        });
    }

    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            info!(user_id = active.user_id, "live agent polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }
}

impl Drop for PollingSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}
