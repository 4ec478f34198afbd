use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Owns a running feed loop. Dropping it cancels the pending tick.
pub struct FeedHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    connected: Option<Arc<AtomicBool>>,
}

impl FeedHandle {
    pub(crate) fn spawn<F, Fut>(connected: Option<Arc<AtomicBool>>, run: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run(rx));
        Self {
            shutdown,
            task: Some(task),
            connected,
        }
    }

    /// Handle with no loop behind it
    pub(crate) fn idle() -> Self {
        let (shutdown, _) = watch::channel(true);
        Self {
            shutdown,
            task: None,
            connected: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Signal the loop to stop at its next wait point
    pub fn cancel(&mut self) {
        // no receiver just means the loop already exited
        let _ = self.shutdown.send(true);
        if let Some(connected) = &self.connected {
            connected.store(false, Ordering::SeqCst);
        }
    }

    /// Cancel and wait for the loop to exit
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Feed task ended abnormally: {}", e);
            }
        }
        debug!("Feed handle shut down");
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sleep for `delay`; false when shutdown was signalled first
pub(crate) async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }

    tokio::select! {
        biased;
        _ = shutdown.changed() => false,
        _ = tokio::time::sleep(delay) => !*shutdown.borrow(),
    }
}
