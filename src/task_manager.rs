//! Tracks the background tasks spawned by the engine.
use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type Handles = Vec<(&'static str, JoinHandle<()>)>;

/// A centralized manager for outbound sends and the update advisory.
///
/// Every task is raced against the shutdown signal: once shutdown is
/// signalled, unfinished tasks are abandoned rather than awaited to
/// completion.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Handles>>,
    shutdown_rx: watch::Receiver<bool>,
    _shutdown_tx: Option<Arc<watch::Sender<bool>>>,
}

impl TaskManager {
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
            _shutdown_tx: None,
        }
    }

    /// A manager whose shutdown signal never fires.
    pub fn detached() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            _shutdown_tx: Some(Arc::new(tx)),
            ..Self::new(rx)
        }
    }

    /// Spawns a new task and adds its handle to the manager.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let mut shutdown_rx = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            if *shutdown_rx.borrow() {
                debug!(task_name = name, "Shutdown already signalled, task abandoned.");
                return;
            }
            tokio::select! {
                biased;
                Ok(()) = shutdown_rx.changed() => {
                    debug!(task_name = name, "Task abandoned on shutdown.");
                }
                _ = future => {}
            }
        });
        let mut handles = self.lock();
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((name, handle));
    }

    /// Number of tracked tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|(_, h)| !h.is_finished()).count()
    }

    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Waits for every task spawned so far to complete.
    pub async fn drain(&self) {
        let handles = self.lock().drain(..).collect::<Vec<_>>();
        Self::await_all(handles).await;
    }

    /// Waits for all managed tasks to complete after shutdown was signalled.
    pub async fn shutdown(self) {
        let handles = self.lock().drain(..).collect::<Vec<_>>();
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );
        Self::await_all(handles).await;
        info!("All tasks shut down.");
    }

    async fn await_all(handles: Handles) {
        let task_names: Vec<&'static str> = handles.iter().map(|(name, _)| *name).collect();
        let results = join_all(handles.into_iter().map(|(_, handle)| handle)).await;

        for (task_name, result) in task_names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task finished."),
                Err(e) if e.is_cancelled() => debug!(task_name, "Task was cancelled."),
                Err(e) => error!(task_name, error = %e, "Task panicked."),
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Handles> {
        // A poisoned lock only means a spawn call panicked; the list is intact.
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_waits_for_spawned_tasks() {
        let manager = TaskManager::detached();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            manager.spawn("increment", async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        manager.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(manager.pending(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_unfinished_tasks() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let manager = TaskManager::new(shutdown_rx);
        let finished = Arc::new(AtomicUsize::new(0));

        let flag = finished.clone();
        manager.spawn("slow", async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), manager.shutdown())
            .await
            .expect("shutdown should not wait for abandoned tasks");
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
