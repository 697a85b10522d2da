//! Shutdown coordination for background consumers.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Broadcast stop signal plus the tasks that must finish before exit.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            tasks: Vec::new(),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Register a task to be awaited by [`Shutdown::drain`].
    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Number of receivers still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Signal every subscriber and wait for tracked tasks; tasks still running
    /// after `deadline` are aborted.
    pub async fn drain(self, deadline: Duration) {
        let _ = self.tx.send(());
        for task in self.tasks {
            let abort = task.abort_handle();
            if tokio::time::timeout(deadline, task).await.is_err() {
                tracing::warn!("Background task did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_stops_listeners() {
        let mut shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.track(tokio::spawn(async move {
            let _ = rx.recv().await;
        }));
        assert_eq!(shutdown.receiver_count(), 1);

        tokio::time::timeout(Duration::from_secs(1), shutdown.drain(Duration::from_millis(200)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_aborts_stuck_task() {
        let mut shutdown = Shutdown::new();
        shutdown.track(tokio::spawn(std::future::pending::<()>()));
        tokio::time::timeout(Duration::from_secs(1), shutdown.drain(Duration::from_millis(20)))
            .await
            .unwrap();
    }
}
