//! Trailing-edge debouncing on the tokio runtime.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;

/// Runs only the most recently scheduled action, once the delay has passed
/// without another `schedule` or `cancel`.
pub struct Debouncer {
    delay: Mutex<Duration>,
    pending: Mutex<Option<watch::Sender<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: Mutex::new(delay),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Schedule `action`, superseding anything still pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay();
        let (cancel_tx, mut cancel_rx) = watch::channel(());
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(old_tx) = pending.replace(cancel_tx) {
                let _ = old_tx.send(());
            }
        }

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => action.await,
                _ = cancel_rx.changed() => {
                    // Superseded
                }
            }
        });
    }

    /// Drop the pending action, if any
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = pending.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&log);
        let make = move |n: u32| {
            let l = Arc::clone(&l);
            Box::pin(async move {
                l.lock().unwrap().push(n);
            }) as std::pin::Pin<Box<dyn Future<Output = ()> + Send>>
        };
        (log, make)
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_action_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (log, make) = recorder();

        debouncer.schedule(make(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(make(2));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(make(3));
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*log.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_action() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (log, make) = recorder();

        debouncer.schedule(make(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_actions_all_run() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let (log, make) = recorder();

        debouncer.schedule(make(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(make(2));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }
}
