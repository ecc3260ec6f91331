use std::time::Duration;

use tokio::task::JoinHandle;

/// Fires an action once input has been quiet for `delay`.
///
/// Every `reset` replaces the pending timer, so a burst of resets produces a
/// single firing `delay` after the last one. Must be used inside a tokio
/// runtime.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn reset<F>(&mut self, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::time::{sleep, Instant};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let make = move || {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_resets_fires_once_after_last() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        for _ in 0..5 {
            debouncer.reset(make());
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // 100ms already elapsed since the last reset
        sleep(Duration::from_millis(399)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_delay_after_reset() {
        let count = Arc::new(AtomicUsize::new(0));
        let fired_at = Arc::new(std::sync::Mutex::new(None));
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let start = Instant::now();

        let c = count.clone();
        let at = fired_at.clone();
        debouncer.reset(move || {
            c.fetch_add(1, Ordering::SeqCst);
            *at.lock().unwrap() = Some(Instant::now());
        });
        sleep(Duration::from_secs(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        let fired = fired_at.lock().unwrap().unwrap();
        assert_eq!(fired - start, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.reset(make());
        sleep(Duration::from_millis(200)).await;
        debouncer.cancel();
        sleep(Duration::from_secs(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }
}
