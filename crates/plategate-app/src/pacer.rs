//! Interruptible waits for the controller loop

use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Blocks the controller for a while unless shutdown is requested.
pub trait Pacer {
    /// Wait up to `duration`. Returns `false` if the token was cancelled
    /// before the full duration elapsed.
    fn wait(&mut self, duration: Duration, token: &CancellationToken) -> bool;
}

/// Real-time pacer; sleeps in short slices and checks the token between them
#[derive(Debug, Clone)]
pub struct ThreadPacer {
    slice: Duration,
}

impl ThreadPacer {
    pub fn new(slice: Duration) -> Self {
        Self {
            slice: slice.max(Duration::from_millis(1)),
        }
    }
}

impl Default for ThreadPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

impl Pacer for ThreadPacer {
    fn wait(&mut self, duration: Duration, token: &CancellationToken) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if token.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(self.slice.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_full_duration() {
        let mut pacer = ThreadPacer::new(Duration::from_millis(5));
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(pacer.wait(Duration::from_millis(30), &token));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_returns_early_on_cancel() {
        let mut pacer = ThreadPacer::new(Duration::from_millis(5));
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let start = Instant::now();
        assert!(!pacer.wait(Duration::from_secs(10), &token));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_already_cancelled() {
        let mut pacer = ThreadPacer::default();
        let token = CancellationToken::new();
        token.cancel();
        assert!(!pacer.wait(Duration::from_secs(1), &token));
    }
}
