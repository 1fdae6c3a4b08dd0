//! Process-wide cancellation for the background tasks.
//!
//! A `watch` channel carrying `true` once shutdown has been requested.
//! Dropping the trigger counts as a shutdown request too.

use tokio::sync::watch;

pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

#[derive(Clone, Debug)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left
        self.tx.send_replace(true);
    }
}

impl Default for ShutdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested or the trigger is dropped.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_wakes_every_subscriber() {
        let trigger = ShutdownTrigger::new();
        let mut a = trigger.subscribe();
        let mut b = trigger.subscribe();

        assert!(!a.is_cancelled());
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(1), a.cancelled())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), b.cancelled())
            .await
            .unwrap();
        assert!(a.is_cancelled());
    }

    #[tokio::test]
    async fn subscribing_after_trigger_is_already_cancelled() {
        let trigger = ShutdownTrigger::new();
        trigger.trigger();

        let mut late = trigger.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropping_trigger_releases_waiters() {
        let trigger = ShutdownTrigger::new();
        let mut s = trigger.subscribe();
        drop(trigger);

        tokio::time::timeout(Duration::from_secs(1), s.cancelled())
            .await
            .unwrap();
    }
}
