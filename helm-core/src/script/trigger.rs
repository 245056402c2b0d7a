//! Script load triggers and per-subscription cancellation.
//!
//! A trigger is the condition gating when a deferred script begins loading.
//! Reactive framework bindings are reduced, at this boundary, to a uniform
//! set of shapes: an already-satisfied condition, a cancellable async
//! condition, a pollable boolean source, or a callback-registration source.
//!
//! Each producer's trigger gets its own [`SubscriptionToken`]. Tokens are
//! scoped per-subscription, not per-script: an old producer cancelling its
//! trigger must never abort a newer producer's live subscription to the
//! same shared script.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::Notify;

/// Invoking this starts the script load. Handed to callback-registration
/// trigger sources.
pub type LoadFn = Box<dyn FnOnce() + Send>;

/// The condition gating a script's transition out of `AwaitingLoad`.
pub enum ScriptTrigger {
    /// No gate: the script starts loading immediately.
    Immediate,

    /// Load only when [`load`](crate::script::ScriptHandle::load) is called
    /// explicitly.
    Manual,

    /// A cancellable async condition; the script loads when it settles.
    Future(BoxFuture<'static, ()>),

    /// A boolean source polled until it first returns `true`.
    Poll(Box<dyn Fn() -> bool + Send + Sync>),

    /// A source that accepts a load callback and invokes it when ready
    /// (e.g. a framework's mount hook).
    Callback(Box<dyn FnOnce(LoadFn) + Send>),
}

impl ScriptTrigger {
    /// Trigger from a plain future.
    pub fn future<F>(fut: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self::Future(Box::pin(fut))
    }

    /// Trigger from a pollable boolean source.
    pub fn poll<F>(source: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::Poll(Box::new(source))
    }

    /// Trigger from a callback-registration source.
    pub fn callback<F>(register: F) -> Self
    where
        F: FnOnce(LoadFn) + Send + 'static,
    {
        Self::Callback(Box::new(register))
    }
}

impl std::fmt::Debug for ScriptTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScriptTrigger::Immediate => "Immediate",
            ScriptTrigger::Manual => "Manual",
            ScriptTrigger::Future(_) => "Future",
            ScriptTrigger::Poll(_) => "Poll",
            ScriptTrigger::Callback(_) => "Callback",
        };
        f.write_str(name)
    }
}

/// Cooperative cancellation for one trigger subscription.
///
/// Cloning shares the token; cancelling any clone cancels the
/// subscription.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl SubscriptionToken {
    /// Create a live token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the subscription. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    /// Whether the subscription has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the subscription is cancelled.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.inner.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn token_starts_live() {
        let token = SubscriptionToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        // Idempotent.
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_cancellation() {
        let token = SubscriptionToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiter() {
        let token = SubscriptionToken::new();
        let waiter = token.clone();

        let task = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_cancelled() {
        let token = SubscriptionToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(50), token.cancelled())
            .await
            .expect("already-cancelled token should not block");
    }
}
