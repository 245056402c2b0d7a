//! Debounced render scheduling.
//!
//! A burst of store mutations (a page worth of components mounting) should
//! produce one reconcile pass, not one per mutation. The scheduler
//! subscribes to store changes, coalesces notifications over a short
//! debounce window, and applies the *latest* revision once the store goes
//! quiet. A new mutation during the window supersedes the in-flight pass,
//! so the document always converges on the newest head and never renders
//! an intermediate one.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use crate::script::SubscriptionToken;
use crate::store::{ChangeListener, HeadStore};

use super::document::HeadDom;
use super::reconcile::DomRenderer;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

/// Background task applying store changes to a document.
///
/// Dropping the scheduler stops the task; the renderer (and its document)
/// remain accessible through the shared handle returned by [`renderer`].
///
/// [`renderer`]: Scheduler::renderer
pub struct Scheduler<D: HeadDom + Send + 'static> {
    renderer: Arc<Mutex<DomRenderer<D>>>,
    shutdown: SubscriptionToken,
    _listener: ChangeListener,
}

impl<D: HeadDom + Send + 'static> Scheduler<D> {
    /// Spawn a scheduler with the default debounce window.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn(store: HeadStore, dom: D) -> Self {
        Self::spawn_with_debounce(store, dom, DEFAULT_DEBOUNCE)
    }

    /// Spawn a scheduler with an explicit debounce window.
    pub fn spawn_with_debounce(store: HeadStore, dom: D, debounce: Duration) -> Self {
        let renderer = Arc::new(Mutex::new(DomRenderer::new(dom)));
        let notify = Arc::new(Notify::new());
        let shutdown = SubscriptionToken::new();

        let wake = notify.clone();
        let listener = store.on_change(move |_| {
            wake.notify_one();
        });

        let task_renderer = renderer.clone();
        let task_shutdown = shutdown.clone();
        let _ = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_shutdown.cancelled() => return,
                    _ = notify.notified() => {}
                }

                // Coalesce: wait until the store has been quiet for a full
                // window. Mutations arriving mid-wait supersede this pass.
                loop {
                    let revision = store.revision();
                    tokio::time::sleep(debounce).await;
                    if task_shutdown.is_cancelled() {
                        return;
                    }
                    if store.revision() == revision {
                        break;
                    }
                }

                let head = store.resolve();
                debug!(revision = head.revision, "applying resolved head");
                task_renderer.lock().render(&store);
            }
        });

        Self {
            renderer,
            shutdown,
            _listener: listener,
        }
    }

    /// Shared access to the renderer and its document.
    pub fn renderer(&self) -> Arc<Mutex<DomRenderer<D>>> {
        self.renderer.clone()
    }

    /// Stop the background task. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl<D: HeadDom + Send + 'static> Drop for Scheduler<D> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::VirtualDocument;
    use crate::store::HeadInput;

    async fn settle() {
        tokio::time::sleep(DEFAULT_DEBOUNCE * 5).await;
    }

    #[tokio::test]
    async fn applies_mutations_after_debounce() {
        let store = HeadStore::new();
        let scheduler = Scheduler::spawn(store.clone(), VirtualDocument::new());

        store.push(HeadInput::titled("Scheduled"));
        settle().await;

        let renderer = scheduler.renderer();
        assert_eq!(renderer.lock().dom().title(), "Scheduled");
    }

    #[tokio::test]
    async fn burst_of_mutations_coalesces_to_one_pass() {
        let store = HeadStore::new();
        let scheduler = Scheduler::spawn(store.clone(), VirtualDocument::new());

        let handle = store.push(HeadInput::titled("one"));
        handle.patch(HeadInput::titled("two"));
        handle.patch(HeadInput::titled("three"));
        settle().await;

        let renderer = scheduler.renderer();
        let guard = renderer.lock();
        // Only the final revision was applied: a single title write.
        assert_eq!(guard.dom().title(), "three");
        assert_eq!(guard.dom().write_count(), 1);
    }

    #[tokio::test]
    async fn converges_on_latest_revision() {
        let store = HeadStore::new();
        let scheduler = Scheduler::spawn(store.clone(), VirtualDocument::new());

        let handle = store.push(HeadInput::titled("first"));
        settle().await;

        handle.patch(HeadInput::titled("second"));
        handle.dispose();
        settle().await;

        let renderer = scheduler.renderer();
        assert_eq!(renderer.lock().dom().title(), "");
    }

    #[tokio::test]
    async fn shutdown_stops_applying() {
        let store = HeadStore::new();
        let scheduler = Scheduler::spawn(store.clone(), VirtualDocument::new());
        scheduler.shutdown();

        store.push(HeadInput::titled("late"));
        settle().await;

        let renderer = scheduler.renderer();
        assert_eq!(renderer.lock().dom().title(), "");
    }
}
