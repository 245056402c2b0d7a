//! Script loader state machine.
//!
//! One [`ScriptLoader`] exists per unique script source (or explicit key)
//! and is shared by every producer referencing that source, so a script is
//! never loaded twice. The loader owns the status state machine:
//!
//! ```text
//! AwaitingLoad ──trigger──▶ Loading ──▶ Loaded
//!                                  └──▶ Error
//! ```
//!
//! `Loaded` and `Error` are terminal; retrying a failed script means
//! registering a fresh source key. The transition out of `AwaitingLoad`
//! happens on the *first* trigger to fire among all producers, which also
//! cancels every other pending subscription for the script.
//!
//! The loader owns bookkeeping, not the network: entering `Loading` injects
//! the script tag through the head store, and the embedder reports the
//! outcome via [`signal_loaded`](ScriptLoader::signal_loaded) /
//! [`signal_error`](ScriptLoader::signal_error).

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use super::trigger::{ScriptTrigger, SubscriptionToken};
use crate::resolve::TagPosition;
use crate::store::{HeadInput, HeadStore, TagInput, TagProps};
use crate::store::{EntryHandle, StoreInner};

/// Lifecycle status of a script source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    /// Trigger not yet satisfied; no load issued.
    AwaitingLoad,

    /// Trigger satisfied; the tag is injected and the fetch is in flight.
    Loading,

    /// Terminal success.
    Loaded,

    /// Terminal failure.
    Error,
}

impl ScriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptStatus::AwaitingLoad => "awaitingLoad",
            ScriptStatus::Loading => "loading",
            ScriptStatus::Loaded => "loaded",
            ScriptStatus::Error => "error",
        }
    }
}

/// Failure reported through the error-callback channel. Never thrown
/// synchronously into caller code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("script load failed: {message}")]
pub struct ScriptError {
    message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Description of a script to load.
#[derive(Debug, Clone, Default)]
pub struct ScriptInput {
    /// Script source URL. Doubles as the sharing key unless `key` is set.
    pub src: String,

    /// Explicit sharing/dedupe key.
    pub key: Option<String>,

    /// Extra attributes for the injected tag (`async`, `defer`,
    /// `crossorigin`, ...).
    pub props: TagProps,
}

impl ScriptInput {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Default::default()
        }
    }

    /// The registry key for this input.
    pub fn registry_key(&self) -> String {
        self.key.clone().unwrap_or_else(|| self.src.clone())
    }
}

impl From<&str> for ScriptInput {
    fn from(src: &str) -> Self {
        Self::new(src)
    }
}

/// Options for [`use_script`].
#[derive(Debug)]
pub struct ScriptOptions {
    /// The condition gating the load.
    pub trigger: ScriptTrigger,

    /// Where the injected tag is rendered.
    pub position: TagPosition,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            trigger: ScriptTrigger::Immediate,
            position: TagPosition::Head,
        }
    }
}

/// Shared per-source loader state.
pub struct ScriptLoader {
    key: String,
    src: String,
    props: TagProps,
    position: TagPosition,
    store: Weak<StoreInner>,

    status: RwLock<ScriptStatus>,

    /// Handle for the injected tag entry, once loading starts.
    entry: Mutex<Option<EntryHandle>>,

    /// Pending trigger subscriptions, one token per producer.
    pending: Mutex<Vec<SubscriptionToken>>,

    loaded_cbs: Mutex<Vec<Box<dyn Fn() + Send + Sync>>>,
    error_cbs: Mutex<Vec<Box<dyn Fn(&ScriptError) + Send + Sync>>>,
    last_error: Mutex<Option<ScriptError>>,
}

impl std::fmt::Debug for ScriptLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptLoader")
            .field("key", &self.key)
            .field("status", &self.status())
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl ScriptLoader {
    pub(crate) fn new(
        key: String,
        input: &ScriptInput,
        position: TagPosition,
        store: Weak<StoreInner>,
    ) -> Self {
        Self {
            key,
            src: input.src.clone(),
            props: input.props.clone(),
            position,
            store,
            status: RwLock::new(ScriptStatus::AwaitingLoad),
            entry: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
            loaded_cbs: Mutex::new(Vec::new()),
            error_cbs: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
        }
    }

    /// The registry key this loader is shared under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current status.
    pub fn status(&self) -> ScriptStatus {
        *self.status.read()
    }

    /// Number of pending trigger subscriptions.
    pub fn pending_triggers(&self) -> usize {
        self.pending.lock().len()
    }

    /// Register a producer's trigger. Returns the producer's own
    /// cancellation token.
    pub(crate) fn subscribe(self: &Arc<Self>, trigger: ScriptTrigger) -> SubscriptionToken {
        let token = SubscriptionToken::new();

        // Nothing left to gate once loading has started.
        if self.status() != ScriptStatus::AwaitingLoad {
            return token;
        }

        match trigger {
            ScriptTrigger::Immediate => {
                self.load();
            }
            ScriptTrigger::Manual => {
                self.pending.lock().push(token.clone());
            }
            ScriptTrigger::Future(fut) => {
                self.pending.lock().push(token.clone());
                let loader = Arc::downgrade(self);
                let task_token = token.clone();
                self.spawn(async move {
                    tokio::select! {
                        _ = task_token.cancelled() => {}
                        _ = fut => {
                            if !task_token.is_cancelled() {
                                if let Some(loader) = loader.upgrade() {
                                    loader.load();
                                }
                            }
                        }
                    }
                });
            }
            ScriptTrigger::Poll(source) => {
                self.pending.lock().push(token.clone());
                let loader = Arc::downgrade(self);
                let task_token = token.clone();
                self.spawn(async move {
                    loop {
                        if task_token.is_cancelled() {
                            return;
                        }
                        if source() {
                            if let Some(loader) = loader.upgrade() {
                                loader.load();
                            }
                            return;
                        }
                        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                    }
                });
            }
            ScriptTrigger::Callback(register) => {
                self.pending.lock().push(token.clone());
                let loader = Arc::downgrade(self);
                let cb_token = token.clone();
                register(Box::new(move || {
                    if !cb_token.is_cancelled() {
                        if let Some(loader) = loader.upgrade() {
                            loader.load();
                        }
                    }
                }));
            }
        }

        token
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + Send + 'static) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let _ = handle.spawn(task);
            }
            Err(_) => {
                warn!(
                    script = %self.key,
                    "no async runtime; trigger parked until explicit load"
                );
            }
        }
    }

    /// Cancel one producer's subscription without touching the others.
    pub(crate) fn unsubscribe(&self, token: &SubscriptionToken) {
        token.cancel();
        self.pending.lock().retain(|t| !t.is_cancelled());
    }

    /// Transition `AwaitingLoad → Loading`: cancel every pending trigger
    /// and inject the script tag. Idempotent; only the first call acts.
    pub fn load(&self) {
        {
            let mut status = self.status.write();
            if *status != ScriptStatus::AwaitingLoad {
                return;
            }
            *status = ScriptStatus::Loading;
        }
        debug!(script = %self.key, "script trigger satisfied, loading");

        for token in self.pending.lock().drain(..) {
            token.cancel();
        }

        if let Some(inner) = self.store.upgrade() {
            let store = HeadStore::from_inner(inner);
            let mut props = self.props.clone();
            props.insert("src".to_string(), self.src.clone().into());
            let handle = store.push(HeadInput {
                script: vec![TagInput {
                    props,
                    key: Some(self.key.clone()),
                    position: Some(self.position),
                    ..Default::default()
                }],
                ..Default::default()
            });
            *self.entry.lock() = Some(handle);
        }
    }

    /// Report successful script execution. Fires loaded callbacks in
    /// registration order.
    pub fn signal_loaded(&self) {
        {
            let mut status = self.status.write();
            if *status != ScriptStatus::Loading {
                return;
            }
            *status = ScriptStatus::Loaded;
        }
        debug!(script = %self.key, "script loaded");
        let callbacks: Vec<_> = self.loaded_cbs.lock().drain(..).collect();
        for cb in callbacks {
            cb();
        }
    }

    /// Report script failure. Fires error callbacks in registration order.
    pub fn signal_error(&self, error: ScriptError) {
        {
            let mut status = self.status.write();
            if *status != ScriptStatus::Loading {
                return;
            }
            *status = ScriptStatus::Error;
        }
        debug!(script = %self.key, error = %error, "script failed");
        *self.last_error.lock() = Some(error.clone());
        let callbacks: Vec<_> = self.error_cbs.lock().drain(..).collect();
        for cb in callbacks {
            cb(&error);
        }
    }

    /// Register a success callback. Replays synchronously if the script is
    /// already loaded.
    pub fn on_loaded<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.status() == ScriptStatus::Loaded {
            callback();
            return;
        }
        self.loaded_cbs.lock().push(Box::new(callback));
    }

    /// Register a failure callback. Replays synchronously if the script
    /// already failed.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&ScriptError) + Send + Sync + 'static,
    {
        let replay = {
            if self.status() == ScriptStatus::Error {
                self.last_error.lock().clone()
            } else {
                None
            }
        };
        match replay {
            Some(error) => callback(&error),
            None => self.error_cbs.lock().push(Box::new(callback)),
        }
    }

    /// Remove the script's tag and bookkeeping entirely.
    ///
    /// This is the explicit opt-out from the retain-for-store-lifetime
    /// policy: pending triggers are cancelled, the injected tag entry is
    /// disposed, and the loader leaves the registry so a later
    /// registration starts fresh.
    pub fn remove(&self) {
        for token in self.pending.lock().drain(..) {
            token.cancel();
        }
        if let Some(handle) = self.entry.lock().take() {
            handle.dispose();
        }
        if let Some(inner) = self.store.upgrade() {
            inner.scripts.remove(&self.key);
        }
        debug!(script = %self.key, "script removed");
    }
}

/// One producer's view of a shared script.
///
/// Handles are independent per producer: each carries its own trigger
/// subscription, while status and callbacks address the shared loader.
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    loader: Arc<ScriptLoader>,
    token: SubscriptionToken,
}

impl ScriptHandle {
    /// Current status of the underlying script.
    pub fn status(&self) -> ScriptStatus {
        self.loader.status()
    }

    /// Force the load now, regardless of the trigger.
    pub fn load(&self) {
        self.loader.load();
    }

    /// Register a success callback.
    pub fn on_loaded<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.loader.on_loaded(callback);
    }

    /// Register a failure callback.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&ScriptError) + Send + Sync + 'static,
    {
        self.loader.on_error(callback);
    }

    /// Give up this producer's interest in the script.
    ///
    /// Cancels only this producer's pending trigger; other producers'
    /// subscriptions and the loader's bookkeeping are untouched.
    pub fn dispose(&self) {
        self.loader.unsubscribe(&self.token);
    }

    /// Remove the script's tag and bookkeeping for every producer.
    pub fn remove(&self) {
        self.loader.remove();
    }

    /// The shared loader, for embedders that deliver load/error signals.
    pub fn loader(&self) -> &Arc<ScriptLoader> {
        &self.loader
    }
}

/// Register interest in a script, sharing the loader with any other
/// producer that referenced the same source.
///
/// Only the first registration's input and position are used; later
/// registrations contribute a trigger and receive the shared state.
pub fn use_script(
    store: &HeadStore,
    input: impl Into<ScriptInput>,
    options: ScriptOptions,
) -> ScriptHandle {
    let input = input.into();
    let key = input.registry_key();

    let loader = {
        let slot = store
            .inner()
            .scripts
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(ScriptLoader::new(
                    key.clone(),
                    &input,
                    options.position,
                    Arc::downgrade(store.inner()),
                ))
            });
        Arc::clone(slot.value())
    };

    let token = loader.subscribe(options.trigger);
    ScriptHandle { loader, token }
}
