//! Script Loading
//!
//! This module governs asynchronous script injection: trigger-gated
//! deferral, load/error callback delivery, and sharing of one loader per
//! script source across any number of producers.
//!
//! # Concepts
//!
//! ## Triggers
//!
//! A trigger is the condition gating when a deferred script starts
//! loading. Framework reactivity is reduced to four uniform shapes
//! (immediate, async condition, pollable boolean, callback registration);
//! see [`ScriptTrigger`].
//!
//! ## Sharing
//!
//! All producers referencing one source share a single [`ScriptLoader`]
//! keyed by source (or explicit key) in a registry owned by the store. The
//! first trigger to fire wins; every other pending subscription is then
//! cancelled.
//!
//! ## Cancellation
//!
//! Tokens are scoped per subscription. Disposing one producer can never
//! abort another producer's live trigger for the same script, and a script
//! whose every producer disposed before triggering is parked, never
//! loaded, and revived by the next registration.

pub mod loader;
pub mod trigger;

pub use loader::{
    use_script, ScriptError, ScriptHandle, ScriptInput, ScriptLoader, ScriptOptions, ScriptStatus,
};
pub use trigger::{LoadFn, ScriptTrigger, SubscriptionToken};
