//! Caller side of the ability engine.
//!
//! The runtime owns the ability slots of one caster. It rejects a cast on a
//! slot that is still busy, forwards frame ticks to every in-flight cast and
//! funnels owner disable into cleanup for all of them.
//!
//! # Modules
//!
//! - [`config`]: Environment-driven runtime configuration and content loading
//! - [`slots`]: Per-caster ability slots
//! - [`error`]: Runtime error types

pub mod config;
pub mod error;
pub mod slots;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use slots::{AbilitySlots, SlotReport};
