//! Status telemetry for the Mafia simulation
//!
//! This crate provides the event bus and the status events a presentation
//! layer subscribes to. Publishing never blocks and never fails the game.

mod bus;
mod emitter;
mod types;

pub use bus::EventBus;
pub use emitter::StatusEmitter;
pub use types::*;
