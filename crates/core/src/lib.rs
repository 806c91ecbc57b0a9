//! Domain model for the Mafia simulation.
//!
//! Players and their roles, the append-only event log, and the
//! visibility rules that decide which player sees which event.

pub mod domain;
pub mod error;
pub mod log;
pub mod visibility;

pub use domain::*;
pub use error::{CoreError, Result};
pub use log::EventLog;
pub use visibility::{Recipients, VisibilityGroup, VisibilityManager, MAFIA_GROUP};
