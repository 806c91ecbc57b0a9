mod event;
mod phase;
mod player;
mod role;

pub use event::*;
pub use phase::*;
pub use player::*;
pub use role::*;
