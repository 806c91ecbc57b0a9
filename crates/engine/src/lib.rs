pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod parsing;
pub mod phase_data;
pub mod prompts;
pub mod resolver;
pub mod routing;
pub mod rules;
pub mod runner;
pub mod scheduler;
pub mod setup;
pub mod state;
pub mod steps;
pub mod votes;
pub mod win;

pub use agent::{AgentCaller, PendingGuard};
pub use checkpoint::Checkpoint;
pub use config::{FailurePolicy, RunnerConfig};
pub use error::{EngineError, Result};
pub use phase_data::{Ballot, PhaseData};
pub use rules::GameRules;
pub use runner::{GameRunner, StepOutcome};
pub use setup::{default_distribution, new_game, PlayerSpec, RoleDistribution};
pub use state::GameState;
pub use steps::Step;
pub use win::Winner;
