use serde::{Deserialize, Serialize};

/// What to do when a reasoning call fails after its retries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Roll the step back to its checkpoint and stall until resumed.
    #[default]
    Rollback,
    /// Substitute the decision's safe default (abstain, pass, no message).
    Abstain,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rollback => "rollback",
            Self::Abstain => "abstain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rollback" => Some(Self::Rollback),
            "abstain" => Some(Self::Abstain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub failure_policy: FailurePolicy,
    /// Upper bound on in-flight reasoning calls during a fan-out.
    pub max_concurrency: usize,
    /// Most recent visible events included in a prompt.
    pub transcript_limit: usize,
    pub max_tokens: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Rollback,
            max_concurrency: 8,
            transcript_limit: 80,
            max_tokens: 600,
        }
    }
}

impl RunnerConfig {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_transcript_limit(mut self, limit: usize) -> Self {
        self.transcript_limit = limit;
        self
    }
}
