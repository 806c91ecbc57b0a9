use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use engine::{GameRules, PlayerSpec, RoleDistribution, RunnerConfig};
use llm::{OpenRouterClient, RetryPolicy};
use mafia_core::RoleKind;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Contents of `mafia.toml`.
#[derive(Debug, Deserialize)]
pub struct GameConfig {
    pub players: Vec<PlayerSpec>,
    /// Role counts keyed by role name. Omit to use the built-in table.
    #[serde(default)]
    pub roles: Option<BTreeMap<String, usize>>,
    #[serde(default)]
    pub rules: GameRules,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ApiConfig {
    pub fn client(&self) -> Result<OpenRouterClient> {
        let api_key = std::env::var(&self.api_key_env)
            .with_context(|| format!("{} is not set", self.api_key_env))?;
        Ok(OpenRouterClient::new(api_key, self.base_url.clone())
            .with_retry_policy(RetryPolicy::default().with_max_retries(self.max_retries)))
    }
}

impl GameConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.runner.max_concurrency == 0 {
            bail!("runner.max_concurrency must be at least 1");
        }
        config.distribution()?;
        Ok(config)
    }

    /// The configured role table, if any.
    pub fn distribution(&self) -> Result<Option<RoleDistribution>> {
        let Some(roles) = &self.roles else {
            return Ok(None);
        };

        let mut distribution = RoleDistribution::new();
        for (name, count) in roles {
            let Some(kind) = RoleKind::parse(&name.to_lowercase()) else {
                bail!("unknown role '{}'", name);
            };
            *distribution.entry(kind).or_default() += count;
        }
        Ok(Some(distribution))
    }
}
