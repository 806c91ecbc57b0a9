mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::{EngineError, GameRunner, GameState, StepOutcome, Winner};
use events::{EventBus, EventEnvelope, StatusEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::GameConfig;

const DEFAULT_CONFIG: &str = "mafia.toml";
const DEFAULT_SAVE: &str = "mafia-save.json";

#[derive(Parser)]
#[command(name = "mafia-sim")]
#[command(about = "Autonomous Mafia games played by language models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deal a new game and play it
    Run {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Written after every committed step
        #[arg(short, long, default_value = DEFAULT_SAVE)]
        save: PathBuf,

        /// Overrides the seed in the config file
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Continue a paused or stalled game
    Resume {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        #[arg(short, long, default_value = DEFAULT_SAVE)]
        save: PathBuf,
    },
    /// Show the built-in role table for a player count
    Roles { players: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Run { config, save, seed } => run(&config, &save, seed).await,
        Commands::Resume { config, save } => resume(&config, &save).await,
        Commands::Roles { players } => {
            roles(players);
            Ok(())
        }
    }
}

async fn run(config_path: &Path, save: &Path, seed: Option<u64>) -> Result<()> {
    let config = GameConfig::load(config_path).await?;
    let seed = seed.or(config.seed);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let distribution = config.distribution()?;
    let state = engine::new_game(&config.players, distribution.as_ref(), config.rules.clone(), &mut rng)
        .context("Failed to set up game")?;
    tracing::info!(game_id = %state.game_id, players = state.players.len(), "New game dealt");
    save_state(&state, save).await?;

    play(state, &config, seed, save).await
}

async fn resume(config_path: &Path, save: &Path) -> Result<()> {
    let config = GameConfig::load(config_path).await?;
    let content = tokio::fs::read_to_string(save)
        .await
        .with_context(|| format!("Failed to read save {}", save.display()))?;
    let state: GameState = serde_json::from_str(&content)
        .with_context(|| format!("Corrupt save {}", save.display()))?;

    if state.game_over {
        println!("That game is already over.");
        print_summary(&state);
        return Ok(());
    }

    tracing::info!(game_id = %state.game_id, step = %state.current_step, day = state.day, "Resuming game");
    play(state, &config, config.seed, save).await
}

async fn play(state: GameState, config: &GameConfig, seed: Option<u64>, save: &Path) -> Result<()> {
    let service = Arc::new(config.api.client()?);
    let bus = EventBus::new();
    let spectator = tokio::spawn(spectate(bus.subscribe()));

    let mut runner = GameRunner::new(state, service, bus, config.runner.clone());
    if let Some(seed) = seed {
        runner = runner.with_seed(seed);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, pausing");
            on_signal.cancel();
        }
    });

    let result = loop {
        match runner.execute_one_step(&cancel).await {
            Ok(StepOutcome::Advanced { .. }) => save_state(runner.state(), save).await?,
            Ok(StepOutcome::Finished) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let state = runner.into_state();
    save_state(&state, save).await?;
    // The runner held the last sender; the spectator drains and exits.
    let _ = spectator.await;

    match result {
        Ok(()) => {
            print_summary(&state);
            Ok(())
        }
        Err(EngineError::Paused { step }) => {
            println!();
            println!("Paused before {}. Saved to {}.", step, save.display());
            println!("Resume with: mafia-sim resume --save {}", save.display());
            Ok(())
        }
        Err(e @ EngineError::Service { .. }) => Err(e).with_context(|| {
            format!(
                "Game stalled at {}; resume from {} once the service recovers",
                state.current_step,
                save.display()
            )
        }),
        Err(e) => Err(e).context("Game aborted"),
    }
}

/// Print public events as they are logged.
async fn spectate(mut rx: broadcast::Receiver<EventEnvelope>) {
    loop {
        match rx.recv().await {
            Ok(envelope) => match envelope.event {
                StatusEvent::EventLogged {
                    public: true,
                    player,
                    message,
                    ..
                } => match player {
                    Some(player) => println!("{}: {}", player, message),
                    None => println!("{}", message),
                },
                StatusEvent::PlayerStatus {
                    player, activity, label, ..
                } => {
                    tracing::debug!(player = %player, label = %label, activity = ?activity, "Player status");
                }
                _ => {}
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped = skipped, "Spectator fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Write the save atomically so an interrupt never leaves half a file.
async fn save_state(state: &GameState, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to write save {}", path.display()))?;
    Ok(())
}

fn print_summary(state: &GameState) {
    println!();
    println!("════════════════════════════════════════");
    match (state.winner, &state.winning_jester) {
        (Some(Winner::Jester), Some(jester)) => println!("Winner: {} the Jester", jester),
        (Some(winner), _) => println!("Winner: {}", winner.as_str()),
        (None, _) => println!("No winner"),
    }
    if !state.mvp.is_empty() {
        println!("MVP:    {}", state.mvp.join(", "));
    }
    println!("Days:   {}", state.day);
    println!();
    for player in &state.players {
        let status = if player.alive { "alive" } else { "dead" };
        println!("  {:<12} {:<10} {}", player.name, player.kind().display_name(), status);
    }
    println!();
}

fn roles(players: usize) {
    let distribution = engine::default_distribution(players);
    let special: usize = distribution.values().sum();
    println!("{} players:", players);
    for (kind, count) in &distribution {
        println!("  {:<10} {}", kind.display_name(), count);
    }
    if players > special {
        println!("  {:<10} {}", "Town", players - special);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mafia_sim=info,engine=info,llm=warn".into()),
        )
        .init();
}
