use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use engine::scheduler::{Selection, SelectionReason};
use engine::{
    EngineError, FailurePolicy, GameRules, GameRunner, GameState, RunnerConfig, Step, StepOutcome,
    Winner,
};
use events::{EventBus, StatusEvent};
use llm::{Completion, CompletionRequest, LlmError, LlmResult, MessageRole, ReasoningService};
use mafia_core::{Audience, Player, Role, RoleKind};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

/// One decision request as the scripted service sees it.
struct Call<'a> {
    player: String,
    label: String,
    /// Target choices offered by the schema, without the abstain sentinel.
    options: Vec<String>,
    may_abstain: bool,
    cancel: &'a CancellationToken,
}

type Script = Box<dyn Fn(&Call<'_>) -> LlmResult<Completion> + Send + Sync>;

struct ScriptedService {
    script: Script,
    calls: Mutex<Vec<(String, String, Vec<String>)>>,
}

impl ScriptedService {
    fn new(script: impl Fn(&Call<'_>) -> LlmResult<Completion> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `(player, options)` of every call made with `label`.
    fn calls(&self, label: &str) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, l, _)| l == label)
            .map(|(player, _, options)| (player.clone(), options.clone()))
            .collect()
    }
}

fn speaker(request: &CompletionRequest) -> String {
    request
        .messages
        .iter()
        .find(|m| m.role == MessageRole::System)
        .and_then(|m| m.content.strip_prefix("You are "))
        .and_then(|rest| rest.split(',').next())
        .unwrap_or_default()
        .to_string()
}

fn choices(request: &CompletionRequest) -> Vec<String> {
    request
        .schema
        .as_ref()
        .and_then(|s| s.schema["properties"]["target"]["enum"].as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ReasoningService for ScriptedService {
    async fn complete(&self, request: CompletionRequest, cancel: &CancellationToken) -> LlmResult<Completion> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let mut options = choices(&request);
        let may_abstain = options.iter().any(|o| o == "ABSTAIN");
        options.retain(|o| o != "ABSTAIN");
        let call = Call {
            player: speaker(&request),
            label: request.label.clone(),
            options,
            may_abstain,
            cancel,
        };
        self.calls
            .lock()
            .unwrap()
            .push((call.player.clone(), call.label.clone(), call.options.clone()));
        (self.script)(&call)
    }
}

fn target(name: &str) -> LlmResult<Completion> {
    Ok(Completion::structured(json!({ "reasoning": "scripted", "target": name })))
}

fn chatter() -> LlmResult<Completion> {
    Ok(Completion::structured(json!({
        "message": "I have a feeling about this.",
        "notes": "Watch the quiet ones.",
        "thoughts": "Weighing my options.",
        "priority": 5
    })))
}

fn pass() -> LlmResult<Completion> {
    Ok(Completion::structured(json!({
        "wants_to_interrupt": false,
        "wants_to_respond": false,
        "wants_to_pass": true
    })))
}

/// First offered target, a pass for polls, small talk for everything else.
fn default_reply(call: &Call<'_>) -> LlmResult<Completion> {
    match call.label.as_str() {
        "discussion_poll" => pass(),
        _ => match call.options.first() {
            Some(first) => target(first),
            None => chatter(),
        },
    }
}

fn poll(interrupt: bool, respond: bool, pass: bool) -> LlmResult<Completion> {
    Ok(Completion::structured(json!({
        "wants_to_interrupt": interrupt,
        "wants_to_respond": respond,
        "wants_to_pass": pass
    })))
}

fn server_error() -> LlmResult<Completion> {
    Err(LlmError::Api {
        message: "upstream unavailable".to_string(),
        status_code: Some(503),
    })
}

fn open_day_rules() -> GameRules {
    GameRules::default()
        .with_day1_round_robin(false)
        .with_day1_no_lynch(false)
        .with_max_discussion_messages(2)
}

fn build_runner(
    roster: &[(&str, RoleKind)],
    rules: GameRules,
    service: Arc<ScriptedService>,
    config: RunnerConfig,
) -> GameRunner {
    let players = roster
        .iter()
        .map(|(name, kind)| Player::new(*name, "test/model", *kind))
        .collect();
    GameRunner::new(GameState::new(players, rules), service, EventBus::new(), config).with_seed(7)
}

async fn step_until(runner: &mut GameRunner, done: impl Fn(&GameState) -> bool) {
    let cancel = CancellationToken::new();
    for _ in 0..500 {
        if done(runner.state()) {
            return;
        }
        runner
            .execute_one_step(&cancel)
            .await
            .expect("step should succeed");
    }
    panic!("condition not reached within 500 steps");
}

fn messages(state: &GameState) -> Vec<String> {
    state.log.snapshot().into_iter().map(|e| e.message).collect()
}

fn snapshot(state: &GameState) -> Value {
    serde_json::to_value(state).unwrap()
}

mod full_games {
    use super::*;

    #[tokio::test]
    async fn test_mafia_wins_at_parity() {
        let service = ScriptedService::new(default_reply);
        let mut runner = build_runner(
            &[("Mara", RoleKind::Mafia), ("Tom", RoleKind::Town), ("Tess", RoleKind::Town)],
            GameRules::default(),
            service.clone(),
            RunnerConfig::default(),
        );

        let winner = runner.run_to_completion(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner, Some(Winner::Mafia));

        let state = runner.state();
        assert!(state.game_over);
        assert_eq!(state.phase, mafia_core::Phase::Ended);
        assert_eq!(state.current_step, Step::GameEnd);

        let log = messages(state);
        assert!(log.contains(&"Tom has been found dead, killed during the night!".to_string()));
        assert!(log.contains(&"Game over! The Mafia wins!".to_string()));
        assert_eq!(state.mvp, vec!["Mara".to_string()]);

        // Everyone, including the dead, speaks after the game.
        assert_eq!(service.calls("postgame_discussion").len(), 3);

        let again = runner.execute_one_step(&CancellationToken::new()).await.unwrap();
        assert_eq!(again, StepOutcome::Finished);
    }

    #[tokio::test]
    async fn test_town_lynches_mafia_and_protection_stays_hidden() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" | "doctor_act" => target("Tom"),
            "voting" if call.player == "Mara" => target("Tom"),
            "voting" => target("Mara"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Doc", RoleKind::Doctor),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
            ],
            open_day_rules(),
            service.clone(),
            RunnerConfig::default(),
        );

        let winner = runner.run_to_completion(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner, Some(Winner::Town));

        let state = runner.state();
        let log = messages(state);
        assert!(log.contains(&"No one died during the night.".to_string()));
        assert!(log.contains(&"Mara has died. Lynched by vote (3 votes).".to_string()));
        assert!(log.contains(&"Mara was MAFIA.".to_string()));

        // Tom never learns he was saved.
        let seen_by_tom = state.visibility.visible_to(&state.log, "Tom");
        assert!(seen_by_tom.iter().all(|e| !e.message.contains("protect")));

        // Discussion stopped at the message limit.
        assert_eq!(service.calls("discussion_message").len(), 2);
    }

    #[tokio::test]
    async fn test_lynched_jester_wins_alone() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" => target("Tom"),
            "voting" if call.player == "Jess" => target("Mara"),
            "voting" => target("Jess"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Jess", RoleKind::Jester),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
            ],
            open_day_rules(),
            service,
            RunnerConfig::default(),
        );

        let winner = runner.run_to_completion(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner, Some(Winner::Jester));

        let state = runner.state();
        assert_eq!(state.winning_jester.as_deref(), Some("Jess"));
        let log = messages(state);
        assert!(log.contains(&"Jess was the JESTER! Jess wins!".to_string()));
        assert!(log.contains(&"Game over! Jess the Jester wins!".to_string()));
    }
}

mod night_roles {
    use super::*;

    #[tokio::test]
    async fn test_doctor_cannot_repeat_protection() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" | "doctor_act" => target("Tom"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Doc", RoleKind::Doctor),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
            ],
            GameRules::default(),
            service.clone(),
            RunnerConfig::default(),
        );

        step_until(&mut runner, |s| s.day == 2).await;

        let doctor_calls = service.calls("doctor_act");
        assert_eq!(doctor_calls.len(), 2);
        assert!(doctor_calls[0].1.contains(&"Tom".to_string()));
        assert!(doctor_calls[0].1.contains(&"Doc".to_string()));
        assert!(!doctor_calls[1].1.contains(&"Tom".to_string()));

        let state = runner.state();
        assert!(!state.player("Tom").unwrap().alive);
        let log = messages(state);
        assert_eq!(log.iter().filter(|m| m.starts_with("Tom has been found dead")).count(), 1);
        assert!(log.contains(&"No one died during the night.".to_string()));
    }

    #[tokio::test]
    async fn test_vigilante_fires_once() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" => target("Tom"),
            "vigilante_act" => target("Tina"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Vic", RoleKind::Vigilante),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
            ],
            GameRules::default(),
            service.clone(),
            RunnerConfig::default(),
        );

        step_until(&mut runner, |s| s.day == 2).await;

        assert_eq!(service.calls("vigilante_act").len(), 1);
        assert_eq!(service.calls("vigilante_discuss").len(), 1);

        let state = runner.state();
        assert_eq!(
            state.player("Vic").unwrap().role,
            Role::Vigilante { bullet_used: true }
        );
        assert!(!state.player("Tina").unwrap().alive);

        let tina_death = state
            .log
            .snapshot()
            .into_iter()
            .find(|e| e.message.starts_with("Tina has been found dead"))
            .unwrap();
        assert_eq!(tina_death.metadata.unwrap()["reason"], "vigilante_kill");
    }

    #[tokio::test]
    async fn test_mafia_may_abstain_from_the_kill() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" if call.may_abstain => target("ABSTAIN"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
            ],
            GameRules::default(),
            service,
            RunnerConfig::default(),
        );

        step_until(&mut runner, |s| s.day == 1).await;

        let state = runner.state();
        assert!(state.players.iter().all(|p| p.alive));
        let log = messages(state);
        assert!(log.contains(&"Mara abstains from the kill vote.".to_string()));
        assert!(log.contains(&"No one died during the night.".to_string()));
    }

    #[tokio::test]
    async fn test_sheriff_result_is_private() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "sheriff_act" => target("Mara"),
            "mafia_vote" => target("Tess"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Sam", RoleKind::Sheriff),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
            ],
            GameRules::default(),
            service,
            RunnerConfig::default(),
        );

        step_until(&mut runner, |s| s.day == 1).await;

        let state = runner.state();
        let result = state
            .log
            .snapshot()
            .into_iter()
            .find(|e| e.message == "Mara is MAFIA!")
            .unwrap();
        assert_eq!(result.audience, Audience::named("Sam"));
        assert!(!state.visibility.can_see(&result, "Tom"));
        assert!(matches!(
            &state.player("Sam").unwrap().role,
            Role::Sheriff { investigations } if investigations.len() == 1
        ));
    }
}

mod day_one {
    use super::*;

    #[tokio::test]
    async fn test_round_robin_day_skips_vote() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" => target("Tom"),
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
            ],
            GameRules::default(),
            service.clone(),
            RunnerConfig::default(),
        );

        step_until(&mut runner, |s| s.day == 1 && s.current_step == Step::NightStart).await;

        // Tom died in the night; the three survivors introduce themselves.
        assert_eq!(service.calls("introduction_message").len(), 3);
        assert!(service.calls("discussion_poll").is_empty());
        assert!(service.calls("voting").is_empty());
        assert!(messages(runner.state()).contains(&"Introduction phase complete.".to_string()));
    }
}

mod discussion {
    use super::*;

    #[tokio::test]
    async fn test_each_selection_tier_in_one_day() {
        let spoken = Arc::new(AtomicUsize::new(0));
        let count = spoken.clone();
        let service = ScriptedService::new(move |call| match call.label.as_str() {
            "mafia_vote" => target("Troy"),
            "discussion_message" => {
                count.fetch_add(1, Ordering::SeqCst);
                chatter()
            }
            "discussion_poll" => match (count.load(Ordering::SeqCst), call.player.as_str()) {
                (0, "Tess") => poll(true, false, false),
                (1, "Tina") => poll(false, true, false),
                // Respond is suppressed this round, so Tess waits like Tom.
                (2, "Tess") => poll(false, true, true),
                (2, "Tom") => poll(false, false, false),
                _ => pass(),
            },
            _ => default_reply(call),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
                ("Troy", RoleKind::Town),
            ],
            open_day_rules().with_max_discussion_messages(4),
            service.clone(),
            RunnerConfig::default(),
        );

        let cancel = CancellationToken::new();
        let mut picks: Vec<Selection> = Vec::new();
        let mut discussed = Vec::new();
        for _ in 0..500 {
            runner.execute_one_step(&cancel).await.unwrap();
            let Some(day) = runner.state().phase_data.day() else {
                continue;
            };
            if let Some(selection) = &day.pending_speaker {
                picks.push(selection.clone());
            }
            if day.scheduler.is_finished() {
                discussed = day.messages.clone();
                break;
            }
        }

        let chosen: Vec<(&str, SelectionReason)> = picks.iter().map(|s| (s.speaker.as_str(), s.reason)).collect();
        assert_eq!(chosen[0], ("Tess", SelectionReason::Interrupt));
        assert_eq!(chosen[1], ("Tina", SelectionReason::Respond));
        assert_eq!(chosen[2], ("Tom", SelectionReason::Queue));
        assert_eq!(chosen[3].1, SelectionReason::Forced);
        assert_eq!(chosen.len(), 4);
        assert_ne!(chosen[3].0, "Tom");

        let speakers: Vec<&str> = discussed.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(&speakers[..3], &["Tess", "Tina", "Tom"]);

        // The dead never get polled.
        assert!(service.calls("discussion_poll").iter().all(|(player, _)| player != "Troy"));

        let turn_types: Vec<String> = runner
            .state()
            .log
            .snapshot()
            .into_iter()
            .filter_map(|e| e.metadata)
            .filter_map(|m| m["turn_type"].as_str().map(str::to_string))
            .collect();
        assert_eq!(turn_types, vec!["interrupt", "respond", "turn", "turn"]);
    }
}

mod pause_and_failure {
    use super::*;

    fn roster() -> [(&'static str, RoleKind); 4] {
        [
            ("Mara", RoleKind::Mafia),
            ("Milo", RoleKind::Mafia),
            ("Tom", RoleKind::Town),
            ("Tess", RoleKind::Town),
        ]
    }

    #[tokio::test]
    async fn test_pause_before_step_changes_nothing() {
        let service = ScriptedService::new(default_reply);
        let mut runner = build_runner(&roster(), GameRules::default(), service.clone(), RunnerConfig::default());
        step_until(&mut runner, |s| s.current_step == Step::MafiaVote).await;
        let before = snapshot(runner.state());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = runner.execute_one_step(&cancel).await.unwrap_err();

        assert!(matches!(err, EngineError::Paused { step: Step::MafiaVote }));
        assert_eq!(snapshot(runner.state()), before);
        assert!(service.calls("mafia_vote").is_empty());
    }

    #[tokio::test]
    async fn test_pause_during_call_restores_checkpoint() {
        let tripped = Arc::new(AtomicBool::new(false));
        let trip = tripped.clone();
        let service = ScriptedService::new(move |call| {
            if call.label == "mafia_vote" && !trip.swap(true, Ordering::SeqCst) {
                call.cancel.cancel();
                return Err(LlmError::Cancelled);
            }
            default_reply(call)
        });
        let mut runner = build_runner(&roster(), GameRules::default(), service.clone(), RunnerConfig::default());
        step_until(&mut runner, |s| s.current_step == Step::MafiaVote).await;
        let before = snapshot(runner.state());

        let err = runner.execute_one_step(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Paused { step: Step::MafiaVote }));
        assert_eq!(snapshot(runner.state()), before);

        // Resuming with a fresh token repeats the step from scratch.
        let outcome = runner.execute_one_step(&CancellationToken::new()).await.unwrap();
        assert!(matches!(outcome, StepOutcome::Advanced { from: Step::MafiaVote, .. }));
        let night = runner.state().phase_data.night().unwrap();
        assert_eq!(night.mafia_votes.len(), 2);
        assert_eq!(night.mafia_target.as_deref(), Some("Tom"));
    }

    #[tokio::test]
    async fn test_pause_after_calls_discards_step() {
        let service = ScriptedService::new(|call| {
            if call.label == "mafia_discussion" {
                call.cancel.cancel();
            }
            default_reply(call)
        });
        let mut runner = build_runner(&roster(), GameRules::default(), service.clone(), RunnerConfig::default());
        step_until(&mut runner, |s| s.current_step == Step::MafiaDiscussion).await;
        let before = snapshot(runner.state());

        let err = runner.execute_one_step(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, EngineError::Paused { step: Step::MafiaDiscussion }));
        assert_eq!(service.calls("mafia_discussion").len(), 1);
        assert_eq!(snapshot(runner.state()), before);
        assert!(runner
            .state()
            .log
            .snapshot()
            .iter()
            .all(|e| !e.message.starts_with("[Mafia Discussion]")));
    }

    #[tokio::test]
    async fn test_rollback_policy_stalls_on_failure() {
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_discussion" => server_error(),
            _ => default_reply(call),
        });
        let mut runner = build_runner(&roster(), GameRules::default(), service, RunnerConfig::default());
        step_until(&mut runner, |s| s.current_step == Step::MafiaDiscussion).await;
        let before = snapshot(runner.state());

        let err = runner.execute_one_step(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, EngineError::Service { ref player, .. } if player == "Mara"));
        assert_eq!(snapshot(runner.state()), before);
        assert_eq!(runner.state().current_step, Step::MafiaDiscussion);
    }

    #[tokio::test]
    async fn test_abstain_policy_finishes_against_failing_service() {
        // Only the mafia vote ever succeeds.
        let service = ScriptedService::new(|call| match call.label.as_str() {
            "mafia_vote" => default_reply(call),
            _ => server_error(),
        });
        let mut runner = build_runner(
            &[
                ("Mara", RoleKind::Mafia),
                ("Tom", RoleKind::Town),
                ("Tess", RoleKind::Town),
                ("Tina", RoleKind::Town),
            ],
            open_day_rules(),
            service,
            RunnerConfig::default().with_failure_policy(FailurePolicy::Abstain),
        );

        let winner = runner.run_to_completion(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner, Some(Winner::Mafia));

        let state = runner.state();
        let log = messages(state);
        assert!(log.iter().any(|m| m.ends_with("failed to respond.")));
        assert!(log.iter().any(|m| m.starts_with("No one was lynched. Abstain received the most votes")));
        // Every MVP vote failed and was replaced.
        assert_eq!(state.phase_data.name(), "postgame");
        assert!(!state.mvp.is_empty());
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn test_save_and_resume_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let roster = [("Mara", RoleKind::Mafia), ("Tom", RoleKind::Town), ("Tess", RoleKind::Town)];

        let service = ScriptedService::new(default_reply);
        let mut runner = build_runner(&roster, GameRules::default(), service.clone(), RunnerConfig::default());
        step_until(&mut runner, |s| s.current_step == Step::MafiaVote).await;
        std::fs::write(&path, serde_json::to_string_pretty(runner.state()).unwrap()).unwrap();
        let saved_events = runner.state().log.len();
        drop(runner);

        let loaded: GameState = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.current_step, Step::MafiaVote);
        assert_eq!(loaded.log.len(), saved_events);

        let mut resumed = GameRunner::new(loaded, service, EventBus::new(), RunnerConfig::default());
        let winner = resumed.run_to_completion(&CancellationToken::new()).await.unwrap();

        assert_eq!(winner, Some(Winner::Mafia));
        let ids: Vec<u64> = resumed.state().log.snapshot().iter().map(|e| e.id).collect();
        assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
    }
}

mod telemetry {
    use super::*;

    #[tokio::test]
    async fn test_steps_publish_status_events() {
        let bus = EventBus::new();
        let service = ScriptedService::new(default_reply);
        let players = vec![
            Player::new("Mara", "test/model", RoleKind::Mafia),
            Player::new("Tom", "test/model", RoleKind::Town),
            Player::new("Tess", "test/model", RoleKind::Town),
        ];
        let mut runner = GameRunner::new(
            GameState::new(players, GameRules::default()),
            service,
            bus.clone(),
            RunnerConfig::default(),
        );
        let cancel = CancellationToken::new();

        // night_start, then mafia_discussion.
        runner.execute_one_step(&cancel).await.unwrap();
        runner.execute_one_step(&cancel).await.unwrap();

        let recent: Vec<StatusEvent> = bus.recent(100).into_iter().map(|e| e.event).collect();
        assert!(recent.iter().any(|e| matches!(
            e,
            StatusEvent::EventLogged { message, public: true, .. } if message == "Night 1 begins."
        )));
        assert!(recent.iter().any(|e| matches!(
            e,
            StatusEvent::EventLogged { message, public: false, .. } if message == "Mafia night actions begin."
        )));
        assert!(recent.iter().any(|e| matches!(
            e,
            StatusEvent::PlayerStatus { player, label, .. } if player == "Mara" && label == "mafia_discussion"
        )));
        assert!(matches!(
            recent.last(),
            Some(StatusEvent::StateSnapshot { step, .. }) if step == "mafia_vote"
        ));
    }
}
