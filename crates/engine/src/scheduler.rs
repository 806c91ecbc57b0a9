//! Day discussion turn-taking.
//!
//! Round-robin queue with a live poll: each round every eligible player says
//! whether they want to interrupt, respond, or pass, and the scheduler picks
//! exactly one speaker.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// One player's answer to the turn poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub player: String,
    pub wants_to_interrupt: bool,
    pub wants_to_respond: bool,
    pub wants_to_pass: bool,
}

impl PollResponse {
    /// The answer assumed when a player's poll output is unusable.
    pub fn pass(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            wants_to_interrupt: false,
            wants_to_respond: false,
            wants_to_pass: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    Interrupt,
    Respond,
    Queue,
    /// Everyone passed; the head of the queue speaks anyway.
    Forced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub speaker: String,
    pub reason: SelectionReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnScheduler {
    queue: VecDeque<String>,
    last_speaker: Option<String>,
    passed: BTreeSet<String>,
    /// Message number of each player's most recent message.
    last_message_index: BTreeMap<String, usize>,
    suppress_respond: bool,
    message_count: usize,
    max_messages: usize,
}

impl TurnScheduler {
    pub fn new(order: Vec<String>, max_messages: usize) -> Self {
        Self {
            queue: order.into(),
            max_messages,
            ..Default::default()
        }
    }

    /// Players to poll this round, in queue order.
    pub fn eligible(&self, alive: &[String]) -> Vec<String> {
        self.queue
            .iter()
            .filter(|name| alive.contains(name))
            .filter(|name| self.last_speaker.as_ref() != Some(*name))
            .cloned()
            .collect()
    }

    /// Pick the next speaker from this round's poll answers.
    ///
    /// Priority: interrupter, then responder, then the first non-passing
    /// player in queue order, then the head of the queue. Ties between
    /// interrupters (or responders) go to whoever spoke least recently, then
    /// to queue order.
    pub fn select(&mut self, eligible: &[String], responses: &[PollResponse]) -> Option<Selection> {
        if eligible.is_empty() {
            return None;
        }

        let answer = |name: &str| responses.iter().find(|r| r.player == name);

        for response in responses {
            if response.wants_to_pass && eligible.contains(&response.player) {
                self.passed.insert(response.player.clone());
            }
        }

        let interrupters: Vec<&String> = eligible
            .iter()
            .filter(|name| answer(name).is_some_and(|r| r.wants_to_interrupt))
            .collect();
        if let Some(speaker) = self.least_recent(&interrupters) {
            return Some(Selection {
                speaker,
                reason: SelectionReason::Interrupt,
            });
        }

        if !self.suppress_respond {
            let responders: Vec<&String> = eligible
                .iter()
                .filter(|name| answer(name).is_some_and(|r| r.wants_to_respond))
                .collect();
            if let Some(speaker) = self.least_recent(&responders) {
                return Some(Selection {
                    speaker,
                    reason: SelectionReason::Respond,
                });
            }
        }

        if let Some(speaker) = eligible.iter().find(|name| !self.passed.contains(*name)) {
            return Some(Selection {
                speaker: speaker.clone(),
                reason: SelectionReason::Queue,
            });
        }

        Some(Selection {
            speaker: eligible[0].clone(),
            reason: SelectionReason::Forced,
        })
    }

    fn least_recent(&self, candidates: &[&String]) -> Option<String> {
        // min_by_key keeps the first of equal keys, which is queue order.
        candidates
            .iter()
            .min_by_key(|name| self.last_message_index.get(name.as_str()).copied())
            .map(|name| (*name).clone())
    }

    /// Record that `selection` took its turn, successfully or not.
    pub fn record_message(&mut self, selection: &Selection) {
        self.message_count += 1;
        self.last_message_index
            .insert(selection.speaker.clone(), self.message_count);
        self.last_speaker = Some(selection.speaker.clone());
        self.passed.clear();
        self.suppress_respond = selection.reason == SelectionReason::Respond;

        if let Some(pos) = self.queue.iter().position(|n| *n == selection.speaker) {
            if let Some(name) = self.queue.remove(pos) {
                self.queue.push_back(name);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.message_count >= self.max_messages
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn queue(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }

    pub fn passed(&self) -> Vec<String> {
        self.passed.iter().cloned().collect()
    }

    pub fn last_speaker(&self) -> Option<&str> {
        self.last_speaker.as_deref()
    }
}
