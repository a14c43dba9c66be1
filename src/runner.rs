//! Drives one arena, one agent and one policy through fixed ticks.
//!
//! Per tick: `fixed_update`, newly entered contacts, transient ageing, then
//! termination (food exhausted or step budget). A finished episode is folded
//! into [`EpisodeStats`] and the next tick begins a fresh one.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace};

use crate::agent::ForagingAgent;
use crate::arena::Arena;
use crate::config::RunConfig;
use crate::demo::{DemoRecorder, Demonstration};
use crate::error::AgentError;
use crate::host::{AgentBehavior, Environment, EpisodeEnd, Host, Policy, Signal};
use crate::stats::EpisodeStats;

/// Tick cap for configs without a step budget (`max_steps == 0`).
pub const UNBOUNDED_EPISODE_CAP: u32 = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub stats: EpisodeStats,
}

pub struct Runner {
    arena: Arena,
    agent: ForagingAgent,
    policy: Box<dyn Policy + Send>,
    signals: Vec<Signal>,
    dt: f32,

    stats: EpisodeStats,
    recorder: Option<DemoRecorder>,

    in_episode: bool,
    fish_at_start: usize,
}

impl Runner {
    pub fn new(config: &RunConfig, policy: Box<dyn Policy + Send>) -> Self {
        Self {
            arena: Arena::new(config.arena.clone()),
            agent: ForagingAgent::new(config.agent.clone()),
            policy,
            signals: Vec::new(),
            dt: config.fixed_dt,
            stats: EpisodeStats::new(),
            recorder: None,
            in_episode: false,
            fish_at_start: 0,
        }
    }

    /// Record every decision from now on.
    pub fn with_recorder(mut self, name: &str) -> Self {
        let period = self.agent.cadence().period();
        self.recorder = Some(DemoRecorder::new(name, period));
        self
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn agent(&self) -> &ForagingAgent {
        &self.agent
    }

    pub fn stats(&self) -> &EpisodeStats {
        &self.stats
    }

    pub fn in_episode(&self) -> bool {
        self.in_episode
    }

    /// Reset the arena and start a new episode.
    pub fn begin(&mut self) -> Result<(), AgentError> {
        self.signals.clear();
        let mut host = Host::new(
            &mut self.arena,
            &mut self.signals,
            &mut *self.policy,
            self.dt,
        );
        self.agent.on_episode_begin(&mut host)?;
        self.fish_at_start = self.arena.remaining_items();
        self.in_episode = true;
        Ok(())
    }

    /// Advance one fixed tick; returns the end reason if the episode finished.
    pub fn tick(&mut self) -> Result<Option<EpisodeEnd>, AgentError> {
        if !self.in_episode {
            self.begin()?;
        }

        {
            let mut host = Host::new(
                &mut self.arena,
                &mut self.signals,
                &mut *self.policy,
                self.dt,
            );
            self.agent.fixed_update(&mut host)?;
        }
        if let Some((observation, action)) = self.agent.take_decision() {
            if let Some(rec) = self.recorder.as_mut() {
                rec.record_decision(observation, action);
            }
        }

        let contacts = self.arena.contacts(self.agent.position());
        for contact in contacts {
            let mut host = Host::new(
                &mut self.arena,
                &mut self.signals,
                &mut *self.policy,
                self.dt,
            );
            self.agent.on_collision(contact, &mut host)?;
        }

        self.arena.advance(self.dt);

        if self.agent.episode_end().is_none() {
            let capped = self.agent.config().max_steps == 0
                && self.agent.step_count() >= UNBOUNDED_EPISODE_CAP;
            if self.agent.step_budget_exhausted() || capped {
                self.agent
                    .end_episode(EpisodeEnd::StepBudget, &mut self.signals);
            }
        }

        self.drain_signals();

        match self.agent.episode_end() {
            Some(end) => {
                self.finish_episode(end);
                Ok(Some(end))
            }
            None => Ok(None),
        }
    }

    /// Tick until the current (or next) episode ends.
    pub fn run_episode(&mut self) -> Result<EpisodeEnd, AgentError> {
        let span = info_span!("episode", n = self.stats.episodes + 1);
        let _enter = span.enter();
        loop {
            if let Some(end) = self.tick()? {
                return Ok(end);
            }
        }
    }

    pub fn run_episodes(&mut self, episodes: u32) -> Result<RunSummary, AgentError> {
        for _ in 0..episodes {
            self.run_episode()?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.arena.config().seed,
            stats: self.stats.clone(),
        }
    }

    /// Hand over the recording so far, if recording was enabled.
    pub fn take_demonstration(&mut self) -> Option<Demonstration> {
        self.recorder.take().map(DemoRecorder::finish)
    }

    fn drain_signals(&mut self) {
        for signal in self.signals.drain(..) {
            trace!(?signal, "signal");
            if let (Signal::Reward(r), Some(rec)) = (signal, self.recorder.as_mut()) {
                rec.add_reward(r);
            }
        }
    }

    fn finish_episode(&mut self, end: EpisodeEnd) {
        let eaten = self
            .fish_at_start
            .saturating_sub(self.arena.remaining_items());
        let delivered = eaten.saturating_sub(usize::from(self.agent.is_full())) as u32;

        self.stats.record_episode(
            end,
            self.agent.cumulative_reward(),
            self.agent.step_count(),
            delivered,
        );
        if let Some(rec) = self.recorder.as_mut() {
            rec.mark_episode_end();
        }
        debug!(
            episodes = self.stats.episodes,
            success_rate = self.stats.success_rate(),
            delivered,
            "episode recorded"
        );
        self.in_episode = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, ArenaConfig};
    use crate::observation::Observation;
    use crate::policy::HomingPolicy;

    fn config(max_steps: u32) -> RunConfig {
        RunConfig {
            agent: AgentConfig {
                max_steps,
                ..AgentConfig::default()
            },
            arena: ArenaConfig::default(),
            fixed_dt: 0.02,
        }
    }

    fn still(_: &Observation) -> [f32; 2] {
        [0.0, 0.0]
    }

    #[test]
    fn step_budget_ends_the_episode() {
        let mut runner = Runner::new(&config(50), Box::new(still));
        let end = runner.run_episode().unwrap();
        assert_eq!(end, EpisodeEnd::StepBudget);
        assert_eq!(runner.agent().step_count(), 50);
        assert!(!runner.in_episode());
        assert!((runner.agent().cumulative_reward() + 1.0).abs() < 1.0e-4);
    }

    #[test]
    fn next_tick_starts_a_new_episode() {
        let mut runner = Runner::new(&config(10), Box::new(still));
        runner.run_episode().unwrap();
        runner.tick().unwrap();
        assert!(runner.in_episode());
        assert_eq!(runner.agent().episodes_begun(), 2);
        assert_eq!(runner.arena().resets(), 2);
    }

    #[test]
    fn summary_counts_every_episode() {
        let mut runner = Runner::new(&config(20), Box::new(still));
        let summary = runner.run_episodes(3).unwrap();
        assert_eq!(summary.seed, 2026);
        assert_eq!(summary.stats.episodes, 3);
        assert_eq!(summary.stats.timeouts, 3);
        assert_eq!(summary.stats.total_steps, 60);
    }

    #[test]
    fn recording_captures_one_step_per_decision() {
        let mut runner =
            Runner::new(&config(40), Box::new(HomingPolicy::new(3))).with_recorder("t");
        runner.run_episode().unwrap();
        let demo = runner.take_demonstration().unwrap();
        assert_eq!(demo.steps.len(), 10);
        assert_eq!(demo.meta.episodes, 1);
        assert!(demo.steps.last().unwrap().done);
        assert!((demo.total_reward() - runner.agent().cumulative_reward()).abs() < 1.0e-4);
    }

    #[test]
    fn missing_dependent_surfaces_from_tick() {
        let mut runner = Runner::new(&config(10), Box::new(still));
        runner.begin().unwrap();
        runner.arena_mut().set_dependent(None);
        assert_eq!(runner.tick(), Err(AgentError::MissingDependent));
    }
}
