//! The foraging agent: eat one fish, carry it to the dependent, repeat.
//!
//! State machine per episode:
//!
//! ```text
//! Hungry --(touch fish)--> Satiated --(reach dependent)--> Hungry (+1, maybe terminal)
//! ```
//!
//! All world access goes through the [`Host`] passed to each callback; the
//! agent itself only owns its pose and per-episode bookkeeping.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::Action;
use crate::cadence::DecisionCadence;
use crate::config::{AgentConfig, FEED_RADIUS_PARAM};
use crate::error::AgentError;
use crate::host::{
    AgentBehavior, Contact, Environment, EpisodeEnd, Host, ItemHandle, Pose, Signal, SignalSink,
    TransientKind,
};
use crate::observation::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Satiation {
    #[default]
    Hungry,
    Satiated,
}

#[derive(Debug, Clone)]
pub struct ForagingAgent {
    config: AgentConfig,
    cadence: DecisionCadence,

    pose: Pose,
    satiation: Satiation,
    feed_radius: f32,

    step_count: u32,
    cumulative_reward: f32,
    last_action: Action,
    // Set on decision steps; drained by whoever records demonstrations.
    pending_decision: Option<(Observation, Action)>,

    bound: bool,
    ended: Option<EpisodeEnd>,
    episodes_begun: u32,
}

impl ForagingAgent {
    pub fn new(config: AgentConfig) -> Self {
        let cadence = DecisionCadence::new(config.decision_period);
        Self {
            config,
            cadence,
            pose: Pose::default(),
            satiation: Satiation::Hungry,
            feed_radius: 0.0,
            step_count: 0,
            cumulative_reward: 0.0,
            last_action: Action::default(),
            pending_decision: None,
            bound: false,
            ended: None,
            episodes_begun: 0,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn cadence(&self) -> DecisionCadence {
        self.cadence
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn forward(&self) -> Vec3 {
        self.pose.forward()
    }

    pub fn satiation(&self) -> Satiation {
        self.satiation
    }

    pub fn is_full(&self) -> bool {
        self.satiation == Satiation::Satiated
    }

    pub fn feed_radius(&self) -> f32 {
        self.feed_radius
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    pub fn last_action(&self) -> Action {
        self.last_action
    }

    /// Why the current episode ended, if it has.
    pub fn episode_end(&self) -> Option<EpisodeEnd> {
        self.ended
    }

    pub fn episodes_begun(&self) -> u32 {
        self.episodes_begun
    }

    /// `true` once the step budget is used up (never with `max_steps == 0`).
    pub fn step_budget_exhausted(&self) -> bool {
        self.config.max_steps > 0 && self.step_count >= self.config.max_steps
    }

    /// Observation and decoded action from the most recent decision step, once.
    pub fn take_decision(&mut self) -> Option<(Observation, Action)> {
        self.pending_decision.take()
    }

    pub fn collect_observations(&self, env: &dyn Environment) -> Result<Observation, AgentError> {
        let dependent = env
            .dependent_position()
            .ok_or(AgentError::MissingDependent)?;
        Ok(Observation::new(
            self.is_full(),
            self.pose.position,
            self.pose.forward(),
            dependent,
        ))
    }

    /// Move and turn according to `action`, then charge the per-step penalty.
    pub fn on_action_received(
        &mut self,
        action: Action,
        host: &mut Host<'_>,
    ) -> Result<(), AgentError> {
        self.ensure_bound()?;
        if self.ended.is_some() {
            return Ok(());
        }

        let from = self.pose.position;
        let to = from + self.pose.forward() * (action.forward * self.config.move_speed * host.dt);
        self.pose.position = host.env.move_body(from, to);

        let yaw = action.turn.direction() * self.config.turn_speed * host.dt;
        if yaw != 0.0 {
            self.pose.rotation =
                (self.pose.rotation * Quat::from_rotation_y(yaw.to_radians())).normalize();
        }

        if self.config.max_steps > 0 {
            self.add_reward(-1.0 / self.config.max_steps as f32, host.signals);
        }
        Ok(())
    }

    /// Returns whether the fish was actually eaten.
    pub fn eat_fish(&mut self, item: ItemHandle, host: &mut Host<'_>) -> Result<bool, AgentError> {
        self.ensure_bound()?;
        if self.ended.is_some() || self.is_full() {
            return Ok(false);
        }
        if !host.env.remove_item(item) {
            debug!(?item, "fish already gone");
            return Ok(false);
        }

        self.satiation = Satiation::Satiated;
        self.add_reward(1.0, host.signals);
        debug!(?item, step = self.step_count, "ate fish");
        Ok(true)
    }

    /// Returns whether the dependent was actually fed.
    pub fn regurgitate(&mut self, host: &mut Host<'_>) -> Result<bool, AgentError> {
        self.ensure_bound()?;
        if self.ended.is_some() || !self.is_full() {
            return Ok(false);
        }
        let dependent = host
            .env
            .dependent_position()
            .ok_or(AgentError::MissingDependent)?;

        self.satiation = Satiation::Hungry;

        let lifetime = self.config.transient_lifetime;
        host.env
            .spawn_transient(TransientKind::RegurgitatedFish, dependent, lifetime);
        host.env.spawn_transient(
            TransientKind::Heart,
            dependent + Vec3::Y * self.config.heart_height,
            lifetime,
        );

        self.add_reward(1.0, host.signals);
        let remaining = host.env.remaining_items();
        debug!(step = self.step_count, remaining, "fed dependent");

        if remaining == 0 {
            self.end_episode(EpisodeEnd::FoodExhausted, host.signals);
        }
        Ok(true)
    }

    /// Request termination. Later events are ignored until the next episode begins.
    pub fn end_episode(&mut self, reason: EpisodeEnd, signals: &mut dyn SignalSink) {
        if self.ended.is_some() {
            return;
        }
        self.ended = Some(reason);
        signals.emit(Signal::EndEpisode(reason));
        info!(
            episode = self.episodes_begun,
            ?reason,
            steps = self.step_count,
            reward = self.cumulative_reward,
            "episode end"
        );
    }

    fn add_reward(&mut self, delta: f32, signals: &mut dyn SignalSink) {
        self.cumulative_reward += delta;
        signals.emit(Signal::Reward(delta));
    }

    fn ensure_bound(&self) -> Result<(), AgentError> {
        if self.bound {
            Ok(())
        } else {
            Err(AgentError::EpisodeNotStarted)
        }
    }
}

impl AgentBehavior for ForagingAgent {
    fn on_episode_begin(&mut self, host: &mut Host<'_>) -> Result<(), AgentError> {
        self.pose = host.env.reset();
        if host.env.dependent_position().is_none() {
            self.bound = false;
            return Err(AgentError::MissingDependent);
        }

        self.bound = true;
        self.satiation = Satiation::Hungry;
        self.step_count = 0;
        self.cumulative_reward = 0.0;
        self.last_action = Action::default();
        self.pending_decision = None;
        self.ended = None;
        self.feed_radius = host.env.config_parameter(FEED_RADIUS_PARAM, 0.0);
        self.episodes_begun = self.episodes_begun.wrapping_add(1);

        info!(
            episode = self.episodes_begun,
            feed_radius = self.feed_radius,
            food = host.env.remaining_items(),
            "episode begin"
        );
        Ok(())
    }

    fn fixed_update(&mut self, host: &mut Host<'_>) -> Result<(), AgentError> {
        self.ensure_bound()?;
        if self.ended.is_some() {
            return Ok(());
        }
        // Checked before any state changes.
        let dependent = host
            .env
            .dependent_position()
            .ok_or(AgentError::MissingDependent)?;

        let action = if self.cadence.is_decision_step(self.step_count) {
            let observation = Observation::new(
                self.is_full(),
                self.pose.position,
                self.pose.forward(),
                dependent,
            );
            let action = Action::decode(host.policy.decide(&observation));
            self.last_action = action;
            self.pending_decision = Some((observation, action));
            action
        } else {
            self.last_action
        };

        self.on_action_received(action, host)?;
        self.step_count = self.step_count.saturating_add(1);

        if self.pose.position.distance(dependent) < self.feed_radius {
            self.regurgitate(host)?;
        }
        Ok(())
    }

    fn on_collision(&mut self, contact: Contact, host: &mut Host<'_>) -> Result<(), AgentError> {
        match contact {
            Contact::Fish(item) => self.eat_fish(item, host).map(|_| ()),
            Contact::Dependent => self.regurgitate(host).map(|_| ()),
            Contact::Other => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionVector, Turn};
    use crate::host::NullSink;

    /// Bare environment: a dependent at a fixed spot and a list of fish ids.
    struct Pond {
        dependent: Option<Vec3>,
        fish: Vec<ItemHandle>,
        feed_radius: Option<f32>,
        transients: Vec<(TransientKind, Vec3, f32)>,
        resets: u32,
    }

    impl Pond {
        fn new(dependent: Vec3, fish: u32) -> Self {
            Self {
                dependent: Some(dependent),
                fish: (0..fish).map(ItemHandle).collect(),
                feed_radius: None,
                transients: Vec::new(),
                resets: 0,
            }
        }
    }

    impl Environment for Pond {
        fn reset(&mut self) -> Pose {
            self.resets += 1;
            Pose::default()
        }

        fn dependent_position(&self) -> Option<Vec3> {
            self.dependent
        }

        fn remove_item(&mut self, item: ItemHandle) -> bool {
            let before = self.fish.len();
            self.fish.retain(|f| *f != item);
            self.fish.len() != before
        }

        fn remaining_items(&self) -> usize {
            self.fish.len()
        }

        fn config_parameter(&self, name: &str, default: f32) -> f32 {
            match name {
                FEED_RADIUS_PARAM => self.feed_radius.unwrap_or(default),
                _ => default,
            }
        }

        fn spawn_transient(&mut self, kind: TransientKind, position: Vec3, lifetime: f32) {
            self.transients.push((kind, position, lifetime));
        }

        fn move_body(&mut self, _from: Vec3, to: Vec3) -> Vec3 {
            to
        }
    }

    fn idle(_: &Observation) -> ActionVector {
        [0.0, 0.0]
    }

    fn rewards(signals: &[Signal]) -> f32 {
        signals
            .iter()
            .map(|s| match s {
                Signal::Reward(r) => *r,
                Signal::EndEpisode(_) => 0.0,
            })
            .sum()
    }

    fn begun(pond: &mut Pond, config: AgentConfig) -> ForagingAgent {
        let mut agent = ForagingAgent::new(config);
        let mut policy = idle;
        let mut sink = NullSink;
        let mut host = Host::new(pond, &mut sink, &mut policy, 0.02);
        agent.on_episode_begin(&mut host).unwrap();
        agent
    }

    #[test]
    fn episode_begin_resets_state_and_reads_feed_radius() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 2);
        pond.feed_radius = Some(2.0);
        let agent = begun(&mut pond, AgentConfig::default());

        assert_eq!(pond.resets, 1);
        assert_eq!(agent.satiation(), Satiation::Hungry);
        assert_eq!(agent.feed_radius(), 2.0);
        assert_eq!(agent.step_count(), 0);
        assert_eq!(agent.episodes_begun(), 1);
    }

    #[test]
    fn feed_radius_defaults_to_zero() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 2);
        let agent = begun(&mut pond, AgentConfig::default());
        assert_eq!(agent.feed_radius(), 0.0);
    }

    #[test]
    fn missing_dependent_is_fatal() {
        let mut pond = Pond::new(Vec3::ZERO, 1);
        pond.dependent = None;
        let mut agent = ForagingAgent::new(AgentConfig::default());
        let mut policy = idle;
        let mut sink = NullSink;
        let mut host = Host::new(&mut pond, &mut sink, &mut policy, 0.02);
        assert_eq!(
            agent.on_episode_begin(&mut host),
            Err(AgentError::MissingDependent)
        );
        assert_eq!(
            agent.fixed_update(&mut host),
            Err(AgentError::EpisodeNotStarted)
        );
    }

    #[test]
    fn callbacks_before_episode_begin_are_rejected() {
        let mut pond = Pond::new(Vec3::ZERO, 1);
        let mut agent = ForagingAgent::new(AgentConfig::default());
        let mut policy = idle;
        let mut sink = NullSink;
        let mut host = Host::new(&mut pond, &mut sink, &mut policy, 0.02);
        assert_eq!(
            agent.on_collision(Contact::Fish(ItemHandle(0)), &mut host),
            Err(AgentError::EpisodeNotStarted)
        );
    }

    #[test]
    fn eating_while_full_is_a_noop() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 3);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);

        assert!(agent.eat_fish(ItemHandle(0), &mut host).unwrap());
        assert!(!agent.eat_fish(ItemHandle(1), &mut host).unwrap());
        drop(host);

        assert!(agent.is_full());
        assert_eq!(rewards(&signals), 1.0);
        assert_eq!(pond.fish, vec![ItemHandle(1), ItemHandle(2)]);
    }

    #[test]
    fn feeding_while_hungry_is_a_noop() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);

        agent.on_collision(Contact::Dependent, &mut host).unwrap();
        drop(host);

        assert!(signals.is_empty());
        assert!(pond.transients.is_empty());
    }

    #[test]
    fn feeding_spawns_markers_and_rewards() {
        let baby = Vec3::new(0.0, 0.0, 10.0);
        let mut pond = Pond::new(baby, 2);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);

        agent.on_collision(Contact::Fish(ItemHandle(0)), &mut host).unwrap();
        agent.on_collision(Contact::Dependent, &mut host).unwrap();
        drop(host);

        assert!(!agent.is_full());
        assert_eq!(rewards(&signals), 2.0);
        assert_eq!(agent.episode_end(), None);
        assert_eq!(
            pond.transients,
            vec![
                (TransientKind::RegurgitatedFish, baby, 4.0),
                (TransientKind::Heart, baby + Vec3::new(0.0, 1.5, 0.0), 4.0),
            ]
        );
    }

    #[test]
    fn last_delivery_ends_the_episode() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);

        agent.on_collision(Contact::Fish(ItemHandle(0)), &mut host).unwrap();
        agent.on_collision(Contact::Dependent, &mut host).unwrap();
        // Ignored after termination.
        agent.on_collision(Contact::Dependent, &mut host).unwrap();
        drop(host);

        assert_eq!(agent.episode_end(), Some(EpisodeEnd::FoodExhausted));
        assert_eq!(
            signals,
            vec![
                Signal::Reward(1.0),
                Signal::Reward(1.0),
                Signal::EndEpisode(EpisodeEnd::FoodExhausted),
            ]
        );
    }

    #[test]
    fn actions_after_the_episode_ends_are_ignored() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);

        agent.on_collision(Contact::Fish(ItemHandle(0)), &mut host).unwrap();
        agent.on_collision(Contact::Dependent, &mut host).unwrap();
        let pose = agent.pose();
        let reward = agent.cumulative_reward();

        agent
            .on_action_received(Action::new(1.0, Turn::Right), &mut host)
            .unwrap();
        drop(host);

        assert_eq!(agent.pose(), pose);
        assert_eq!(agent.cumulative_reward(), reward);
        assert_eq!(
            signals.last(),
            Some(&Signal::EndEpisode(EpisodeEnd::FoodExhausted))
        );
    }

    #[test]
    fn vanished_dependent_leaves_the_tick_untouched() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = |_: &Observation| [1.0f32, 0.0];
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);
        agent.fixed_update(&mut host).unwrap();
        drop(host);

        pond.dependent = None;
        let pose = agent.pose();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);
        // Step 1 repeats the held action, no decision needed.
        assert_eq!(
            agent.fixed_update(&mut host),
            Err(AgentError::MissingDependent)
        );
        drop(host);

        assert_eq!(agent.step_count(), 1);
        assert_eq!(agent.pose(), pose);
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn proximity_feeds_within_radius_only() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 2);
        pond.feed_radius = Some(2.0);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);

        agent.on_collision(Contact::Fish(ItemHandle(0)), &mut host).unwrap();
        agent.fixed_update(&mut host).unwrap();
        // Distance 10 > radius 2: still carrying.
        assert!(agent.is_full());

        agent.pose.position = Vec3::new(0.0, 0.0, 8.5);
        agent.fixed_update(&mut host).unwrap();
        assert!(!agent.is_full());
    }

    #[test]
    fn movement_follows_heading_and_turns() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let config = AgentConfig {
            decision_period: 1,
            ..AgentConfig::default()
        };
        let mut agent = begun(&mut pond, config);
        let mut policy = |_: &Observation| [1.0f32, 2.0];
        let mut sink = NullSink;
        let mut host = Host::new(&mut pond, &mut sink, &mut policy, 0.5);

        agent.fixed_update(&mut host).unwrap();
        // 1.0 * 5.0 * 0.5 along +Z, then a 90 degree right turn.
        assert!((agent.position() - Vec3::new(0.0, 0.0, 2.5)).length() < 1.0e-5);
        assert!((agent.forward() - Vec3::X).length() < 1.0e-5);

        agent.fixed_update(&mut host).unwrap();
        assert!((agent.position() - Vec3::new(2.5, 0.0, 2.5)).length() < 1.0e-5);
    }

    #[test]
    fn decisions_follow_the_cadence() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut decisions = Vec::new();
        let mut policy = |obs: &Observation| {
            decisions.push(obs.dependent_distance());
            [0.0f32, 1.0]
        };
        let mut sink = NullSink;
        let mut host = Host::new(&mut pond, &mut sink, &mut policy, 0.02);

        let mut decided_at = Vec::new();
        for step in 0..12 {
            agent.fixed_update(&mut host).unwrap();
            if agent.take_decision().is_some() {
                decided_at.push(step);
            }
            assert_eq!(agent.last_action(), Action::new(0.0, Turn::Left));
        }
        drop(host);

        assert_eq!(decided_at, vec![0, 4, 8]);
        assert_eq!(decisions.len(), 3);
    }

    #[test]
    fn step_penalty_sums_to_minus_one_over_budget() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 1.0e6), 1);
        let mut agent = begun(&mut pond, AgentConfig::default());
        let mut policy = |_: &Observation| [1.0f32, 0.0];
        let mut sink = NullSink;
        let mut host = Host::new(&mut pond, &mut sink, &mut policy, 0.02);

        for _ in 0..3000 {
            agent.fixed_update(&mut host).unwrap();
        }
        assert!((agent.cumulative_reward() + 1.0).abs() < 1.0e-3);
        assert!(agent.step_budget_exhausted());
    }

    #[test]
    fn zero_budget_means_no_penalty() {
        let mut pond = Pond::new(Vec3::new(0.0, 0.0, 10.0), 1);
        let config = AgentConfig {
            max_steps: 0,
            ..AgentConfig::default()
        };
        let mut agent = begun(&mut pond, config);
        let mut policy = idle;
        let mut signals = Vec::new();
        let mut host = Host::new(&mut pond, &mut signals, &mut policy, 0.02);
        for _ in 0..10 {
            agent.fixed_update(&mut host).unwrap();
        }
        drop(host);
        assert!(signals.is_empty());
        assert!(!agent.step_budget_exhausted());
    }
}
