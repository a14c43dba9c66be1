//! Seams between the agent and whatever runtime hosts it.
//!
//! The host owns the loop, the world and the trainer connection. The agent only
//! sees them through these traits, handed in explicitly on every callback.

use std::sync::mpsc::Sender;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::action::ActionVector;
use crate::error::AgentError;
use crate::observation::Observation;

/// Opaque id of a consumable item owned by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemHandle(pub u32);

/// Short-lived feedback markers spawned when the dependent is fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransientKind {
    RegurgitatedFish,
    Heart,
}

/// Position and heading of a body. Forward is local +Z, up is +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, yaw_degrees: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw_degrees.to_radians()),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// World access the agent needs. Implemented by the host.
pub trait Environment {
    /// Respawn food and entities for a new episode; returns the agent's spawn pose.
    fn reset(&mut self) -> Pose;

    /// `None` if the environment has no dependent entity.
    fn dependent_position(&self) -> Option<Vec3>;

    /// Returns `false` if the item was already gone.
    fn remove_item(&mut self, item: ItemHandle) -> bool;

    fn remaining_items(&self) -> usize;

    fn config_parameter(&self, name: &str, default: f32) -> f32;

    /// `lifetime` is in seconds.
    fn spawn_transient(&mut self, kind: TransientKind, position: Vec3, lifetime: f32);

    /// Move the agent's body toward `to`; returns where it actually ended up.
    fn move_body(&mut self, from: Vec3, to: Vec3) -> Vec3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEnd {
    /// All food was eaten and delivered.
    FoodExhausted,
    /// The step budget ran out.
    StepBudget,
}

impl EpisodeEnd {
    pub fn is_success(self) -> bool {
        matches!(self, EpisodeEnd::FoodExhausted)
    }
}

/// Outbound messages to the training harness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    Reward(f32),
    EndEpisode(EpisodeEnd),
}

pub trait SignalSink {
    fn emit(&mut self, signal: Signal);
}

impl SignalSink for Vec<Signal> {
    fn emit(&mut self, signal: Signal) {
        self.push(signal);
    }
}

/// Forwards signals over an mpsc channel to a trainer thread.
///
/// Once the receiver is gone, signals are dropped; only the first drop is
/// logged at `warn`.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<Signal>,
    closed: bool,
}

impl ChannelSink {
    pub fn new(tx: Sender<Signal>) -> Self {
        Self { tx, closed: false }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl SignalSink for ChannelSink {
    fn emit(&mut self, signal: Signal) {
        if self.tx.send(signal).is_ok() {
            return;
        }
        if self.closed {
            tracing::trace!(?signal, "trainer channel closed; dropping signal");
        } else {
            self.closed = true;
            tracing::warn!(?signal, "trainer channel closed; dropping signals from now on");
        }
    }
}

/// Discards everything. Useful when only the agent's own bookkeeping matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn emit(&mut self, _signal: Signal) {}
}

/// Source of fresh decisions.
pub trait Policy {
    fn decide(&mut self, observation: &Observation) -> ActionVector;
}

impl<F> Policy for F
where
    F: FnMut(&Observation) -> ActionVector,
{
    fn decide(&mut self, observation: &Observation) -> ActionVector {
        self(observation)
    }
}

/// Everything the host lends the agent for the duration of one callback.
pub struct Host<'a> {
    pub env: &'a mut dyn Environment,
    pub signals: &'a mut dyn SignalSink,
    pub policy: &'a mut dyn Policy,
    /// Seconds per fixed tick.
    pub dt: f32,
}

impl<'a> Host<'a> {
    pub fn new(
        env: &'a mut dyn Environment,
        signals: &'a mut dyn SignalSink,
        policy: &'a mut dyn Policy,
        dt: f32,
    ) -> Self {
        Self {
            env,
            signals,
            policy,
            dt,
        }
    }
}

/// What the agent bumped into this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contact {
    Fish(ItemHandle),
    Dependent,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    EpisodeBegin,
    FixedUpdate,
    Collision(Contact),
}

/// Lifecycle callbacks the host drives.
pub trait AgentBehavior {
    fn on_episode_begin(&mut self, host: &mut Host<'_>) -> Result<(), AgentError>;

    fn fixed_update(&mut self, host: &mut Host<'_>) -> Result<(), AgentError>;

    fn on_collision(&mut self, contact: Contact, host: &mut Host<'_>) -> Result<(), AgentError>;

    fn dispatch(&mut self, event: HostEvent, host: &mut Host<'_>) -> Result<(), AgentError> {
        match event {
            HostEvent::EpisodeBegin => self.on_episode_begin(host),
            HostEvent::FixedUpdate => self.fixed_update(host),
            HostEvent::Collision(contact) => self.on_collision(contact, host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn channel_sink_forwards_signals() {
        let (tx, rx) = mpsc::channel::<Signal>();
        let mut sink = ChannelSink::new(tx);
        sink.emit(Signal::Reward(1.0));
        sink.emit(Signal::EndEpisode(EpisodeEnd::FoodExhausted));
        assert!(!sink.is_closed());
        assert_eq!(rx.recv().unwrap(), Signal::Reward(1.0));
        assert_eq!(
            rx.recv().unwrap(),
            Signal::EndEpisode(EpisodeEnd::FoodExhausted)
        );
    }

    #[test]
    fn closed_channel_is_flagged_once_and_keeps_dropping() {
        let (tx, rx) = mpsc::channel::<Signal>();
        let mut sink = ChannelSink::new(tx);
        drop(rx);
        sink.emit(Signal::Reward(-0.1));
        assert!(sink.is_closed());
        for _ in 0..100 {
            sink.emit(Signal::Reward(-0.1));
        }
        assert!(sink.is_closed());
    }

    #[test]
    fn closures_are_policies() {
        let mut calls = 0;
        let mut policy = |_: &Observation| {
            calls += 1;
            [1.0f32, 2.0]
        };
        assert_eq!(policy.decide(&Observation::default()), [1.0, 2.0]);
        drop(policy);
        assert_eq!(calls, 1);
    }
}
