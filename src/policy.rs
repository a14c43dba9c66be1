//! Baseline decision sources. None of these learn; they exist to drive the
//! agent in demos, benchmarks and recordings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::{ActionVector, KeyState, Turn};
use crate::host::Policy;
use crate::observation::Observation;
use crate::prng::Prng;

/// Uniform random forward amount and turn selector.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: Prng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Prng::new(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, _observation: &Observation) -> ActionVector {
        let forward = self.rng.next_f32_01();
        let turn = self.rng.gen_range_usize(0, 3) as f32;
        [forward, turn]
    }
}

/// Wanders while hungry; steers at the dependent while carrying a fish.
#[derive(Debug, Clone)]
pub struct HomingPolicy {
    rng: Prng,
    wander_turn: Turn,
    // Within this many radians of dead ahead we stop turning.
    aim_tolerance: f32,
}

impl HomingPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Prng::new(seed),
            wander_turn: Turn::None,
            aim_tolerance: 0.15,
        }
    }

    fn wander(&mut self) -> Turn {
        // Keep the current turn for a while so the path curves instead of jittering.
        if self.rng.next_f32_01() < 0.25 {
            self.wander_turn = match self.rng.gen_range_usize(0, 4) {
                0 => Turn::Left,
                1 => Turn::Right,
                _ => Turn::None,
            };
        }
        self.wander_turn
    }
}

impl Policy for HomingPolicy {
    fn decide(&mut self, observation: &Observation) -> ActionVector {
        if !observation.is_full() {
            return [1.0, self.wander().selector()];
        }

        let to_dependent = observation.dependent_direction();
        let forward = observation.forward();
        if to_dependent == glam::Vec3::ZERO {
            return [0.0, Turn::None.selector()];
        }

        // Positive yaw (a right turn) rotates +Z toward +X, so the sign of the
        // vertical component of forward x target picks the side.
        let side = forward.cross(to_dependent).y;
        let angle = forward.angle_between(to_dependent);
        let turn = if angle <= self.aim_tolerance {
            Turn::None
        } else if side >= 0.0 {
            Turn::Right
        } else {
            Turn::Left
        };
        [1.0, turn.selector()]
    }
}

/// Keyboard-style control: the host updates [`KeyState`], or a script of key
/// frames is replayed one frame per decision (looping).
#[derive(Debug, Clone, Default)]
pub struct ManualControl {
    keys: KeyState,
    script: Vec<KeyState>,
    cursor: usize,
}

impl ManualControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames separated by commas, e.g. `"w,w,wa,wd,-"`.
    pub fn scripted(frames: &str) -> Self {
        let script = frames.split(',').map(KeyState::from_keys).collect();
        Self {
            keys: KeyState::default(),
            script,
            cursor: 0,
        }
    }

    pub fn set_keys(&mut self, keys: KeyState) {
        self.keys = keys;
    }

    pub fn keys(&self) -> KeyState {
        self.keys
    }
}

impl Policy for ManualControl {
    fn decide(&mut self, _observation: &Observation) -> ActionVector {
        if !self.script.is_empty() {
            self.keys = self.script[self.cursor % self.script.len()];
            self.cursor = self.cursor.wrapping_add(1);
        }
        self.keys.to_action_vector()
    }
}

/// Which baseline drives an arena in batch and CLI runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Random,
    #[default]
    Homing,
    Manual,
}

impl PolicyKind {
    /// `keys` is only read by [`PolicyKind::Manual`] (see [`ManualControl::scripted`]).
    pub fn build(self, seed: u64, keys: &str) -> Box<dyn Policy + Send> {
        match self {
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Homing => Box::new(HomingPolicy::new(seed)),
            PolicyKind::Manual => Box::new(ManualControl::scripted(keys)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Random => "random",
            PolicyKind::Homing => "homing",
            PolicyKind::Manual => "manual",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(PolicyKind::Random),
            "homing" => Ok(PolicyKind::Homing),
            "manual" => Ok(PolicyKind::Manual),
            other => Err(format!(
                "unknown policy '{other}' (expected random, homing or manual)"
            )),
        }
    }
}
