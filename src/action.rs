//! Action encoding shared by trained policies and manual control.
//!
//! The raw vector is two floats:
//! - `[0]` forward amount (scaled by `move_speed`)
//! - `[1]` turn selector: `0` none, `1` left, `2` right

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

pub const ACTION_SIZE: usize = 2;

/// Raw action as produced by a policy.
pub type ActionVector = [f32; ACTION_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Turn {
    #[default]
    None,
    Left,
    Right,
}

impl Turn {
    /// Unknown selectors decode as `None`.
    pub fn from_selector(v: f32) -> Self {
        if v == 1.0 {
            Turn::Left
        } else if v == 2.0 {
            Turn::Right
        } else {
            Turn::None
        }
    }

    pub fn selector(self) -> f32 {
        match self {
            Turn::None => 0.0,
            Turn::Left => 1.0,
            Turn::Right => 2.0,
        }
    }

    /// Sign of the yaw change; left is negative yaw.
    pub fn direction(self) -> f32 {
        match self {
            Turn::None => 0.0,
            Turn::Left => -1.0,
            Turn::Right => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Turn::None => "none",
            Turn::Left => "left",
            Turn::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub forward: f32,
    pub turn: Turn,
}

impl Action {
    pub fn new(forward: f32, turn: Turn) -> Self {
        Self { forward, turn }
    }

    pub fn decode(raw: ActionVector) -> Self {
        Self {
            forward: raw[0],
            turn: Turn::from_selector(raw[1]),
        }
    }

    /// Decode an action coming from outside the crate (e.g. a trainer bridge).
    ///
    /// Extra trailing values are ignored; too few is an error.
    pub fn from_slice(raw: &[f32]) -> Result<Self, AgentError> {
        match raw {
            [forward, turn, ..] => Ok(Self::decode([*forward, *turn])),
            _ => Err(AgentError::ActionArity {
                expected: ACTION_SIZE,
                got: raw.len(),
            }),
        }
    }

    pub fn encode(self) -> ActionVector {
        [self.forward, self.turn.selector()]
    }
}

/// Directional key state for the manual control path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyState {
    pub forward: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyState {
    /// Parse a compact key frame such as `"wa"`: `w` forward, `a` left, `d` right.
    /// Other characters are ignored so `"-"` or `""` mean "nothing held".
    pub fn from_keys(keys: &str) -> Self {
        let mut state = KeyState::default();
        for c in keys.chars() {
            match c.to_ascii_lowercase() {
                'w' => state.forward = true,
                'a' => state.left = true,
                'd' => state.right = true,
                _ => {}
            }
        }
        state
    }

    /// Map held keys onto the policy encoding. Left wins if both turn keys are held.
    pub fn to_action_vector(self) -> ActionVector {
        let forward = if self.forward { 1.0 } else { 0.0 };
        let turn = if self.left {
            Turn::Left
        } else if self.right {
            Turn::Right
        } else {
            Turn::None
        };
        [forward, turn.selector()]
    }
}
