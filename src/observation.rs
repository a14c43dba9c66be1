use glam::Vec3;
use serde::{Deserialize, Serialize};

pub const OBSERVATION_SIZE: usize = 8;

/// The agent's view of the world, in a fixed order:
///
/// | index | value                                  |
/// |-------|----------------------------------------|
/// | 0     | satiation (0 or 1)                     |
/// | 1     | distance to the dependent entity       |
/// | 2..5  | unit direction to the dependent entity |
/// | 5..8  | agent forward vector                   |
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation([f32; OBSERVATION_SIZE]);

impl Observation {
    pub fn new(is_full: bool, agent_position: Vec3, forward: Vec3, dependent: Vec3) -> Self {
        let offset = dependent - agent_position;
        let dir = offset.normalize_or_zero();
        Self([
            if is_full { 1.0 } else { 0.0 },
            offset.length(),
            dir.x,
            dir.y,
            dir.z,
            forward.x,
            forward.y,
            forward.z,
        ])
    }

    pub fn from_array(values: [f32; OBSERVATION_SIZE]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_array(self) -> [f32; OBSERVATION_SIZE] {
        self.0
    }

    pub fn is_full(&self) -> bool {
        self.0[0] != 0.0
    }

    pub fn dependent_distance(&self) -> f32 {
        self.0[1]
    }

    pub fn dependent_direction(&self) -> Vec3 {
        Vec3::new(self.0[2], self.0[3], self.0[4])
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.0[5], self.0[6], self.0[7])
    }
}
