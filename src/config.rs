//! Configuration for the agent, the reference arena and a run.
//!
//! Every struct is `#[serde(default)]`, so a JSON file only needs the fields it
//! wants to override:
//!
//! ```json
//! { "agent": { "move_speed": 6.0 }, "arena": { "fish_count": 6 } }
//! ```

use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the environment parameter the agent reads its feed radius from.
pub const FEED_RADIUS_PARAM: &str = "feed_radius";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Forward speed in units per second at forward amount 1.0.
    pub move_speed: f32,
    /// Turn rate in degrees per second.
    pub turn_speed: f32,
    /// Step budget per episode; 0 disables both the budget and the step penalty.
    pub max_steps: u32,
    /// Ask the policy for a fresh action every this many steps.
    pub decision_period: u32,
    /// Seconds a regurgitated fish / heart marker stays alive.
    pub transient_lifetime: f32,
    /// Height of the heart marker above the dependent entity.
    pub heart_height: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            turn_speed: 180.0,
            max_steps: 3000,
            decision_period: 4,
            transient_lifetime: 4.0,
            heart_height: 1.5,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.move_speed.is_finite() || self.move_speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "agent.move_speed must be >= 0, got {}",
                self.move_speed
            )));
        }
        if !self.turn_speed.is_finite() || self.turn_speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "agent.turn_speed must be >= 0, got {}",
                self.turn_speed
            )));
        }
        if self.decision_period == 0 {
            return Err(ConfigError::Invalid(
                "agent.decision_period must be >= 1".to_string(),
            ));
        }
        if !self.transient_lifetime.is_finite() || self.transient_lifetime < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "agent.transient_lifetime must be >= 0, got {}",
                self.transient_lifetime
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Radius of the circular play area around the origin.
    pub radius: f32,
    pub fish_count: u32,
    /// Centre distance at which the agent touches a fish or the baby.
    pub contact_radius: f32,
    /// Keep spawned fish and the baby at least this far from the agent's start.
    pub spawn_clearance: f32,
    pub seed: u64,
    /// Environment parameters the agent can look up by name (e.g. `feed_radius`).
    pub parameters: HashMap<String, f32>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            fish_count: 4,
            contact_radius: 1.0,
            spawn_clearance: 2.0,
            seed: 2026,
            parameters: HashMap::new(),
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "arena.radius must be > 0, got {}",
                self.radius
            )));
        }
        if !self.contact_radius.is_finite() || self.contact_radius < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "arena.contact_radius must be >= 0, got {}",
                self.contact_radius
            )));
        }
        if self.spawn_clearance >= self.radius {
            return Err(ConfigError::Invalid(format!(
                "arena.spawn_clearance ({}) must be smaller than arena.radius ({})",
                self.spawn_clearance, self.radius
            )));
        }
        Ok(())
    }

    pub fn with_parameter(mut self, name: &str, value: f32) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub agent: AgentConfig,
    pub arena: ArenaConfig,
    /// Seconds per physics tick.
    pub fixed_dt: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            arena: ArenaConfig::default(),
            fixed_dt: 0.02,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.validate()?;
        self.arena.validate()?;
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_dt must be > 0, got {}",
                self.fixed_dt
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = RunConfig::from_json_str(r#"{ "agent": { "move_speed": 6.5 } }"#).unwrap();
        assert_eq!(cfg.agent.move_speed, 6.5);
        assert_eq!(cfg.agent.turn_speed, 180.0);
        assert_eq!(cfg.agent.decision_period, 4);
        assert_eq!(cfg.arena, ArenaConfig::default());
        assert_eq!(cfg.fixed_dt, 0.02);
    }

    #[test]
    fn parameters_parse_from_json() {
        let cfg =
            RunConfig::from_json_str(r#"{ "arena": { "parameters": { "feed_radius": 2.5 } } }"#)
                .unwrap();
        assert_eq!(cfg.arena.parameters.get(FEED_RADIUS_PARAM), Some(&2.5));
    }

    #[test]
    fn zero_decision_period_is_rejected() {
        let err = RunConfig::from_json_str(r#"{ "agent": { "decision_period": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = RunConfig::from_json_str("{ agent: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RunConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
