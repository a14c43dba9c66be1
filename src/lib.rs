//! # penguin
//!
//! A foraging agent for reinforcement-learning arenas: the penguin eats a
//! fish, carries it back to its baby and regurgitates it, until the food
//! runs out or the step budget does.
//!
//! The agent never touches the world directly. Each lifecycle callback gets
//! a [`host::Host`] bundling the environment, a reward/termination sink and
//! the decision source, so any simulator can drive it.
//!
//! ## Quick Start
//!
//! ```
//! use penguin::prelude::*;
//!
//! let config = RunConfig::default();
//! let mut runner = Runner::new(&config, Box::new(HomingPolicy::new(7)));
//! let summary = runner.run_episodes(1)?;
//! assert_eq!(summary.stats.episodes, 1);
//! # Ok::<(), penguin::error::AgentError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: Run [`batch`] arenas on the rayon thread pool
//!
//! ## Modules
//!
//! - [`agent`]: The foraging state machine
//! - [`host`]: Traits the embedding simulator implements
//! - [`arena`]: A small in-process pond implementing [`host::Environment`]
//! - [`runner`] / [`batch`]: Episode loops
//! - [`demo`]: Recording decisions for imitation learning

#[path = "core/agent.rs"]
pub mod agent;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/storage.rs"]
pub mod storage;

pub mod action;
pub mod arena;
pub mod batch;
pub mod cadence;
pub mod config;
pub mod demo;
pub mod error;
pub mod host;
pub mod observation;
pub mod policy;
pub mod runner;
pub mod stats;

/// Prelude module for convenient imports.
///
/// ```
/// use penguin::prelude::*;
/// ```
pub mod prelude {
    pub use crate::action::{Action, ActionVector, KeyState, Turn, ACTION_SIZE};
    pub use crate::agent::{ForagingAgent, Satiation};
    pub use crate::arena::Arena;
    pub use crate::batch::{run_batch, seeded_configs, BatchOptions};
    pub use crate::cadence::DecisionCadence;
    pub use crate::config::{AgentConfig, ArenaConfig, RunConfig, FEED_RADIUS_PARAM};
    pub use crate::demo::{DemoRecorder, Demonstration};
    pub use crate::error::{AgentError, ConfigError, DemoError};
    pub use crate::host::{
        AgentBehavior, ChannelSink, Contact, Environment, EpisodeEnd, Host, HostEvent, ItemHandle,
        Policy, Pose, Signal, SignalSink, TransientKind,
    };
    pub use crate::observation::{Observation, OBSERVATION_SIZE};
    pub use crate::policy::{HomingPolicy, ManualControl, PolicyKind, RandomPolicy};
    pub use crate::runner::{RunSummary, Runner};
    pub use crate::stats::EpisodeStats;
}
