//! Independent arenas run side by side.
//!
//! With the `parallel` feature each config runs on the rayon pool; otherwise
//! they run one after another. Each run owns its arena, agent and policy.

use crate::config::RunConfig;
use crate::error::AgentError;
use crate::policy::PolicyKind;
use crate::runner::{RunSummary, Runner};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub episodes: u32,
    pub policy: PolicyKind,
    /// Key script for [`PolicyKind::Manual`].
    pub keys: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            episodes: 10,
            policy: PolicyKind::Homing,
            keys: String::new(),
        }
    }
}

/// `count` copies of `base` with consecutive arena seeds.
pub fn seeded_configs(base: &RunConfig, count: usize) -> Vec<RunConfig> {
    (0..count)
        .map(|i| {
            let mut cfg = base.clone();
            cfg.arena.seed = base.arena.seed.wrapping_add(i as u64);
            cfg
        })
        .collect()
}

pub fn run_one(config: &RunConfig, options: &BatchOptions) -> Result<RunSummary, AgentError> {
    let policy = options.policy.build(config.arena.seed, &options.keys);
    Runner::new(config, policy).run_episodes(options.episodes)
}

/// Summaries come back in the order of `configs`.
pub fn run_batch(
    configs: &[RunConfig],
    options: &BatchOptions,
) -> Result<Vec<RunSummary>, AgentError> {
    #[cfg(feature = "parallel")]
    {
        configs
            .par_iter()
            .map(|cfg| run_one(cfg, options))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        configs.iter().map(|cfg| run_one(cfg, options)).collect()
    }
}
