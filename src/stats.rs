use serde::{Deserialize, Serialize};

use crate::host::EpisodeEnd;

const RECENT_WINDOW: usize = 200;

/// Outcome bookkeeping across episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episodes: u32,
    pub successes: u32,
    pub timeouts: u32,
    pub total_reward: f64,
    pub total_steps: u64,
    pub fish_delivered: u32,
    pub recent: Vec<bool>,
    pub learning_at_episode: Option<u32>,
    pub learned_at_episode: Option<u32>,
    pub mastered_at_episode: Option<u32>,
}

impl EpisodeStats {
    pub fn new() -> Self {
        Self {
            episodes: 0,
            successes: 0,
            timeouts: 0,
            total_reward: 0.0,
            total_steps: 0,
            fish_delivered: 0,
            recent: Vec::with_capacity(RECENT_WINDOW),
            learning_at_episode: None,
            learned_at_episode: None,
            mastered_at_episode: None,
        }
    }

    fn update_milestones(&mut self) {
        // Gate on a minimum sample so one lucky episode is not "mastery".
        if self.episodes < 20 {
            return;
        }

        let r = self.last_100_rate();
        if self.learning_at_episode.is_none() && r >= 0.70 {
            self.learning_at_episode = Some(self.episodes);
        }
        if self.learned_at_episode.is_none() && r >= 0.85 {
            self.learned_at_episode = Some(self.episodes);
        }
        if self.mastered_at_episode.is_none() && r >= 0.95 {
            self.mastered_at_episode = Some(self.episodes);
        }
    }

    pub fn record_episode(&mut self, end: EpisodeEnd, reward: f32, steps: u32, delivered: u32) {
        let success = end.is_success();
        if success {
            self.successes += 1;
        } else {
            self.timeouts += 1;
        }
        self.total_reward += reward as f64;
        self.total_steps += steps as u64;
        self.fish_delivered += delivered;

        self.recent.push(success);
        if self.recent.len() > RECENT_WINDOW {
            self.recent.remove(0);
        }

        self.episodes += 1;
        self.update_milestones();
    }

    pub fn success_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.successes as f32 / self.episodes as f32
        }
    }

    pub fn mean_reward(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            (self.total_reward / self.episodes as f64) as f32
        }
    }

    pub fn mean_steps(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_steps as f32 / self.episodes as f32
        }
    }

    pub fn recent_rate(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let ok = self.recent.iter().filter(|&&x| x).count();
        ok as f32 / self.recent.len() as f32
    }

    pub fn last_100_rate(&self) -> f32 {
        if self.recent.len() < 10 {
            return self.recent_rate();
        }
        let start = self.recent.len().saturating_sub(100);
        let slice = &self.recent[start..];
        let ok = slice.iter().filter(|&&x| x).count();
        ok as f32 / slice.len() as f32
    }

    /// Fold another run's totals into this one (milestones keep the earliest).
    pub fn merge(&mut self, other: &EpisodeStats) {
        self.episodes += other.episodes;
        self.successes += other.successes;
        self.timeouts += other.timeouts;
        self.total_reward += other.total_reward;
        self.total_steps += other.total_steps;
        self.fish_delivered += other.fish_delivered;
        self.learning_at_episode = earliest(self.learning_at_episode, other.learning_at_episode);
        self.learned_at_episode = earliest(self.learned_at_episode, other.learned_at_episode);
        self.mastered_at_episode = earliest(self.mastered_at_episode, other.mastered_at_episode);
        self.recent.extend_from_slice(&other.recent);
        if self.recent.len() > RECENT_WINDOW {
            let excess = self.recent.len() - RECENT_WINDOW;
            self.recent.drain(..excess);
        }
    }
}

fn earliest(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

impl Default for EpisodeStats {
    fn default() -> Self {
        Self::new()
    }
}
