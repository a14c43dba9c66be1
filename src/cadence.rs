/// Decide every `period` steps and re-apply the last action in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionCadence {
    period: u32,
}

impl DecisionCadence {
    pub const DEFAULT_PERIOD: u32 = 4;

    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// `true` when a fresh decision is due at this (zero-based) step.
    pub fn is_decision_step(&self, step: u32) -> bool {
        step % self.period == 0
    }
}

impl Default for DecisionCadence {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}
