//! Demonstration recording: one record per decision, for imitation learning.
//!
//! File layout:
//! - magic `PNGDEMO1`, version (u32)
//! - `META` chunk: JSON [`DemoMeta`]
//! - `STEP` chunk (LZ4): packed little-endian steps, see [`STEP_FLOATS`]

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ACTION_SIZE};
use crate::error::DemoError;
use crate::observation::{Observation, OBSERVATION_SIZE};
use crate::storage;

const TAG_META: [u8; 4] = *b"META";
const TAG_STEP: [u8; 4] = *b"STEP";

/// Floats per packed step: observation, raw action, reward, done flag.
pub const STEP_FLOATS: usize = OBSERVATION_SIZE + ACTION_SIZE + 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoStep {
    pub observation: Observation,
    pub action: Action,
    /// Reward accumulated between this decision and the next one.
    pub reward: f32,
    /// The episode ended before the next decision.
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoMeta {
    pub name: String,
    pub observation_size: usize,
    pub action_size: usize,
    pub decision_period: u32,
    pub steps: usize,
    pub episodes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Demonstration {
    pub meta: DemoMeta,
    pub steps: Vec<DemoStep>,
}

impl Demonstration {
    pub fn total_reward(&self) -> f32 {
        self.steps.iter().map(|s| s.reward).sum()
    }

    pub fn save(&self, path: &Path) -> Result<(), DemoError> {
        let mut w = BufWriter::new(File::create(path)?);
        write_demo(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let mut r = BufReader::new(File::open(path)?);
        read_demo(&mut r)
    }
}

#[derive(Debug, Clone)]
pub struct DemoRecorder {
    name: String,
    decision_period: u32,
    steps: Vec<DemoStep>,
    episodes: u32,
}

impl DemoRecorder {
    pub fn new(name: &str, decision_period: u32) -> Self {
        Self {
            name: name.to_string(),
            decision_period,
            steps: Vec::new(),
            episodes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn record_decision(&mut self, observation: Observation, action: Action) {
        self.steps.push(DemoStep {
            observation,
            action,
            reward: 0.0,
            done: false,
        });
    }

    /// Credit reward to the latest decision. Rewards before the first decision are dropped.
    pub fn add_reward(&mut self, reward: f32) {
        if let Some(last) = self.steps.last_mut() {
            last.reward += reward;
        }
    }

    pub fn mark_episode_end(&mut self) {
        if let Some(last) = self.steps.last_mut() {
            last.done = true;
        }
        self.episodes += 1;
    }

    pub fn finish(self) -> Demonstration {
        Demonstration {
            meta: DemoMeta {
                name: self.name,
                observation_size: OBSERVATION_SIZE,
                action_size: ACTION_SIZE,
                decision_period: self.decision_period,
                steps: self.steps.len(),
                episodes: self.episodes,
            },
            steps: self.steps,
        }
    }
}

pub fn write_demo<W: Write>(w: &mut W, demo: &Demonstration) -> Result<(), DemoError> {
    w.write_all(storage::MAGIC)?;
    storage::write_u32_le(w, storage::VERSION_CURRENT)?;

    let meta = serde_json::to_vec(&demo.meta)?;
    storage::write_chunk(w, TAG_META, &meta)?;

    let mut packed = Vec::with_capacity(demo.steps.len() * STEP_FLOATS * 4);
    for step in &demo.steps {
        for v in step.observation.as_slice() {
            storage::write_f32_le(&mut packed, *v)?;
        }
        for v in step.action.encode() {
            storage::write_f32_le(&mut packed, v)?;
        }
        storage::write_f32_le(&mut packed, step.reward)?;
        storage::write_f32_le(&mut packed, if step.done { 1.0 } else { 0.0 })?;
    }
    storage::write_chunk_lz4(w, TAG_STEP, &packed)?;
    Ok(())
}

pub fn read_demo<R: Read>(r: &mut R) -> Result<Demonstration, DemoError> {
    let magic = storage::read_exact::<8, _>(r)?;
    if &magic != storage::MAGIC {
        return Err(DemoError::BadMagic);
    }
    let version = storage::read_u32_le(r)?;
    if version != storage::VERSION_CURRENT {
        return Err(DemoError::UnsupportedVersion(version));
    }

    let mut meta: Option<DemoMeta> = None;
    let mut packed: Option<Vec<u8>> = None;
    while let Some((tag, payload)) = storage::read_chunk(r)? {
        match tag {
            TAG_META => meta = Some(serde_json::from_slice(&payload)?),
            TAG_STEP => packed = Some(storage::unpack_lz4_payload(&payload)?),
            // Unknown chunks are skipped so newer writers stay readable.
            _ => {}
        }
    }

    let meta = meta.ok_or_else(|| DemoError::Corrupt("missing META chunk".to_string()))?;
    if meta.observation_size != OBSERVATION_SIZE || meta.action_size != ACTION_SIZE {
        return Err(DemoError::Corrupt(format!(
            "expected {OBSERVATION_SIZE} observations and {ACTION_SIZE} actions, file has {} and {}",
            meta.observation_size, meta.action_size
        )));
    }

    let packed = packed.unwrap_or_default();
    let step_bytes = STEP_FLOATS * 4;
    if packed.len() % step_bytes != 0 {
        return Err(DemoError::Corrupt(format!(
            "step payload of {} bytes is not a multiple of {step_bytes}",
            packed.len()
        )));
    }

    let mut steps = Vec::with_capacity(packed.len() / step_bytes);
    let mut cursor = packed.as_slice();
    while !cursor.is_empty() {
        let mut values = [0.0f32; STEP_FLOATS];
        for v in &mut values {
            *v = storage::read_f32_le(&mut cursor)?;
        }
        let mut observation = [0.0f32; OBSERVATION_SIZE];
        observation.copy_from_slice(&values[..OBSERVATION_SIZE]);
        let a = OBSERVATION_SIZE;
        steps.push(DemoStep {
            observation: Observation::from_array(observation),
            action: Action::decode([values[a], values[a + 1]]),
            reward: values[a + ACTION_SIZE],
            done: values[a + ACTION_SIZE + 1] != 0.0,
        });
    }

    if steps.len() != meta.steps {
        return Err(DemoError::Corrupt(format!(
            "META says {} steps, found {}",
            meta.steps,
            steps.len()
        )));
    }

    Ok(Demonstration { meta, steps })
}
