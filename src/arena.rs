//! In-process reference host: a flat circular pond with fish and a baby.
//!
//! There is no physics here. Bodies are points on the `y = 0` plane, the
//! agent is clamped to the disc, and a "collision" is the agent's centre
//! coming within `contact_radius` of something it was not already touching.

use glam::Vec3;
use hashbrown::HashSet;

use crate::config::ArenaConfig;
use crate::host::{Contact, Environment, ItemHandle, Pose, TransientKind};
use crate::prng::Prng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fish {
    pub handle: ItemHandle,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transient {
    pub kind: TransientKind,
    pub position: Vec3,
    /// Seconds left before it disappears.
    pub remaining: f32,
}

#[derive(Debug, Clone)]
pub struct Arena {
    config: ArenaConfig,
    rng: Prng,
    dependent: Option<Vec3>,
    fish: Vec<Fish>,
    transients: Vec<Transient>,
    touching: HashSet<Contact>,
    next_handle: u32,
    resets: u32,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Self {
        let rng = Prng::new(config.seed);
        Self {
            config,
            rng,
            dependent: None,
            fish: Vec::new(),
            transients: Vec::new(),
            touching: HashSet::new(),
            next_handle: 0,
            resets: 0,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn fish(&self) -> &[Fish] {
        &self.fish
    }

    pub fn transients(&self) -> &[Transient] {
        &self.transients
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Override the dependent's position (or remove it) until the next reset.
    pub fn set_dependent(&mut self, position: Option<Vec3>) {
        self.dependent = position;
    }

    /// Place an extra fish; returns its handle.
    pub fn add_fish(&mut self, position: Vec3) -> ItemHandle {
        let handle = ItemHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.fish.push(Fish { handle, position });
        handle
    }

    /// Contacts that started since the previous call.
    pub fn contacts(&mut self, position: Vec3) -> Vec<Contact> {
        let r = self.config.contact_radius;
        let mut current: Vec<Contact> = self
            .fish
            .iter()
            .filter(|f| f.position.distance(position) <= r)
            .map(|f| Contact::Fish(f.handle))
            .collect();
        if let Some(dependent) = self.dependent {
            if dependent.distance(position) <= r {
                current.push(Contact::Dependent);
            }
        }

        let entered: Vec<Contact> = current
            .iter()
            .copied()
            .filter(|c| !self.touching.contains(c))
            .collect();
        self.touching = current.into_iter().collect();
        entered
    }

    /// Age transients by `dt` seconds and drop the expired ones.
    pub fn advance(&mut self, dt: f32) {
        for t in &mut self.transients {
            t.remaining -= dt;
        }
        self.transients.retain(|t| t.remaining > 0.0);
    }

    fn random_spot_away_from(&mut self, avoid: Vec3) -> Vec3 {
        let clearance = self.config.spawn_clearance;
        let mut p = self.rng.gen_point_in_disc(self.config.radius);
        for _ in 0..16 {
            if p.distance(avoid) >= clearance {
                break;
            }
            p = self.rng.gen_point_in_disc(self.config.radius);
        }
        p
    }
}

impl Environment for Arena {
    fn reset(&mut self) -> Pose {
        self.resets = self.resets.wrapping_add(1);
        self.fish.clear();
        self.transients.clear();
        self.touching.clear();

        let spawn = Pose::new(
            self.rng.gen_point_in_disc(self.config.radius * 0.5),
            self.rng.gen_range_f32(0.0, 360.0),
        );
        self.dependent = Some(self.random_spot_away_from(spawn.position));
        for _ in 0..self.config.fish_count {
            let p = self.random_spot_away_from(spawn.position);
            self.add_fish(p);
        }
        spawn
    }

    fn dependent_position(&self) -> Option<Vec3> {
        self.dependent
    }

    fn remove_item(&mut self, item: ItemHandle) -> bool {
        match self.fish.iter().position(|f| f.handle == item) {
            Some(idx) => {
                self.fish.remove(idx);
                true
            }
            None => false,
        }
    }

    fn remaining_items(&self) -> usize {
        self.fish.len()
    }

    fn config_parameter(&self, name: &str, default: f32) -> f32 {
        self.config.parameters.get(name).copied().unwrap_or(default)
    }

    fn spawn_transient(&mut self, kind: TransientKind, position: Vec3, lifetime: f32) {
        if lifetime <= 0.0 {
            return;
        }
        self.transients.push(Transient {
            kind,
            position,
            remaining: lifetime,
        });
    }

    fn move_body(&mut self, _from: Vec3, to: Vec3) -> Vec3 {
        let flat = Vec3::new(to.x, 0.0, to.z);
        let radius = self.config.radius;
        if flat.length() > radius {
            flat.normalize() * radius
        } else {
            flat
        }
    }
}
