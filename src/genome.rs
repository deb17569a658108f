use crate::cell::CellKind;
use crate::config::SimConfig;
use rand::Rng;
use std::fmt;

/// Inherited description of one cell: where it grows relative to the root
/// and what kind of cell it becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blueprint {
    pub dx: i32,
    pub dy: i32,
    pub kind: CellKind,
}

impl Blueprint {
    pub const fn normal(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            kind: CellKind::Normal,
        }
    }

    pub const fn seed(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            kind: CellKind::Seed,
        }
    }
}

impl fmt::Display for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            CellKind::Normal => "cell",
            CellKind::Seed => "seed",
        };
        write!(f, "{tag} ({:+}, {:+})", self.dx, self.dy)
    }
}

/// Which way a mutation episode went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Added(usize),
    Removed(usize),
}

/// Ordered list of blueprints; the order is also the growth priority.
/// Index 0 is the root and always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPlan {
    blueprints: Vec<Blueprint>,
}

impl BodyPlan {
    /// A plan holding only the root cell
    pub fn root() -> Self {
        Self {
            blueprints: vec![Blueprint::normal(0, 0)],
        }
    }

    /// Build from an explicit list. Returns `None` unless the first entry is a
    /// normal cell at the root offset.
    pub fn from_blueprints(blueprints: Vec<Blueprint>) -> Option<Self> {
        match blueprints.first() {
            Some(&first) if first == Blueprint::normal(0, 0) => Some(Self { blueprints }),
            _ => None,
        }
    }

    /// The starter body: a stalk of `stalk_height + 1` cells, `arm_width`
    /// normal cells to each side at its top, and `arm_width` seeds to each
    /// side one row above that
    pub fn basic(stalk_height: u32, arm_width: u32) -> Self {
        let mut plan = Self { blueprints: Vec::new() };
        plan.push_column(0, 0, stalk_height + 1, CellKind::Normal);
        plan.push_arms(0, stalk_height as i32, arm_width, CellKind::Normal);
        plan.push_arms(0, stalk_height as i32 + 1, arm_width, CellKind::Seed);
        plan
    }

    pub fn blueprints(&self) -> &[Blueprint] {
        &self.blueprints
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    fn push_column(&mut self, dx: i32, dy: i32, count: u32, kind: CellKind) {
        for i in 0..count as i32 {
            self.blueprints.push(Blueprint { dx, dy: dy + i, kind });
        }
    }

    /// Alternates right then left, moving outward
    fn push_arms(&mut self, dx: i32, dy: i32, count: u32, kind: CellKind) {
        for i in 1..=count as i32 {
            self.blueprints.push(Blueprint { dx: dx + i, dy, kind });
            self.blueprints.push(Blueprint { dx: dx - i, dy, kind });
        }
    }

    /// Roll for a single mutation episode.
    ///
    /// Returns the mutations applied in order; an empty list means the plan
    /// came through unchanged.
    pub fn mutate(&mut self, config: &SimConfig, rng: &mut impl Rng) -> Vec<Mutation> {
        let mut applied = Vec::new();
        if !rng.gen_bool(config.mutation_probability) {
            return applied;
        }

        if rng.gen_bool(config.mutation_addition_probability) {
            let count = rng.gen_range(1..=config.max_cell_additions);
            for _ in 0..count {
                let index = self.mutate_add(config.mutation_seed_probability, rng);
                applied.push(Mutation::Added(index));
            }
        } else {
            let count = rng.gen_range(1..=config.max_cell_removals);
            for _ in 0..count {
                if let Some(index) = self.mutate_remove(rng) {
                    applied.push(Mutation::Removed(index));
                }
            }
        }
        applied
    }

    /// Grow a new blueprint one step away from a random anchor, inserted right
    /// after it. Returns the new blueprint's index.
    pub fn mutate_add(&mut self, seed_probability: f64, rng: &mut impl Rng) -> usize {
        let anchor_index = rng.gen_range(0..self.blueprints.len());
        let anchor = self.blueprints[anchor_index];

        let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
        let (dx, dy) = if rng.gen_bool(0.5) {
            (anchor.dx + delta, anchor.dy)
        } else {
            (anchor.dx, anchor.dy + delta)
        };
        let kind = if rng.gen_bool(seed_probability) {
            CellKind::Seed
        } else {
            CellKind::Normal
        };

        self.blueprints
            .insert(anchor_index + 1, Blueprint { dx, dy, kind });
        anchor_index + 1
    }

    /// Drop a random non-root blueprint. Does nothing once only the root is left.
    pub fn mutate_remove(&mut self, rng: &mut impl Rng) -> Option<usize> {
        if self.blueprints.len() <= 1 {
            return None;
        }
        let index = rng.gen_range(1..self.blueprints.len());
        self.blueprints.remove(index);
        Some(index)
    }
}
