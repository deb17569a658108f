//! Plants competing for light and ground on a 2D grid.
//!
//! Each plant grows cells from an inherited body plan, pays upkeep for every
//! living cell, earns energy only where it forms the canopy, and loses any
//! part of its body that is cut off from the ground. Seed cells sow mutated
//! copies of their plant nearby. [`Environment`] owns the whole simulation
//! and advances it one deterministic tick at a time.

pub mod cell;
pub mod config;
pub mod environment;
pub mod genome;
pub mod grid;
pub mod plant;
pub mod registry;
pub mod rng;
pub mod systems;

pub use cell::{Cell, CellKind, CellState};
pub use config::{ConfigError, Connectivity, SimConfig};
pub use environment::{Environment, PopulationStats, SpawnError};
pub use genome::{Blueprint, BodyPlan, Mutation};
pub use grid::{GridPos, GridSnapshot, SnapshotCell};
pub use plant::{ColorGenome, Plant, PlantId};
pub use rng::{SimRng, create_rng};
pub use systems::{RunBudget, SimulationPlugin, SimulationState, StepRequest, TickPacing};
