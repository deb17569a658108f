//! Runtime configuration for the plant simulation

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Neighbor relation used by the ground connectivity flood fill
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Left, right, above, below
    Four,
    /// The four orthogonal neighbors plus the diagonals
    #[default]
    Eight,
}

impl Connectivity {
    const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const WITH_DIAGONALS: [(i32, i32); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, -1),
        (1, -1),
        (-1, 1),
        (1, 1),
    ];

    pub fn neighbor_offsets(self) -> &'static [(i32, i32)] {
        match self {
            Connectivity::Four => &Self::ORTHOGONAL,
            Connectivity::Eight => &Self::WITH_DIAGONALS,
        }
    }
}

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} must be at least 1")]
    ZeroBound { field: &'static str },
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunables for the energy economy, lifespans, seeding, and mutation.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Resource, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    // ========================================================================
    // ENERGY ECONOMY
    // ========================================================================
    /// Energy credited to the topmost cell's plant in each column per tick
    pub given_energy_per_cycle: i64,

    /// Energy every living cell costs its plant per tick
    pub taken_energy_per_cycle: i64,

    /// Energy spent to grow one normal cell
    pub energy_per_cell: i64,

    /// Energy spent to germinate a seed cell
    pub energy_per_seed: i64,

    /// Starting energy of a plant born from a seed
    pub initial_plant_energy: i64,

    // ========================================================================
    // LIFECYCLE
    // ========================================================================
    /// Ticks a cell may stay alive after activation before it is killed
    pub cell_lifespan: u64,

    /// Neighbor relation for the ground connectivity pass
    pub connectivity: Connectivity,

    /// Maximum horizontal jitter applied to a seed's landing spot
    pub seed_spread: i32,

    // ========================================================================
    // MUTATION
    // ========================================================================
    /// Chance that a newborn's body plan is mutated at all
    pub mutation_probability: f64,

    /// Chance that a mutation episode adds cells rather than removing them
    pub mutation_addition_probability: f64,

    /// Upper bound on cells added in a single episode
    pub max_cell_additions: u32,

    /// Upper bound on cells removed in a single episode
    pub max_cell_removals: u32,

    /// Chance that an added cell is a seed
    pub mutation_seed_probability: f64,

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================
    /// Ticks between population status log lines (0 disables them)
    pub status_log_interval: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            given_energy_per_cycle: 40,
            taken_energy_per_cycle: 20,
            energy_per_cell: 8,
            energy_per_seed: 50,
            initial_plant_energy: 40,
            cell_lifespan: 100,
            connectivity: Connectivity::Eight,
            seed_spread: 20,
            mutation_probability: 0.1,
            mutation_addition_probability: 0.5,
            max_cell_additions: 5,
            max_cell_removals: 5,
            mutation_seed_probability: 0.1,
            status_log_interval: 500,
        }
    }
}

impl SimConfig {
    /// Load a config from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("given_energy_per_cycle", self.given_energy_per_cycle),
            ("taken_energy_per_cycle", self.taken_energy_per_cycle),
            ("energy_per_cell", self.energy_per_cell),
            ("energy_per_seed", self.energy_per_seed),
            ("initial_plant_energy", self.initial_plant_energy),
            ("seed_spread", i64::from(self.seed_spread)),
        ];
        for (field, value) in non_negative {
            if value < 0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let probabilities = [
            ("mutation_probability", self.mutation_probability),
            ("mutation_addition_probability", self.mutation_addition_probability),
            ("mutation_seed_probability", self.mutation_seed_probability),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }

        if self.max_cell_additions == 0 {
            return Err(ConfigError::ZeroBound {
                field: "max_cell_additions",
            });
        }
        if self.max_cell_removals == 0 {
            return Err(ConfigError::ZeroBound {
                field: "max_cell_removals",
            });
        }
        Ok(())
    }
}
