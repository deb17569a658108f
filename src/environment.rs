use crate::cell::CellState;
use crate::config::{ConfigError, SimConfig};
use crate::genome::BodyPlan;
use crate::grid::{CellRef, Grid, GridPos, GridSnapshot, SnapshotCell};
use crate::plant::{GrowthOutcome, Plant, PlantId};
use crate::registry::PopulationRegistry;
use crate::rng::SimRng;
use bevy::log::{debug, info};
use bevy::prelude::Resource;
use rand::Rng;
use slotmap::SlotMap;
use std::fmt;
use thiserror::Error;

/// Why a plant could not be placed from outside the tick pipeline
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("root x={x} is outside the grid")]
    OutOfBounds { x: i32 },
    #[error("ground at x={x} is already occupied")]
    Occupied { x: i32 },
}

/// Population figures for displays and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationStats {
    pub tick: u64,
    pub living: u64,
    pub births: u64,
    pub deaths: u64,
    pub occupied_cells: usize,
}

/// The whole simulation: occupancy grid, plant arena, population registry,
/// and the random source every stochastic decision draws from.
///
/// All mutation goes through [`Environment::advance_tick`] or the explicit
/// intervention methods; the grid is only ever changed by cell transitions.
#[derive(Resource)]
pub struct Environment {
    config: SimConfig,
    grid: Grid,
    plants: SlotMap<PlantId, Plant>,
    registry: PopulationRegistry,
    rng: SimRng,
    tick: u64,
}

impl Environment {
    pub fn new(width: u32, height: u32, config: SimConfig, rng: SimRng) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        config.validate()?;
        Ok(Self {
            config,
            grid: Grid::new(width, height),
            plants: SlotMap::with_key(),
            registry: PopulationRegistry::default(),
            rng,
            tick: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &PopulationRegistry {
        &self.registry
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn plant(&self, id: PlantId) -> Option<&Plant> {
        self.plants.get(id)
    }

    /// Tracked plants in pipeline order, staged newborns last
    pub fn plants(&self) -> impl Iterator<Item = &Plant> + '_ {
        self.registry.tracked().filter_map(|id| self.plants.get(id))
    }

    pub fn is_space_available(&self, x: i32, y: i32) -> bool {
        self.grid.is_space_available(GridPos::new(x, y))
    }

    pub fn population_count(&self) -> u64 {
        self.registry.living_count()
    }

    pub fn is_extinct(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn stats(&self) -> PopulationStats {
        PopulationStats {
            tick: self.tick,
            living: self.registry.living_count(),
            births: self.registry.births(),
            deaths: self.registry.deaths(),
            occupied_cells: self.grid.occupied_count(),
        }
    }

    /// Plant a starter body (see [`BodyPlan::basic`]) rooted at `root_x` on
    /// the ground row and bring it to life.
    pub fn spawn_basic_plant(
        &mut self,
        energy: i64,
        root_x: i32,
        stalk_height: u32,
        arm_width: u32,
    ) -> Result<PlantId, SpawnError> {
        self.spawn_plant(energy, root_x, &BodyPlan::basic(stalk_height, arm_width))
    }

    /// Plant an arbitrary body plan. The plant is staged like any newborn, so
    /// it first grows on the tick after the one it is spawned in.
    pub fn spawn_plant(
        &mut self,
        energy: i64,
        root_x: i32,
        plan: &BodyPlan,
    ) -> Result<PlantId, SpawnError> {
        let root = GridPos::new(root_x, 0);
        if !self.grid.in_bounds(root) {
            return Err(SpawnError::OutOfBounds { x: root_x });
        }
        if !self.grid.is_space_available(root) {
            return Err(SpawnError::Occupied { x: root_x });
        }
        Ok(self.insert_plant(root, energy, plan))
    }

    /// Apply an energy change to a plant. Returns true if it killed the plant.
    pub fn increment_energy(&mut self, id: PlantId, delta: i64) -> bool {
        let Some(plant) = self.plants.get_mut(id) else {
            return false;
        };
        let died = plant.increment_energy(delta, &mut self.grid, &mut self.registry, self.tick);
        if died {
            self.registry.stage_dead(id);
        }
        died
    }

    /// Kill a plant outright. Returns false if it was already dead.
    pub fn kill_plant(&mut self, id: PlantId) -> bool {
        let Some(plant) = self.plants.get_mut(id) else {
            return false;
        };
        let died = plant.deactivate(&mut self.grid, &mut self.registry, self.tick);
        if died {
            self.registry.stage_dead(id);
        }
        died
    }

    /// Kill one living cell of a plant. Cells that are not alive are left as
    /// they are and false is returned.
    pub fn kill_cell(&mut self, id: PlantId, index: usize) -> bool {
        let Some(plant) = self.plants.get_mut(id) else {
            return false;
        };
        if plant.cells().get(index).map(|cell| cell.state()) != Some(CellState::Alive) {
            return false;
        }
        plant.set_cell_state(index, CellState::Dead, &mut self.grid, self.tick);
        true
    }

    /// Copy of the grid showing which plant owns each coordinate
    pub fn grid_snapshot(&self) -> GridSnapshot {
        let (width, height) = (self.grid.width(), self.grid.height());
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for x in 0..width as i32 {
            for y in 0..height as i32 {
                cells.push(self.grid.get(GridPos::new(x, y)).and_then(|cell| {
                    self.plants.get(cell.plant).map(|plant| SnapshotCell {
                        plant: cell.plant,
                        color: plant.color(),
                    })
                }));
            }
        }
        GridSnapshot::new(width, height, cells)
    }

    /// Run one full step of the pipeline
    pub fn advance_tick(&mut self) {
        let interval = self.config.status_log_interval;
        if interval > 0 && self.tick % interval == 0 {
            info!("cycle {} living count: {}", self.tick, self.population_count());
        }

        self.give_energy();
        self.take_energy();
        self.enforce_lifespan();
        self.grow_all_plants();
        self.kill_disconnected_cells();
        self.prune_plants();
        self.tick += 1;
    }

    fn insert_plant(&mut self, root: GridPos, energy: i64, plan: &BodyPlan) -> PlantId {
        let serial = self.registry.next_serial();
        let tick = self.tick;
        let id = self
            .plants
            .insert_with_key(|id| Plant::new(id, serial, root, energy, plan, tick));
        self.registry.stage_newborn(id);
        self.plants[id].activate(&mut self.grid, &mut self.registry, tick);
        id
    }

    fn credit(&mut self, cell: CellRef, delta: i64) {
        if let Some(plant) = self.plants.get_mut(cell.plant) {
            if plant.increment_energy(delta, &mut self.grid, &mut self.registry, self.tick) {
                self.registry.stage_dead(cell.plant);
            }
        }
    }

    /// Light reaches only the highest cell in each column
    fn give_energy(&mut self) {
        let given = self.config.given_energy_per_cycle;
        for x in 0..self.grid.width() as i32 {
            let canopy = (0..self.grid.height() as i32)
                .rev()
                .find_map(|y| self.grid.get(GridPos::new(x, y)));
            if let Some(cell) = canopy {
                self.credit(cell, given);
            }
        }
    }

    /// Every living cell costs upkeep. Cells freed by a plant dying mid-scan
    /// are not charged.
    fn take_energy(&mut self) {
        let taken = self.config.taken_energy_per_cycle;
        for x in 0..self.grid.width() as i32 {
            for y in (0..self.grid.height() as i32).rev() {
                if let Some(cell) = self.grid.get(GridPos::new(x, y)) {
                    self.credit(cell, -taken);
                }
            }
        }
    }

    fn enforce_lifespan(&mut self) {
        let lifespan = self.config.cell_lifespan;
        let tick = self.tick;
        let expired: Vec<CellRef> = self
            .grid
            .occupied()
            .map(|(_, cell)| cell)
            .filter(|cell| {
                self.plants[cell.plant].cells()[cell.index]
                    .age(tick)
                    .is_some_and(|age| age > lifespan)
            })
            .collect();

        for cell in expired {
            debug!(index = cell.index, "cell exceeded its lifespan");
            self.plants[cell.plant].set_cell_state(cell.index, CellState::Dead, &mut self.grid, tick);
        }
    }

    fn grow_all_plants(&mut self) {
        for i in 0..self.registry.active().len() {
            let id = self.registry.active()[i];
            let Some(plant) = self.plants.get_mut(id) else {
                continue;
            };
            if let GrowthOutcome::Germinated { dx_hint, .. } =
                plant.grow(&mut self.grid, &self.config, self.tick)
            {
                self.reproduce(id, dx_hint);
            }
        }
        self.registry.merge_newborns();
    }

    /// Sow a copy of `parent` near its root, shifted by `dx_hint` plus
    /// jitter. Occupied or off-grid ground means no offspring.
    fn reproduce(&mut self, parent: PlantId, dx_hint: i32) -> Option<PlantId> {
        let (root, plan) = {
            let plant = self.plants.get(parent)?;
            (plant.root(), plant.body_plan())
        };
        let spread = self.config.seed_spread;
        let jitter = self.rng.gen_range(-spread..=spread);
        let target = GridPos::new(root.x + dx_hint + jitter, root.y);
        if !self.grid.is_space_available(target) {
            debug!(x = target.x, "seed landed on unavailable ground");
            return None;
        }

        let mut plan = plan;
        let mutations = plan.mutate(&self.config, &mut self.rng);
        if !mutations.is_empty() {
            debug!(?mutations, cells = plan.len(), "offspring body plan mutated");
        }
        let id = self.insert_plant(target, self.config.initial_plant_energy, &plan);
        debug!(x = target.x, "created offspring plant");
        Some(id)
    }

    /// Flood fill from every living ground cell through living cells of the
    /// same plant, then kill whatever the fill did not reach
    fn kill_disconnected_cells(&mut self) {
        let tick = self.tick;
        let neighbors = self.config.connectivity.neighbor_offsets();

        let mut frontier = Vec::new();
        for x in 0..self.grid.width() as i32 {
            let pos = GridPos::new(x, 0);
            if let Some(cell) = self.grid.get(pos) {
                self.plants[cell.plant].mark_connected(cell.index, tick);
                frontier.push(pos);
            }
        }

        while let Some(pos) = frontier.pop() {
            let Some(current) = self.grid.get(pos) else {
                continue;
            };
            for &(dx, dy) in neighbors {
                let next = pos.offset(dx, dy);
                let Some(neighbor) = self.grid.get(next) else {
                    continue;
                };
                if neighbor.plant != current.plant {
                    continue;
                }
                let plant = &mut self.plants[neighbor.plant];
                if plant.cells()[neighbor.index].connected_at() == Some(tick) {
                    continue;
                }
                plant.mark_connected(neighbor.index, tick);
                frontier.push(next);
            }
        }

        let unsupported: Vec<(GridPos, CellRef)> = self
            .grid
            .occupied()
            .filter(|(_, cell)| {
                self.plants[cell.plant].cells()[cell.index].connected_at() != Some(tick)
            })
            .collect();
        for (pos, cell) in unsupported {
            debug!(x = pos.x, y = pos.y, "killing disconnected cell");
            let plant = &mut self.plants[cell.plant];
            plant.set_cell_state(cell.index, CellState::Dead, &mut self.grid, tick);
            if plant.living_cells() == 0 {
                self.registry.stage_dead(cell.plant);
            }
        }
    }

    fn prune_plants(&mut self) {
        let tick = self.tick;
        let empty: Vec<PlantId> = self
            .registry
            .active()
            .iter()
            .copied()
            .filter(|id| self.plants.get(*id).is_none_or(|p| p.living_cells() == 0))
            .collect();
        for id in empty {
            if let Some(plant) = self.plants.get_mut(id) {
                plant.deactivate(&mut self.grid, &mut self.registry, tick);
            }
            self.registry.stage_dead(id);
        }

        for id in self.registry.splice_dead() {
            if let Some(plant) = self.plants.remove(id) {
                debug!(serial = plant.serial(), age = plant.age(tick), "pruned plant");
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Environment {} by {} with {} plants",
            self.grid.width(),
            self.grid.height(),
            self.population_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Connectivity;
    use crate::genome::Blueprint;
    use crate::rng::create_rng;

    fn environment(width: u32, height: u32, config: SimConfig) -> Environment {
        Environment::new(width, height, config, create_rng(42)).unwrap()
    }

    fn plan(offsets: &[(i32, i32)]) -> BodyPlan {
        BodyPlan::from_blueprints(
            offsets
                .iter()
                .map(|&(dx, dy)| Blueprint::normal(dx, dy))
                .collect(),
        )
        .unwrap()
    }

    fn grow_until(env: &mut Environment, id: PlantId, living: usize) {
        for _ in 0..20 {
            if env.plant(id).map(|p| p.living_cells()) == Some(living) {
                return;
            }
            env.advance_tick();
        }
        panic!("plant never reached {living} living cells");
    }

    #[test]
    fn rejects_empty_grid_and_bad_config() {
        assert!(matches!(
            Environment::new(0, 5, SimConfig::default(), create_rng(0)),
            Err(ConfigError::EmptyGrid { .. })
        ));
        let config = SimConfig {
            mutation_seed_probability: -0.1,
            ..SimConfig::default()
        };
        assert!(Environment::new(5, 5, config, create_rng(0)).is_err());
    }

    #[test]
    fn spawn_checks_ground() {
        let mut env = environment(10, 10, SimConfig::default());
        assert_eq!(
            env.spawn_basic_plant(100, 10, 1, 1),
            Err(SpawnError::OutOfBounds { x: 10 })
        );
        env.spawn_basic_plant(100, 3, 1, 1).unwrap();
        assert_eq!(
            env.spawn_basic_plant(100, 3, 1, 1),
            Err(SpawnError::Occupied { x: 3 })
        );
    }

    #[test]
    fn energy_is_credited_once_per_column() {
        let config = SimConfig::default();
        let mut env = environment(10, 10, config.clone());
        let id = env.spawn_plant(100, 5, &plan(&[(0, 0), (0, 1), (0, 2)])).unwrap();

        // Spawn tick: staged, so no growth.
        env.advance_tick();
        let gain = config.given_energy_per_cycle;
        let upkeep = config.taken_energy_per_cycle;
        assert_eq!(env.plant(id).unwrap().energy(), 100 + gain - upkeep);

        // One living cell is charged, then one grows.
        env.advance_tick();
        assert_eq!(
            env.plant(id).unwrap().energy(),
            100 + 2 * gain - 2 * upkeep - config.energy_per_cell
        );

        // Two cells share one column: one credit, two charges.
        env.advance_tick();
        assert_eq!(
            env.plant(id).unwrap().energy(),
            100 + 3 * gain - 4 * upkeep - 2 * config.energy_per_cell
        );
    }

    #[test]
    fn shaded_plant_pays_upkeep_without_light() {
        let config = SimConfig::default();
        let mut env = environment(10, 10, config.clone());
        let tall = env
            .spawn_plant(200, 2, &plan(&[(0, 0), (0, 1), (0, 2), (1, 2)]))
            .unwrap();
        let short = env.spawn_plant(200, 3, &BodyPlan::root()).unwrap();
        grow_until(&mut env, tall, 4);

        // The arm at (3, 2) now sits above the short plant's root.
        let tall_before = env.plant(tall).unwrap().energy();
        let short_before = env.plant(short).unwrap().energy();
        env.advance_tick();

        let gain = config.given_energy_per_cycle;
        let upkeep = config.taken_energy_per_cycle;
        assert_eq!(
            env.plant(tall).unwrap().energy(),
            tall_before + 2 * gain - 4 * upkeep
        );
        assert_eq!(env.plant(short).unwrap().energy(), short_before - upkeep);
    }

    #[test]
    fn support_never_crosses_plants() {
        let config = SimConfig {
            connectivity: Connectivity::Eight,
            ..SimConfig::default()
        };
        let mut env = environment(10, 10, config);
        let left = env
            .spawn_plant(200, 2, &plan(&[(0, 0), (0, 1), (0, 2), (1, 2)]))
            .unwrap();
        let right = env
            .spawn_plant(200, 4, &plan(&[(0, 0), (0, 1), (0, 2)]))
            .unwrap();
        grow_until(&mut env, left, 4);
        grow_until(&mut env, right, 3);

        // (3, 2) still touches the right plant's stalk
        assert!(env.kill_cell(left, 1));
        env.advance_tick();

        let left = env.plant(left).unwrap();
        assert_eq!(left.cells()[2].state(), CellState::Dead);
        assert_eq!(left.cells()[3].state(), CellState::Dead);
        assert_eq!(left.living_cells(), 1);
        assert_eq!(env.plant(right).unwrap().living_cells(), 3);
    }

    #[test]
    fn diagonal_support_depends_on_connectivity() {
        for (mode, survives) in [(Connectivity::Eight, true), (Connectivity::Four, false)] {
            let config = SimConfig {
                connectivity: mode,
                ..SimConfig::default()
            };
            let mut env = environment(10, 10, config);
            let id = env
                .spawn_plant(100, 5, &plan(&[(0, 0), (0, 1), (1, 1), (1, 2)]))
                .unwrap();
            grow_until(&mut env, id, 4);

            assert!(env.kill_cell(id, 2));
            env.advance_tick();
            let tip = env.plant(id).unwrap().cells()[3].state();
            assert_eq!(tip == CellState::Alive, survives, "{mode:?}");
        }
    }

    #[test]
    fn kill_plant_is_pruned_next_tick() {
        let mut env = environment(10, 10, SimConfig::default());
        let id = env.spawn_basic_plant(100, 5, 1, 1).unwrap();
        env.advance_tick();

        assert!(env.kill_plant(id));
        assert!(!env.kill_plant(id));
        assert_eq!(env.population_count(), 0);
        assert!(env.grid().occupied_count() == 0);
        assert!(env.plant(id).is_some());

        env.advance_tick();
        assert!(env.plant(id).is_none());
        assert!(env.is_extinct());
    }

    #[test]
    fn kill_cell_ignores_cells_that_are_not_alive() {
        let mut env = environment(10, 10, SimConfig::default());
        let id = env.spawn_basic_plant(100, 5, 1, 1).unwrap();
        assert!(!env.kill_cell(id, 1));
        assert!(!env.kill_cell(id, 99));
        assert!(env.kill_cell(id, 0));
        assert!(!env.kill_cell(id, 0));
    }

    #[test]
    fn display_reports_size_and_population() {
        let mut env = environment(30, 8, SimConfig::default());
        env.spawn_basic_plant(100, 1, 1, 1).unwrap();
        env.spawn_basic_plant(100, 9, 1, 1).unwrap();
        assert_eq!(env.to_string(), "Environment 30 by 8 with 2 plants");
    }

    #[test]
    fn snapshot_matches_grid() {
        let mut env = environment(12, 6, SimConfig::default());
        let id = env.spawn_basic_plant(100, 6, 1, 1).unwrap();
        grow_until(&mut env, id, 4);

        let snapshot = env.grid_snapshot();
        let plant = env.plant(id).unwrap();
        assert_eq!(snapshot.occupied().count(), 4);
        for (pos, cell) in snapshot.occupied() {
            assert_eq!(cell.plant, id);
            assert_eq!(cell.color, plant.color());
            assert!(env.grid().get(pos).is_some());
        }
        assert_eq!(snapshot.get(-1, 0), None);
        assert_eq!(snapshot.get(6, 0).map(|c| c.plant), Some(id));
    }
}
