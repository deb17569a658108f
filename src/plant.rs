use crate::cell::{Cell, CellKind, CellState, Transition};
use crate::config::SimConfig;
use crate::genome::{Blueprint, BodyPlan};
use crate::grid::{CellRef, Grid, GridPos};
use crate::registry::PopulationRegistry;
use bevy::log::debug;
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle for a plant in the environment's arena
    pub struct PlantId;
}

/// Display color, fixed when the plant is created and not passed to offspring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorGenome {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorGenome {
    /// Spread consecutive serials across distinct hues
    pub fn from_serial(serial: u64) -> Self {
        let r = ((serial * 5) % 7) as u8 * (255 / 6);
        let g = ((serial * 5) % 11) as u8 * (255 / 10);
        let b = 255 - ((u16::from(r) + u16::from(g)) / 2) as u8;
        Self { r, g, b }
    }
}

/// Result of one call to [`Plant::grow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthOutcome {
    /// Nothing could grow this tick
    Dormant,
    /// The normal cell at this index came alive
    Grew(usize),
    /// The seed cell at this index was spent; the caller should sow an
    /// offspring in the direction of `dx_hint`
    Germinated { index: usize, dx_hint: i32 },
}

/// An organism rooted on the ground row
#[derive(Debug, Clone)]
pub struct Plant {
    id: PlantId,
    serial: u64,
    root: GridPos,
    energy: i64,
    alive: bool,
    created_at: u64,
    color: ColorGenome,
    cells: Vec<Cell>,
    living_cells: usize,
}

impl Plant {
    pub(crate) fn new(
        id: PlantId,
        serial: u64,
        root: GridPos,
        energy: i64,
        plan: &BodyPlan,
        now: u64,
    ) -> Self {
        let cells = plan
            .blueprints()
            .iter()
            .map(|bp| Cell::new(bp.dx, bp.dy, bp.kind, now))
            .collect();
        let color = ColorGenome::from_serial(serial);
        debug!(serial, ?color, x = root.x, "created plant");
        Self {
            id,
            serial,
            root,
            energy,
            alive: false,
            created_at: now,
            color,
            cells,
            living_cells: 0,
        }
    }

    pub fn id(&self) -> PlantId {
        self.id
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn root(&self) -> GridPos {
        self.root
    }

    pub fn energy(&self) -> i64 {
        self.energy
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    pub fn color(&self) -> ColorGenome {
        self.color
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn living_cells(&self) -> usize {
        self.living_cells
    }

    /// The body plan this plant was built from, in growth order
    pub fn blueprints(&self) -> Vec<Blueprint> {
        self.cells
            .iter()
            .map(|cell| Blueprint {
                dx: cell.dx(),
                dy: cell.dy(),
                kind: cell.kind(),
            })
            .collect()
    }

    pub fn body_plan(&self) -> BodyPlan {
        BodyPlan::from_blueprints(self.blueprints()).unwrap_or_else(BodyPlan::root)
    }

    pub fn cell_position(&self, index: usize) -> Option<GridPos> {
        self.cells.get(index).map(|cell| cell.position(self.root))
    }

    pub(crate) fn mark_connected(&mut self, index: usize, now: u64) {
        self.cells[index].mark_connected(now);
    }

    /// Drive one cell through the lifecycle and keep the grid and living
    /// count in step with it
    pub(crate) fn set_cell_state(
        &mut self,
        index: usize,
        target: CellState,
        grid: &mut Grid,
        now: u64,
    ) -> Transition {
        let cell = &mut self.cells[index];
        let pos = cell.position(self.root);
        let transition = cell.set_state(target, now);
        match transition {
            Transition::Grew => {
                grid.place(pos, CellRef { plant: self.id, index });
                self.living_cells += 1;
                debug!(
                    root = self.root.x,
                    dx = cell.dx(),
                    dy = cell.dy(),
                    "cell is now alive"
                );
            }
            Transition::Died => {
                grid.clear(pos);
                self.living_cells -= 1;
                debug!(
                    root = self.root.x,
                    dx = cell.dx(),
                    dy = cell.dy(),
                    age = cell.age(now),
                    "cell is now dead"
                );
            }
            Transition::Germinated => {
                debug!(root = self.root.x, dx = cell.dx(), dy = cell.dy(), "seed germinated");
            }
            Transition::Unchanged => {}
        }
        transition
    }

    /// Bring the plant to life by growing its root cell. Returns false if it
    /// was already alive.
    pub(crate) fn activate(
        &mut self,
        grid: &mut Grid,
        registry: &mut PopulationRegistry,
        now: u64,
    ) -> bool {
        if self.alive {
            return false;
        }
        self.alive = true;
        self.set_cell_state(0, CellState::Alive, grid, now);
        registry.record_birth();
        debug!(serial = self.serial, "plant is now alive");
        true
    }

    /// Kill every living cell. Returns false if the plant was already dead.
    pub(crate) fn deactivate(
        &mut self,
        grid: &mut Grid,
        registry: &mut PopulationRegistry,
        now: u64,
    ) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        for index in 0..self.cells.len() {
            if self.cells[index].state() == CellState::Alive {
                self.set_cell_state(index, CellState::Dead, grid, now);
            }
        }
        registry.record_death();
        debug!(serial = self.serial, age = self.age(now), "plant is now dead");
        true
    }

    /// Apply an energy change. Going negative kills the whole plant at once;
    /// returns true when this call did so.
    pub(crate) fn increment_energy(
        &mut self,
        delta: i64,
        grid: &mut Grid,
        registry: &mut PopulationRegistry,
        now: u64,
    ) -> bool {
        self.energy += delta;
        if self.energy < 0 {
            debug!(serial = self.serial, energy = self.energy, "plant ran out of energy");
            return self.deactivate(grid, registry, now);
        }
        false
    }

    /// Grow at most one pending cell, the first in blueprint order whose
    /// slot is free, that touches a living cell of this plant, and that the
    /// plant can pay for.
    pub(crate) fn grow(&mut self, grid: &mut Grid, config: &SimConfig, now: u64) -> GrowthOutcome {
        if !self.alive || self.energy < config.energy_per_cell {
            return GrowthOutcome::Dormant;
        }

        for index in 0..self.cells.len() {
            let cell = &self.cells[index];
            if cell.state() != CellState::Pending || !cell.is_space_available(self.root, grid) {
                continue;
            }
            if !self.touches_living_cell(cell.position(self.root), grid) {
                continue;
            }

            let cost = match cell.kind() {
                CellKind::Normal => config.energy_per_cell,
                CellKind::Seed => config.energy_per_seed,
            };
            if self.energy < cost {
                continue;
            }

            let dx_hint = cell.dx();
            self.energy -= cost;
            return match self.set_cell_state(index, CellState::Alive, grid, now) {
                Transition::Germinated => GrowthOutcome::Germinated { index, dx_hint },
                _ => GrowthOutcome::Grew(index),
            };
        }
        GrowthOutcome::Dormant
    }

    /// Orthogonal adjacency to one of this plant's living cells, regardless of
    /// the connectivity mode used by the ground flood fill
    fn touches_living_cell(&self, pos: GridPos, grid: &Grid) -> bool {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .filter_map(|(dx, dy)| grid.get(pos.offset(dx, dy)))
            .any(|neighbor| neighbor.plant == self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    struct Fixture {
        grid: Grid,
        registry: PopulationRegistry,
        plant: Plant,
    }

    fn fixture(plan: BodyPlan, energy: i64) -> Fixture {
        let mut ids: SlotMap<PlantId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        Fixture {
            grid: Grid::new(10, 10),
            registry: PopulationRegistry::default(),
            plant: Plant::new(id, 1, GridPos::new(5, 0), energy, &plan, 0),
        }
    }

    #[test]
    fn color_is_derived_from_serial() {
        assert_eq!(ColorGenome::from_serial(0), ColorGenome { r: 0, g: 0, b: 255 });
        let c = ColorGenome::from_serial(1);
        assert_eq!((c.r, c.g), (5 * 42, 5 * 25));
        assert_eq!(c.b, 255 - ((210 + 125) / 2) as u8);
    }

    #[test]
    fn activation_grows_only_the_root() {
        let mut f = fixture(BodyPlan::basic(1, 1), 100);
        assert!(f.plant.activate(&mut f.grid, &mut f.registry, 0));
        assert!(!f.plant.activate(&mut f.grid, &mut f.registry, 0));

        assert_eq!(f.plant.living_cells(), 1);
        assert_eq!(f.plant.cells()[0].state(), CellState::Alive);
        assert!(f.plant.cells()[1..].iter().all(|c| c.state() == CellState::Pending));
        assert_eq!(f.registry.births(), 1);
        assert!(!f.grid.is_space_available(GridPos::new(5, 0)));
    }

    #[test]
    fn grows_one_cell_per_call_in_blueprint_order() {
        let mut f = fixture(BodyPlan::basic(2, 1), 100);
        f.plant.activate(&mut f.grid, &mut f.registry, 0);
        let config = SimConfig::default();

        assert_eq!(f.plant.grow(&mut f.grid, &config, 1), GrowthOutcome::Grew(1));
        assert_eq!(f.plant.grow(&mut f.grid, &config, 2), GrowthOutcome::Grew(2));
        assert_eq!(f.plant.living_cells(), 3);
        assert_eq!(f.plant.energy(), 100 - 2 * config.energy_per_cell);
    }

    #[test]
    fn skips_growth_below_cell_cost() {
        let config = SimConfig::default();
        let mut f = fixture(BodyPlan::basic(1, 1), config.energy_per_cell - 1);
        f.plant.activate(&mut f.grid, &mut f.registry, 0);
        assert_eq!(f.plant.grow(&mut f.grid, &config, 1), GrowthOutcome::Dormant);
        assert_eq!(f.plant.living_cells(), 1);
    }

    #[test]
    fn unaffordable_seed_is_passed_over() {
        let plan = BodyPlan::from_blueprints(vec![
            Blueprint::normal(0, 0),
            Blueprint::seed(0, 1),
            Blueprint::normal(1, 0),
        ])
        .unwrap();
        let config = SimConfig::default();
        let mut f = fixture(plan, config.energy_per_seed - 1);
        f.plant.activate(&mut f.grid, &mut f.registry, 0);

        assert_eq!(f.plant.grow(&mut f.grid, &config, 1), GrowthOutcome::Grew(2));
        assert_eq!(f.plant.cells()[1].state(), CellState::Pending);
    }

    #[test]
    fn seed_germinates_dead_and_reports_hint() {
        let plan =
            BodyPlan::from_blueprints(vec![Blueprint::normal(0, 0), Blueprint::seed(-1, 0)])
                .unwrap();
        let config = SimConfig::default();
        let mut f = fixture(plan, 100);
        f.plant.activate(&mut f.grid, &mut f.registry, 0);

        assert_eq!(
            f.plant.grow(&mut f.grid, &config, 1),
            GrowthOutcome::Germinated { index: 1, dx_hint: -1 }
        );
        assert_eq!(f.plant.cells()[1].state(), CellState::Dead);
        assert_eq!(f.plant.living_cells(), 1);
        assert!(f.grid.is_space_available(GridPos::new(4, 0)));
        assert_eq!(f.plant.energy(), 100 - config.energy_per_seed);
    }

    #[test]
    fn detached_blueprint_never_grows() {
        let plan =
            BodyPlan::from_blueprints(vec![Blueprint::normal(0, 0), Blueprint::normal(2, 0)])
                .unwrap();
        let config = SimConfig::default();
        let mut f = fixture(plan, 100);
        f.plant.activate(&mut f.grid, &mut f.registry, 0);
        assert_eq!(f.plant.grow(&mut f.grid, &config, 1), GrowthOutcome::Dormant);
    }

    #[test]
    fn negative_energy_kills_every_cell_immediately() {
        let mut f = fixture(BodyPlan::basic(2, 1), 100);
        let config = SimConfig::default();
        f.plant.activate(&mut f.grid, &mut f.registry, 0);
        f.plant.grow(&mut f.grid, &config, 1);
        f.plant.grow(&mut f.grid, &config, 2);

        assert!(f.plant.increment_energy(-1000, &mut f.grid, &mut f.registry, 3));
        assert!(!f.plant.is_alive());
        assert_eq!(f.plant.living_cells(), 0);
        assert_eq!(f.grid.occupied_count(), 0);
        assert_eq!(f.registry.deaths(), 1);

        // Already dead: no second death is recorded.
        assert!(!f.plant.increment_energy(-1, &mut f.grid, &mut f.registry, 3));
        assert!(!f.plant.deactivate(&mut f.grid, &mut f.registry, 3));
        assert_eq!(f.registry.deaths(), 1);
    }
}
