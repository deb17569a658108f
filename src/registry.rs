use crate::plant::PlantId;

/// Bookkeeping for which plants take part in the tick pipeline.
///
/// Plants born during the growth pass wait in `newborns` until the pass is
/// over, and plants found dead wait in `dead` until the prune stage.
#[derive(Debug, Default, Clone)]
pub struct PopulationRegistry {
    active: Vec<PlantId>,
    newborns: Vec<PlantId>,
    dead: Vec<PlantId>,
    births: u64,
    deaths: u64,
    serials: u64,
}

impl PopulationRegistry {
    pub fn active(&self) -> &[PlantId] {
        &self.active
    }

    pub fn newborns(&self) -> &[PlantId] {
        &self.newborns
    }

    /// Active plants followed by any still-staged newborns
    pub fn tracked(&self) -> impl Iterator<Item = PlantId> + '_ {
        self.active.iter().chain(self.newborns.iter()).copied()
    }

    pub fn births(&self) -> u64 {
        self.births
    }

    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    pub fn living_count(&self) -> u64 {
        self.births - self.deaths
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.newborns.is_empty()
    }

    /// Hand out the next plant serial number
    pub(crate) fn next_serial(&mut self) -> u64 {
        self.serials += 1;
        self.serials
    }

    pub(crate) fn record_birth(&mut self) {
        self.births += 1;
    }

    pub(crate) fn record_death(&mut self) {
        self.deaths += 1;
    }

    pub(crate) fn stage_newborn(&mut self, id: PlantId) {
        self.newborns.push(id);
    }

    /// Move staged newborns to the end of the active list
    pub(crate) fn merge_newborns(&mut self) {
        self.active.append(&mut self.newborns);
    }

    pub(crate) fn stage_dead(&mut self, id: PlantId) {
        if !self.dead.contains(&id) {
            self.dead.push(id);
        }
    }

    /// Remove staged dead plants from the active list, returning them
    pub(crate) fn splice_dead(&mut self) -> Vec<PlantId> {
        let dead = std::mem::take(&mut self.dead);
        self.active.retain(|id| !dead.contains(id));
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(count: usize) -> Vec<PlantId> {
        let mut arena: SlotMap<PlantId, ()> = SlotMap::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn newborns_join_after_merge() {
        let ids = ids(3);
        let mut registry = PopulationRegistry::default();
        registry.stage_newborn(ids[0]);
        registry.merge_newborns();
        registry.stage_newborn(ids[1]);

        assert_eq!(registry.active(), &[ids[0]]);
        assert_eq!(registry.newborns(), &[ids[1]]);
        assert_eq!(registry.tracked().collect::<Vec<_>>(), vec![ids[0], ids[1]]);

        registry.merge_newborns();
        assert_eq!(registry.active(), &[ids[0], ids[1]]);
        assert!(registry.newborns().is_empty());
    }

    #[test]
    fn splice_removes_only_staged_dead() {
        let ids = ids(3);
        let mut registry = PopulationRegistry::default();
        for &id in &ids {
            registry.stage_newborn(id);
        }
        registry.merge_newborns();

        registry.stage_dead(ids[1]);
        registry.stage_dead(ids[1]);
        assert_eq!(registry.splice_dead(), vec![ids[1]]);
        assert_eq!(registry.active(), &[ids[0], ids[2]]);
        assert!(registry.splice_dead().is_empty());
    }

    #[test]
    fn living_count_tracks_counters() {
        let mut registry = PopulationRegistry::default();
        registry.record_birth();
        registry.record_birth();
        registry.record_death();
        assert_eq!(registry.births(), 2);
        assert_eq!(registry.deaths(), 1);
        assert_eq!(registry.living_count(), 1);
        assert_eq!(registry.next_serial(), 1);
        assert_eq!(registry.next_serial(), 2);
    }
}
