//! Sparse world store.
//!
//! Two maps, composed at query time:
//!   - `overrides` — cells placed by the user. Persisted.
//!   - `generated` — cache of generator output. Never persisted; anything in
//!     it can be recomputed, so it is simply dropped when it grows too big.
//!
//! The origin never appears in either map.

use std::collections::HashMap;

use crate::domain::cell::{Cell, Coord, ORIGIN};
use crate::domain::generator;

pub const DEFAULT_CACHE_LIMIT: usize = 1_000_000;

#[derive(Clone, Debug)]
pub struct WorldStore {
    overrides: HashMap<Coord, Cell>,
    generated: HashMap<Coord, Cell>,
    cache_limit: usize,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::with_cache_limit(DEFAULT_CACHE_LIMIT)
    }

    pub fn with_cache_limit(cache_limit: usize) -> Self {
        WorldStore {
            overrides: HashMap::new(),
            generated: HashMap::new(),
            cache_limit: cache_limit.max(1),
        }
    }

    /// Sentinel, then override, then (cached) generator output.
    pub fn get(&mut self, pos: Coord) -> Cell {
        if pos == ORIGIN {
            return Cell::SENTINEL;
        }
        if let Some(cell) = self.overrides.get(&pos) {
            return *cell;
        }
        if let Some(cell) = self.generated.get(&pos) {
            return *cell;
        }
        if self.generated.len() >= self.cache_limit {
            self.generated.clear();
        }
        let cell = generator::generate(pos);
        self.generated.insert(pos, cell);
        cell
    }

    /// Record an override. Returns false (and changes nothing) at the origin.
    pub fn set(&mut self, pos: Coord, cell: Cell) -> bool {
        if pos == ORIGIN {
            return false;
        }
        self.overrides.insert(pos, cell);
        true
    }

    #[allow(dead_code)]
    pub fn override_at(&self, pos: Coord) -> Option<&Cell> {
        self.overrides.get(&pos)
    }

    pub fn overrides(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        self.overrides.iter().map(|(&pos, &cell)| (pos, cell))
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    #[cfg(test)]
    fn cached_count(&self) -> usize {
        self.generated.len()
    }
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Rgb;

    #[test]
    fn origin_is_always_the_sentinel() {
        let mut store = WorldStore::new();
        assert!(!store.set(ORIGIN, Cell::new('x', Rgb::WHITE)));
        assert_eq!(store.get(ORIGIN), Cell::SENTINEL);
        assert!(store.override_at(ORIGIN).is_none());
        assert_eq!(store.override_count(), 0);
    }

    #[test]
    fn override_beats_generator() {
        let mut store = WorldStore::new();
        let before = store.get((5, 5));
        let a = Cell::new('A', Rgb(9, 9, 9));
        assert_ne!(before, a);
        store.set((5, 5), a);
        assert_eq!(store.get((5, 5)), a);
    }

    #[test]
    fn overriding_again_replaces() {
        let mut store = WorldStore::new();
        store.set((-1, 7), Cell::new('a', Rgb::WHITE));
        store.set((-1, 7), Cell::new('b', Rgb::CYAN));
        assert_eq!(store.get((-1, 7)), Cell::new('b', Rgb::CYAN));
        assert_eq!(store.override_count(), 1);
    }

    #[test]
    fn generated_cells_are_stable_and_match_generator() {
        let mut store = WorldStore::new();
        for x in -30..30 {
            for y in -30..30 {
                if (x, y) == ORIGIN {
                    continue;
                }
                let first = store.get((x, y));
                assert_eq!(first, store.get((x, y)));
                assert_eq!(first, generator::generate((x, y)));
            }
        }
        assert_eq!(store.override_count(), 0);
    }

    #[test]
    fn far_coordinates_need_no_allocation_between_them() {
        let mut store = WorldStore::new();
        store.set((i64::MAX, i64::MIN), Cell::new('z', Rgb::WHITE));
        store.set((-4_000_000_000, 12), Cell::new('y', Rgb::WHITE));
        assert_eq!(store.get((i64::MAX, i64::MIN)).glyph, 'z');
        assert_eq!(store.override_count(), 2);
    }

    #[test]
    fn cache_limit_drops_only_generated_cells() {
        let mut store = WorldStore::with_cache_limit(10);
        store.set((1, 1), Cell::new('o', Rgb::WHITE));
        let reference: Vec<Cell> = (2..40).map(|x| generator::generate((x, 0))).collect();
        let seen: Vec<Cell> = (2..40).map(|x| store.get((x, 0))).collect();
        assert_eq!(seen, reference);
        assert!(store.cached_count() <= 10);
        assert_eq!(store.get((1, 1)).glyph, 'o');
    }
}
