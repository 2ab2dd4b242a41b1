// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Offset-keyed map
//!
//! An ordered map from text offsets to values with the lookups the document
//! index needs: exact and predecessor (`floor`, `lower`) search, bulk
//! shifting of every key at or after an edit point, and eviction of the
//! keys on either side of a cut.

use std::collections::BTreeMap;
use std::ops::Bound;

/// Ordered map keyed by text offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetMap<T> {
    entries: BTreeMap<usize, T>,
}

impl<T> Default for OffsetMap<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> OffsetMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The value stored exactly at `offset`
    pub fn find(&self, offset: usize) -> Option<&T> {
        self.entries.get(&offset)
    }

    pub fn find_mut(&mut self, offset: usize) -> Option<&mut T> {
        self.entries.get_mut(&offset)
    }

    /// The entry with the greatest offset `<= offset`
    pub fn floor(&self, offset: usize) -> Option<(usize, &T)> {
        self.entries
            .range(..=offset)
            .next_back()
            .map(|(key, value)| (*key, value))
    }

    /// The entry with the greatest offset `< offset`
    pub fn lower(&self, offset: usize) -> Option<(usize, &T)> {
        self.entries
            .range(..offset)
            .next_back()
            .map(|(key, value)| (*key, value))
    }

    /// Store `value` at `offset`, returning the value it replaces
    pub fn put(&mut self, offset: usize, value: T) -> Option<T> {
        self.entries.insert(offset, value)
    }

    pub fn remove_at(&mut self, offset: usize) -> Option<T> {
        self.entries.remove(&offset)
    }

    /// Shift every key `>= position` by `delta`
    ///
    /// With a negative delta the shifted keys slide over
    /// `[position + delta, position)`; entries left in that region are
    /// dropped. A negative delta is clamped to `-position`.
    pub fn apply_offset(&mut self, position: usize, delta: isize) {
        let delta = delta.max(-(position.min(isize::MAX as usize) as isize));
        if delta == 0 {
            return;
        }
        let tail = self.entries.split_off(&position);
        if delta < 0 {
            let floor = position.saturating_sub(delta.unsigned_abs());
            drop(self.entries.split_off(&floor));
        }
        self.entries.extend(
            tail.into_iter()
                .map(|(offset, value)| (offset.saturating_add_signed(delta), value)),
        );
    }

    /// Remove the entries before `position`
    pub fn remove_before(&mut self, position: usize) -> Vec<(usize, T)> {
        let tail = self.entries.split_off(&position);
        std::mem::replace(&mut self.entries, tail).into_iter().collect()
    }

    /// Remove the entries at or after `position`
    pub fn remove_after(&mut self, position: usize) -> Vec<(usize, T)> {
        self.entries.split_off(&position).into_iter().collect()
    }

    /// Entries in offset order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &T)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Entries whose offset lies in `[from, to)`
    pub fn range(&self, from: usize, to: usize) -> impl DoubleEndedIterator<Item = (usize, &T)> + '_ {
        self.entries
            .range((Bound::Included(from), Bound::Excluded(to.max(from))))
            .map(|(key, value)| (*key, value))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.entries.values()
    }
}

impl<T> FromIterator<(usize, T)> for OffsetMap<T> {
    fn from_iter<I: IntoIterator<Item = (usize, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sorted vector model used to cross-check the map
    #[derive(Default)]
    struct Naive(Vec<(usize, u32)>);

    impl Naive {
        fn put(&mut self, offset: usize, value: u32) {
            self.0.retain(|(k, _)| *k != offset);
            self.0.push((offset, value));
            self.0.sort();
        }

        fn floor(&self, offset: usize) -> Option<(usize, u32)> {
            self.0.iter().rev().find(|(k, _)| *k <= offset).copied()
        }

        fn lower(&self, offset: usize) -> Option<(usize, u32)> {
            self.0.iter().rev().find(|(k, _)| *k < offset).copied()
        }

        fn apply_offset(&mut self, position: usize, delta: isize) {
            let delta = delta.max(-(position as isize));
            let floor = position.saturating_add_signed(delta.min(0));
            self.0.retain(|(k, _)| *k >= position || *k < floor);
            for (k, _) in &mut self.0 {
                if *k >= position {
                    *k = k.saturating_add_signed(delta);
                }
            }
        }

        fn remove_before(&mut self, position: usize) {
            self.0.retain(|(k, _)| *k >= position);
        }

        fn remove_after(&mut self, position: usize) {
            self.0.retain(|(k, _)| *k < position);
        }
    }

    fn assert_same(map: &OffsetMap<u32>, naive: &Naive) {
        let actual: Vec<_> = map.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(actual, naive.0);
    }

    /// Deterministic xorshift so the operation mix is reproducible
    fn next(seed: &mut u64) -> u64 {
        *seed ^= *seed << 13;
        *seed ^= *seed >> 7;
        *seed ^= *seed << 17;
        *seed
    }

    #[test]
    fn test_matches_naive_model() {
        let mut seed = 0x2545_f491_4f6c_dd1d;
        let mut map = OffsetMap::new();
        let mut naive = Naive::default();
        for step in 0..2000u32 {
            let offset = (next(&mut seed) % 200) as usize;
            match next(&mut seed) % 6 {
                0 | 1 => {
                    map.put(offset, step);
                    naive.put(offset, step);
                }
                2 => {
                    let delta = (next(&mut seed) % 21) as isize - 10;
                    map.apply_offset(offset, delta);
                    naive.apply_offset(offset, delta);
                }
                // cuts near the ends keep the map from emptying out
                3 => {
                    let position = offset / 10;
                    map.remove_before(position);
                    naive.remove_before(position);
                }
                4 => {
                    let position = 190 + offset / 20;
                    map.remove_after(position);
                    naive.remove_after(position);
                }
                _ => {
                    assert_eq!(map.floor(offset).map(|(k, v)| (k, *v)), naive.floor(offset));
                    assert_eq!(map.lower(offset).map(|(k, v)| (k, *v)), naive.lower(offset));
                }
            }
            assert_same(&map, &naive);
        }
    }

    #[test]
    fn test_floor_and_lower() {
        let map: OffsetMap<&str> = [(10, "a"), (20, "b")].into_iter().collect();
        assert_eq!(map.floor(9), None);
        assert_eq!(map.floor(10), Some((10, &"a")));
        assert_eq!(map.floor(19), Some((10, &"a")));
        assert_eq!(map.floor(25), Some((20, &"b")));
        assert_eq!(map.lower(10), None);
        assert_eq!(map.lower(11), Some((10, &"a")));
    }

    #[test]
    fn test_apply_offset_shifts_tail_only() {
        let mut map: OffsetMap<char> = [(0, 'a'), (5, 'b'), (9, 'c')].into_iter().collect();
        map.apply_offset(5, 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![0, 8, 12]);
        map.apply_offset(8, -2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![0, 6, 10]);
    }

    #[test]
    fn test_negative_offset_drops_overrun_entries() {
        let mut map: OffsetMap<char> = [(0, 'a'), (4, 'b'), (6, 'c')].into_iter().collect();
        map.apply_offset(6, -3);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(0, &'a'), (3, &'c')]);
        map.apply_offset(3, -10);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(0, &'c')]);
    }

    #[test]
    fn test_remove_before_and_after() {
        let build = || -> OffsetMap<u8> { [(1, 1), (5, 5), (9, 9)].into_iter().collect() };

        let mut map = build();
        assert_eq!(map.remove_before(5), vec![(1, 1)]);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![5, 9]);

        let mut map = build();
        assert_eq!(map.remove_after(5), vec![(5, 5), (9, 9)]);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![1]);

        let mut map = build();
        assert!(map.remove_before(0).is_empty());
        assert!(map.remove_after(10).is_empty());
        assert_eq!(map.range(0, 10).count(), 3);
    }
}
