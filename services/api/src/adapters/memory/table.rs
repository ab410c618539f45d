//! services/api/src/adapters/memory/table.rs
//!
//! An id-keyed table with its own monotonically increasing id counter.

use std::collections::BTreeMap;

pub(crate) struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T: Clone> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    /// Rows in id order, which is also creation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.rows.values().find(|row| predicate(row))
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    /// Assigns the next id, builds the row from it and stores it.
    /// Ids are never reused, even if rows were ever removed.
    pub fn insert(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    /// Applies `patch` to the stored row and returns the new snapshot.
    pub fn update(&mut self, id: i64, patch: impl FnOnce(&mut T)) -> Option<T> {
        let row = self.rows.get_mut(&id)?;
        patch(row);
        Some(row.clone())
    }

    pub fn update_where(&mut self, predicate: impl Fn(&T) -> bool, patch: impl Fn(&mut T)) {
        for row in self.rows.values_mut().filter(|row| predicate(row)) {
            patch(row);
        }
    }
}
