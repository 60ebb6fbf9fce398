//! In-memory record repository backing the reference server

use crate::core::entity::Record;
use crate::core::query::{Criteria, PredicateOp, Sort, SortDirection};
use anyhow::{Result, anyhow};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

/// Thread-safe store of records keyed by their server-assigned id
///
/// Ids are assigned sequentially from 1. Iteration order is id order, which
/// is also the default list order.
pub struct InMemoryRepository<R: Record> {
    records: RwLock<BTreeMap<i64, R>>,
    next_id: AtomicI64,
}

impl<R: Record> InMemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store a new record and return it with its assigned id
    pub fn insert(&self, mut record: R) -> Result<R> {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        record.set_id(id);

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        records.insert(id, record.clone());

        Ok(record)
    }

    pub fn get(&self, id: i64) -> Result<Option<R>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.get(&id).cloned())
    }

    pub fn contains(&self, id: i64) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Replace the record stored under `id`
    pub fn replace(&self, id: i64, mut record: R) -> Result<R> {
        record.set_id(id);

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        records
            .get_mut(&id)
            .ok_or_else(|| anyhow!("{} {} not found", R::resource_name_singular(), id))?;
        records.insert(id, record.clone());

        Ok(record)
    }

    /// The stored record with every non-null field of `patch` copied onto it
    ///
    /// Nothing is written; returns `None` when no record has this id.
    pub fn merged(&self, id: i64, patch: &Value) -> Result<Option<R>> {
        let Some(existing) = self.get(id)? else {
            return Ok(None);
        };

        let mut merged = serde_json::to_value(&existing)?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut merged, patch) {
            for (key, value) in changes {
                if !value.is_null() && key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(Some(serde_json::from_value(merged)?))
    }

    /// Remove a record; returns whether it existed
    pub fn delete(&self, id: i64) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(records.remove(&id).is_some())
    }

    /// Records matching every predicate, in id order
    pub fn find(&self, criteria: &Criteria) -> Result<Vec<R>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records
            .values()
            .filter(|record| satisfies(*record, criteria))
            .cloned()
            .collect())
    }

    pub fn count(&self, criteria: &Criteria) -> Result<usize> {
        Ok(self.find(criteria)?.len())
    }

    /// One page of matching records plus the total number of matches
    pub fn page(
        &self,
        criteria: &Criteria,
        sort: Option<&Sort>,
        page: usize,
        size: usize,
    ) -> Result<(Vec<R>, usize)> {
        let mut matching = self.find(criteria)?;
        let total = matching.len();

        if let Some(sort) = sort {
            // Stable sort keeps id order among equal keys; unset values first
            matching.sort_by(|a, b| {
                let ordering = match (a.field_value(&sort.field), b.field_value(&sort.field)) {
                    (Some(x), Some(y)) => x.compare(&y),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let items = matching
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();
        Ok((items, total))
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn satisfies<R: Record>(record: &R, criteria: &Criteria) -> bool {
    criteria.predicates().iter().all(|predicate| {
        record
            .field_value(&predicate.field)
            .is_some_and(|value| match predicate.op {
                PredicateOp::Equals => value.equals_raw(&predicate.value),
                PredicateOp::Contains => value.contains_raw(&predicate.value),
            })
    })
}
