//! In-memory store implementation.
//!
//! Suitable for testing, development, or scenarios where persistence is
//! handled externally — the whole row set can be saved to and loaded from
//! a JSON file.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::Result;

use super::Store;
use super::errors::StoreError;
use super::select::{Predicate, Row, RowId, Select, Value};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Inner {
    rows: BTreeMap<RowId, BTreeMap<String, Value>>,
    next_id: RowId,
}

/// A simple in-memory [`Store`] over a `BTreeMap`, with snapshot-based
/// transactions: `begin` clones the current state, `rollback` restores it,
/// `commit` drops it.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    snapshot: RwLock<Option<Inner>>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        MemoryStore {
            inner: RwLock::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
            snapshot: RwLock::new(None),
        }
    }

    /// The number of rows currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().rows.len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every row in id order. Diagnostic helper for audits and tests.
    pub fn all_rows(&self) -> Vec<Row> {
        let inner = self.inner.read().unwrap();
        inner
            .rows
            .iter()
            .map(|(&id, values)| Row {
                id,
                values: values.clone(),
            })
            .collect()
    }

    /// Saves the entire row set to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let inner = self.inner.read().unwrap();
        let json = serde_json::to_string(&*inner).map_err(StoreError::from)?;
        std::fs::write(path, json).map_err(StoreError::from)?;
        Ok(())
    }

    /// Loads a store previously written by [`MemoryStore::save_to_file`].
    ///
    /// A missing file yields a new, empty store.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(MemoryStore::new());
        }
        let json = std::fs::read_to_string(path).map_err(StoreError::from)?;
        let inner: Inner = serde_json::from_str(&json).map_err(StoreError::from)?;
        Ok(MemoryStore {
            inner: RwLock::new(inner),
            snapshot: RwLock::new(None),
        })
    }

    fn sort_rows(rows: &mut [Row], query: &Select) {
        rows.sort_by(|a, b| {
            for key in &query.order {
                let null = Value::Null;
                let left = a.get(&key.column).unwrap_or(&null);
                let right = b.get(&key.column).unwrap_or(&null);
                let ordering = left.compare(right).unwrap_or(std::cmp::Ordering::Equal);
                let ordering = if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            a.id.cmp(&b.id)
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write().unwrap();
        if snapshot.is_some() {
            return Err(StoreError::TransactionAlreadyActive.into());
        }
        *snapshot = Some(self.inner.read().unwrap().clone());
        tracing::trace!("transaction opened");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write().unwrap();
        if snapshot.take().is_none() {
            return Err(StoreError::NoActiveTransaction.into());
        }
        tracing::trace!("transaction committed");
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write().unwrap();
        match snapshot.take() {
            Some(saved) => {
                *self.inner.write().unwrap() = saved;
                tracing::trace!("transaction rolled back");
                Ok(())
            }
            None => Err(StoreError::NoActiveTransaction.into()),
        }
    }

    fn select(&self, query: &Select) -> Result<Vec<Row>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<Row> = inner
            .rows
            .iter()
            .map(|(&id, values)| Row {
                id,
                values: values.clone(),
            })
            .filter(|row| query.predicate.as_ref().is_none_or(|p| p.eval(row)))
            .collect();
        Self::sort_rows(&mut rows, query);
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn row(&self, id: RowId) -> Result<Row> {
        let inner = self.inner.read().unwrap();
        inner
            .rows
            .get(&id)
            .map(|values| Row {
                id,
                values: values.clone(),
            })
            .ok_or_else(|| StoreError::RowNotFound { id }.into())
    }

    fn insert(&self, values: &[(String, Value)]) -> Result<RowId> {
        let mut inner = self.inner.write().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .rows
            .insert(id, values.iter().cloned().collect());
        Ok(id)
    }

    fn update_row(&self, id: RowId, assignments: &[(String, Value)]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let row = inner
            .rows
            .get_mut(&id)
            .ok_or(StoreError::RowNotFound { id })?;
        for (column, value) in assignments {
            row.insert(column.clone(), value.clone());
        }
        Ok(())
    }

    fn delete_where(&self, predicate: &Predicate) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let doomed: Vec<RowId> = inner
            .rows
            .iter()
            .filter(|&(&id, values)| {
                predicate.eval(&Row {
                    id,
                    values: values.clone(),
                })
            })
            .map(|(&id, _)| id)
            .collect();
        for id in &doomed {
            inner.rows.remove(id);
        }
        Ok(doomed.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
