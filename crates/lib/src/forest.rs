//! The forest façade: a store and a schema bound together.

use std::sync::Arc;

use crate::query::TreeQuery;
use crate::record::NodeRecord;
use crate::schema::TreeSchema;
use crate::store::{CmpOp, Predicate, Select, Store};
use crate::{Result, engine::MutationEngine};

/// Entry point for working with one node table.
///
/// A `Forest` hands out fresh records, resolves paths, and lists roots;
/// everything else happens through the records themselves.
#[derive(Clone)]
pub struct Forest {
    store: Arc<dyn Store>,
    schema: Arc<TreeSchema>,
}

impl Forest {
    /// Binds a store to a schema.
    pub fn new(store: Arc<dyn Store>, schema: TreeSchema) -> Self {
        Forest {
            store,
            schema: Arc::new(schema),
        }
    }

    /// Binds a store to the default schema.
    pub fn with_defaults(store: Arc<dyn Store>) -> Self {
        Forest::new(store, TreeSchema::default())
    }

    /// A fresh, unpersisted record bound to this forest.
    pub fn node(&self) -> NodeRecord {
        NodeRecord::new(Arc::clone(&self.store), Arc::clone(&self.schema))
    }

    /// The record at a dotted path, if any.
    pub fn find(&self, path: &str) -> Result<Option<NodeRecord>> {
        let engine = MutationEngine::new(Arc::clone(&self.store), Arc::clone(&self.schema));
        match engine.resolve(crate::engine::Target::Path(path)) {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Every root, in sibling order.
    pub fn roots(&self) -> Result<Vec<NodeRecord>> {
        TreeQuery::unbound(Arc::clone(&self.store), Arc::clone(&self.schema))
            .roots()
            .all()
    }

    /// The total number of nodes in the forest.
    pub fn count(&self) -> Result<usize> {
        // Every node has level >= 1; this counts them all.
        let select = Select::filtered(Predicate::cmp(&self.schema.level_column, CmpOp::Ge, 1i64));
        Ok(self.store.select(&select)?.len())
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The schema in effect.
    pub fn schema(&self) -> &Arc<TreeSchema> {
        &self.schema
    }
}
