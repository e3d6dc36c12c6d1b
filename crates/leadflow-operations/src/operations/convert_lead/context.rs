use std::sync::Arc;

use leadflow_config::Schema;

use crate::traits::RecordStore;

/// Collaborators shared by every conversion saga step.
pub(crate) struct ConversionContext<S> {
    store: Arc<S>,
    schema: Arc<Schema>,
}

impl<S> Clone for ConversionContext<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<S> ConversionContext<S>
where
    S: RecordStore,
{
    pub fn new(store: Arc<S>, schema: Arc<Schema>) -> Self {
        Self { store, schema }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
