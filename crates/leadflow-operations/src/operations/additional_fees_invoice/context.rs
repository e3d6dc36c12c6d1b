use std::sync::Arc;

use leadflow_config::Schema;

use crate::operations::notify::RetryPolicy;
use crate::operations::poll::PollPolicy;
use crate::traits::{Notifier, RecordStore};

/// Collaborators shared by every invoicing step.
pub(crate) struct InvoiceContext<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    schema: Arc<Schema>,
    retry: RetryPolicy,
    poll: PollPolicy,
}

impl<S, N> InvoiceContext<S, N>
where
    S: RecordStore,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        schema: Arc<Schema>,
        retry: RetryPolicy,
        poll: PollPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            schema,
            retry,
            poll,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn poll(&self) -> &PollPolicy {
        &self.poll
    }
}
