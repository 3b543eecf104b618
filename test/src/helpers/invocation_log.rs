use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;

use passthrough_shared::{ClientId, TransactionId};

use crate::helpers::ledger_entity::LedgerMessage;

/// One call into a ledger entity, as the entity saw it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRecord {
    pub server: u64,
    pub client: ClientId,
    pub transaction_id: TransactionId,
    pub oldest_transaction_id: TransactionId,
    pub message: LedgerMessage,
}

#[derive(Default)]
struct LogInner {
    records: Mutex<Vec<InvocationRecord>>,
    inside: AtomicBool,
    overlaps: AtomicUsize,
}

/// Shared record of every invocation served by the ledger entities of one
/// cluster. Owned by the harness and handed to each entity it creates.
#[derive(Clone, Default)]
pub struct InvocationLog {
    inner: Arc<LogInner>,
}

/// Marks an entity as busy until dropped
pub struct EntryGuard<'a> {
    log: &'a InvocationLog,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.log.inner.inside.store(false, Ordering::SeqCst);
    }
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that an entity started serving an invocation. Entering while
    /// another invocation is still inside counts as an overlap.
    pub fn enter(&self) -> EntryGuard<'_> {
        if self.inner.inside.swap(true, Ordering::SeqCst) {
            self.inner.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        EntryGuard { log: self }
    }

    pub fn overlaps(&self) -> usize {
        self.inner.overlaps.load(Ordering::SeqCst)
    }

    pub fn record(&self, record: InvocationRecord) {
        self.inner.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<InvocationRecord> {
        self.inner.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_client(&self, client: ClientId) -> Vec<InvocationRecord> {
        self.inner
            .records
            .lock()
            .iter()
            .filter(|record| record.client == client)
            .cloned()
            .collect()
    }
}
