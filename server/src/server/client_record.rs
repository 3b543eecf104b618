use std::collections::BTreeMap;

use passthrough_shared::{EntityError, TransactionId};

pub type CachedReply = Result<Vec<u8>, EntityError>;

/// What a server remembers about one client's transactions
#[derive(Clone, Default)]
pub struct ClientRecord {
    last_transaction_id: TransactionId,
    oldest_transaction_id: TransactionId,
    replies: BTreeMap<TransactionId, CachedReply>,
}

impl ClientRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note an incoming transaction. Cached replies below the client's
    /// oldest in-flight id are no longer reachable and are dropped.
    pub fn observe(&mut self, transaction_id: TransactionId, oldest_transaction_id: TransactionId) {
        self.last_transaction_id = self.last_transaction_id.max(transaction_id);
        if oldest_transaction_id > self.oldest_transaction_id {
            self.oldest_transaction_id = oldest_transaction_id;
            self.replies = self.replies.split_off(&oldest_transaction_id);
        }
    }

    pub fn has_seen(&self, transaction_id: TransactionId) -> bool {
        transaction_id <= self.last_transaction_id
    }

    pub fn cached_reply(&self, transaction_id: TransactionId) -> Option<&CachedReply> {
        self.replies.get(&transaction_id)
    }

    pub fn cache_reply(&mut self, transaction_id: TransactionId, reply: CachedReply) {
        if transaction_id >= self.oldest_transaction_id {
            self.replies.insert(transaction_id, reply);
        }
    }

    pub fn cached_reply_count(&self) -> usize {
        self.replies.len()
    }
}
