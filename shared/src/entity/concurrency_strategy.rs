use std::collections::BTreeSet;

/// Partition key for an entity message
pub type ConcurrencyKey = i32;

/// Key for messages that touch the entity as a whole (lifecycle, management)
pub const MANAGEMENT_KEY: ConcurrencyKey = 0;

/// Key for messages that must be ordered against every other key
pub const UNIVERSAL_KEY: ConcurrencyKey = i32::MIN;

/// Maps a message to the partition it belongs to. The passthrough server
/// never runs two invocations in parallel, so the key is only consulted to
/// decide which partitions carry state that must be copied when another
/// server is promoted.
pub trait ConcurrencyStrategy<M>: Send + Sync {
    fn concurrency_key(&self, message: &M) -> ConcurrencyKey;

    /// Keys whose state has to be synchronized to a newly promoted server
    fn keys_for_synchronization(&self) -> BTreeSet<ConcurrencyKey>;
}

/// Everything runs on the management key and no state is synchronized
#[derive(Clone, Copy, Debug, Default)]
pub struct NoConcurrencyStrategy;

impl<M> ConcurrencyStrategy<M> for NoConcurrencyStrategy {
    fn concurrency_key(&self, _message: &M) -> ConcurrencyKey {
        MANAGEMENT_KEY
    }

    fn keys_for_synchronization(&self) -> BTreeSet<ConcurrencyKey> {
        BTreeSet::new()
    }
}

/// Everything runs on the universal key
#[derive(Clone, Copy, Debug, Default)]
pub struct UniversalConcurrencyStrategy;

impl<M> ConcurrencyStrategy<M> for UniversalConcurrencyStrategy {
    fn concurrency_key(&self, _message: &M) -> ConcurrencyKey {
        UNIVERSAL_KEY
    }

    fn keys_for_synchronization(&self) -> BTreeSet<ConcurrencyKey> {
        BTreeSet::new()
    }
}

/// Partitions by a caller supplied function; `sync_keys` lists the
/// partitions that hold state
pub struct KeyedConcurrencyStrategy<F> {
    key_fn: F,
    sync_keys: BTreeSet<ConcurrencyKey>,
}

impl<F> KeyedConcurrencyStrategy<F> {
    pub fn new<I: IntoIterator<Item = ConcurrencyKey>>(key_fn: F, sync_keys: I) -> Self {
        Self {
            key_fn,
            sync_keys: sync_keys.into_iter().collect(),
        }
    }
}

impl<M, F: Fn(&M) -> ConcurrencyKey + Send + Sync> ConcurrencyStrategy<M>
    for KeyedConcurrencyStrategy<F>
{
    fn concurrency_key(&self, message: &M) -> ConcurrencyKey {
        (self.key_fn)(message)
    }

    fn keys_for_synchronization(&self) -> BTreeSet<ConcurrencyKey> {
        self.sync_keys.clone()
    }
}
