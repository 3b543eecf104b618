use std::{collections::BTreeSet, sync::Arc};

use log::{trace, warn};
use parking_lot::Mutex;

use passthrough_shared::{
    ClientId, ConcurrencyKey, ConcurrencyStrategy, EntityError, MessageCodec, MessageKey,
    TransactionId,
};

use crate::entity::{active_entity::ActiveEntity, invoke_context::InvokeContext};

/// One raw invocation handed to an entity by the dispatch thread
pub struct DispatchRequest<'a> {
    pub client: ClientId,
    pub transaction_id: TransactionId,
    pub oldest_transaction_id: TransactionId,
    pub payload: &'a [u8],
}

/// What an invocation produced, already encoded
pub struct DispatchOutcome {
    pub result: Result<Vec<u8>, EntityError>,
    pub intermediates: Vec<Vec<u8>>,
    pub deferred_until: Option<MessageKey>,
}

/// Type-erased view of an entity container, so that a server process does
/// not need to know the entity's message types
pub trait EntityDispatcher: Send + Sync {
    fn dispatch(&self, request: DispatchRequest<'_>) -> DispatchOutcome;

    fn connected(&self, client: ClientId);

    fn disconnected(&self, client: ClientId);

    fn synchronization_keys(&self) -> BTreeSet<ConcurrencyKey>;

    fn synchronize_key(&self, key: ConcurrencyKey) -> Vec<Vec<u8>>;

    fn load_synchronized(&self, key: ConcurrencyKey, payloads: Vec<Vec<u8>>);
}

/// Hosts one active entity behind a mutex. Decoding the message, running
/// the business logic and encoding the response all happen inside that
/// single critical section.
pub struct EntityContainer<M, R, E> {
    entity: Mutex<E>,
    codec: Arc<dyn MessageCodec<M, R>>,
    strategy: Arc<dyn ConcurrencyStrategy<M>>,
}

impl<M, R, E: ActiveEntity<M, R>> EntityContainer<M, R, E> {
    pub fn new(
        entity: E,
        codec: Arc<dyn MessageCodec<M, R>>,
        strategy: Arc<dyn ConcurrencyStrategy<M>>,
    ) -> Self {
        Self {
            entity: Mutex::new(entity),
            codec,
            strategy,
        }
    }

    pub fn codec(&self) -> &Arc<dyn MessageCodec<M, R>> {
        &self.codec
    }

    /// Run the entity on a typed message, bypassing the codec. Returns the
    /// context so the caller can see deferrals and intermediates.
    pub fn invoke_typed(
        &self,
        mut context: InvokeContext<R>,
        message: M,
    ) -> (Result<R, EntityError>, InvokeContext<R>) {
        let mut entity = self.entity.lock();
        let result = entity.invoke(&mut context, message);
        (result, context)
    }

    /// Inspect the entity under its lock
    pub fn with_entity<T>(&self, f: impl FnOnce(&E) -> T) -> T {
        f(&self.entity.lock())
    }
}

impl<M, R, E: ActiveEntity<M, R>> EntityDispatcher for EntityContainer<M, R, E> {
    fn dispatch(&self, request: DispatchRequest<'_>) -> DispatchOutcome {
        let mut entity = self.entity.lock();

        let message = match self.codec.decode_message(request.payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    "Failed to decode transaction {} from {:?}: {}",
                    request.transaction_id, request.client, e
                );
                return DispatchOutcome {
                    result: Err(EntityError::Codec(e)),
                    intermediates: Vec::new(),
                    deferred_until: None,
                };
            }
        };
        trace!(
            "Invoking transaction {} on concurrency key {}",
            request.transaction_id,
            self.strategy.concurrency_key(&message)
        );

        let mut context = InvokeContext::new(
            request.client,
            request.transaction_id,
            request.oldest_transaction_id,
        );
        let result = entity
            .invoke(&mut context, message)
            .and_then(|response| {
                self.codec
                    .encode_response(&response)
                    .map_err(EntityError::from)
            });

        let (deferred_until, intermediates) = context.into_parts();
        let intermediates = intermediates
            .iter()
            .filter_map(|intermediate| match self.codec.encode_response(intermediate) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Dropping unencodable intermediate response: {}", e);
                    None
                }
            })
            .collect();

        DispatchOutcome {
            result,
            intermediates,
            deferred_until,
        }
    }

    fn connected(&self, client: ClientId) {
        self.entity.lock().connected(client);
    }

    fn disconnected(&self, client: ClientId) {
        self.entity.lock().disconnected(client);
    }

    fn synchronization_keys(&self) -> BTreeSet<ConcurrencyKey> {
        self.strategy.keys_for_synchronization()
    }

    fn synchronize_key(&self, key: ConcurrencyKey) -> Vec<Vec<u8>> {
        self.entity.lock().synchronize_key(key)
    }

    fn load_synchronized(&self, key: ConcurrencyKey, payloads: Vec<Vec<u8>>) {
        self.entity.lock().load_synchronized(key, payloads);
    }
}
