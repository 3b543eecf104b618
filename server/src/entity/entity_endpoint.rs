use std::sync::Arc;

use parking_lot::Mutex;

use passthrough_shared::{ClientId, EntityError, TransactionId};

use crate::entity::{
    active_entity::ActiveEntity, entity_container::EntityContainer,
    invoke_context::InvokeContext,
};

struct EndpointIds {
    next: TransactionId,
    eldest: TransactionId,
}

/// Direct, synchronous way into an entity, bypassing connections and the
/// dispatch thread. Callers are serialized on the entity's lock and every
/// call is given a fresh transaction id.
pub struct EntityEndpoint<M, R, E> {
    container: Arc<EntityContainer<M, R, E>>,
    client: ClientId,
    ids: Mutex<EndpointIds>,
}

impl<M, R, E: ActiveEntity<M, R>> EntityEndpoint<M, R, E> {
    pub fn new(container: Arc<EntityContainer<M, R, E>>, client: ClientId) -> Self {
        Self {
            container,
            client,
            ids: Mutex::new(EndpointIds { next: 1, eldest: 1 }),
        }
    }

    pub fn invoke(&self, message: M) -> Result<R, EntityError> {
        let context = {
            let mut ids = self.ids.lock();
            let current = ids.next;
            ids.next += 1;
            InvokeContext::new(self.client, current, ids.eldest)
        };
        let (result, _) = self.container.invoke_typed(context, message);
        result
    }

    /// Mark every transaction issued so far as finished
    pub fn reset_eldest_id(&self) {
        let mut ids = self.ids.lock();
        ids.eldest = ids.next;
    }
}
