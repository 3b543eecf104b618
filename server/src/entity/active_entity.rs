use passthrough_shared::{ClientId, ConcurrencyKey, EntityError};

use crate::entity::invoke_context::InvokeContext;

/// Business logic hosted by a server process. Never entered by two threads
/// at once.
pub trait ActiveEntity<M, R>: Send {
    fn invoke(&mut self, context: &mut InvokeContext<R>, message: M) -> Result<R, EntityError>;

    /// A client attached to this entity
    fn connected(&mut self, _client: ClientId) {}

    /// A client detached from this entity
    fn disconnected(&mut self, _client: ClientId) {}

    /// Serialize the state belonging to `key` for a promoted copy
    fn synchronize_key(&self, _key: ConcurrencyKey) -> Vec<Vec<u8>> {
        Vec::new()
    }

    /// Load state produced by `synchronize_key` on another copy
    fn load_synchronized(&mut self, _key: ConcurrencyKey, _payloads: Vec<Vec<u8>>) {}
}
