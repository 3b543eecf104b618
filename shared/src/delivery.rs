use std::sync::Arc;

use crate::types::{ClientId, ServerId};

/// The server half of the in-process transport. Accepts raw, already
/// stamped invocation bytes from a client connection.
pub trait ServerTarget: Send + Sync {
    fn server_id(&self) -> ServerId;

    /// Queue `raw` for the server's dispatch path. Must not block: callers
    /// invoke this while holding their connection's critical section.
    fn send_message_to_server(&self, origin: Arc<dyn ClientEndpoint>, raw: Vec<u8>);
}

/// The client half of the in-process transport. Receives acknowledgment
/// messages (received / completed / failed / monitor / retired) from the
/// server's dispatch thread.
pub trait ClientEndpoint: Send + Sync {
    fn client_id(&self) -> ClientId;

    fn deliver(&self, source: ServerId, raw: Vec<u8>);
}
