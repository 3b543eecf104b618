use std::sync::Arc;

use log::{debug, trace, warn};

use passthrough_shared::{
    ClientEndpoint, ClientId, EntityError, MessageKind, ServerId, TransactionId, WireMessage,
};

use crate::{
    ack::ack_processor::AckProcessor,
    connection::connection_state::{ConnectionPhase, ConnectionState},
};

/// Return path of a connection. Decodes acknowledgment messages coming
/// from the server's dispatch thread and drives the matching waiter.
pub struct ClientInbox {
    client_id: ClientId,
    state: Arc<ConnectionState>,
}

impl ClientInbox {
    pub fn new(client_id: ClientId, state: Arc<ConnectionState>) -> Self {
        Self { client_id, state }
    }

    fn waiter(&self, transaction_id: TransactionId, remove: bool) -> Option<Arc<dyn AckProcessor>> {
        let result = if remove {
            self.state.try_remove_waiter_for_transaction(transaction_id)
        } else {
            self.state.try_get_waiter_for_transaction(transaction_id)
        };
        match result {
            Ok(waiter) => Some(waiter),
            Err(_) if self.state.phase() == ConnectionPhase::Closed => {
                debug!(
                    "Connection closed, dropping acknowledgment for transaction {}",
                    transaction_id
                );
                None
            }
            Err(e) => panic!("ConnectionState error: {}", e),
        }
    }
}

impl ClientEndpoint for ClientInbox {
    fn client_id(&self) -> ClientId {
        self.client_id
    }

    fn deliver(&self, source: ServerId, raw: Vec<u8>) {
        if !self.state.is_connected(source) {
            warn!(
                "Client {:?} dropping delivery from stale server {:?}",
                self.client_id, source
            );
            return;
        }
        let Ok(message) = WireMessage::from_bytes(&raw) else {
            warn!("Client {:?} received an undecodable message", self.client_id);
            return;
        };
        let transaction_id = message.transaction_id;
        trace!("Transaction {} {:?}", transaction_id, message.kind);

        match message.kind {
            MessageKind::Received => {
                if let Some(waiter) = self.waiter(transaction_id, false) {
                    waiter.handle_ack();
                }
            }
            MessageKind::Completed => {
                if let Some(waiter) = self.waiter(transaction_id, false) {
                    waiter.handle_complete(Ok(message.payload));
                }
            }
            MessageKind::Failed => {
                let failure = message.failure().unwrap_or_else(|_| {
                    EntityError::server("undecodable failure from server")
                });
                if let Some(waiter) = self.waiter(transaction_id, false) {
                    waiter.handle_complete(Err(failure));
                }
            }
            MessageKind::Monitor => {
                if let Some(waiter) = self.waiter(transaction_id, false) {
                    waiter.handle_monitor(message.payload);
                }
            }
            MessageKind::Retired => {
                if let Some(waiter) = self.waiter(transaction_id, true) {
                    waiter.handle_retire();
                }
            }
            kind => warn!("Client {:?} received unexpected {:?}", self.client_id, kind),
        }
    }
}
