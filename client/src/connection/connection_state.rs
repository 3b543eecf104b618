use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use parking_lot::{Condvar, Mutex};

use passthrough_shared::{
    ClientEndpoint, MessageCodec, ServerId, ServerTarget, TransactionId, WireMessage,
};

use crate::{
    ack::{
        ack_processor::AckProcessor,
        ack_stages::AckStages,
        ack_waiter::{AckWaiter, RawMonitor},
        async_ack_processor::AsyncAckProcessor,
    },
    error::ConnectionStateError,
    invocation::invocation_callback::InvocationCallback,
};

enum ServerTargetState {
    Attached(Arc<dyn ServerTarget>),
    Disconnected,
    Reconnecting(Arc<dyn ServerTarget>),
}

/// Where a connection currently is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    Attached,
    Disconnected,
    Reconnecting,
    Closed,
}

struct StateInner {
    target: ServerTargetState,
    closed: bool,
    next_transaction_id: TransactionId,
    in_flight: HashMap<TransactionId, Arc<dyn AckProcessor>>,
}

impl StateInner {
    fn oldest_transaction_id(&self) -> TransactionId {
        self.in_flight
            .keys()
            .min()
            .copied()
            .unwrap_or(self.next_transaction_id)
    }

    fn create_and_send(
        &mut self,
        target: &Arc<dyn ServerTarget>,
        origin: Arc<dyn ClientEndpoint>,
        mut message: WireMessage,
        oldest_transaction_id: TransactionId,
        waiter: Arc<dyn AckProcessor>,
    ) -> TransactionId {
        let transaction_id = self.next_transaction_id;
        self.next_transaction_id += 1;

        message.set_transaction_tracking(transaction_id, oldest_transaction_id);
        self.in_flight.insert(transaction_id, waiter.clone());

        let raw = message.to_bytes();
        waiter.save_raw_message_for_resend(raw.clone());
        debug!(
            "Sending {:?} transaction {} (oldest {}) to server {:?}",
            message.kind,
            transaction_id,
            oldest_transaction_id,
            target.server_id()
        );
        target.send_message_to_server(origin, raw);
        transaction_id
    }
}

/// Per-connection transaction bookkeeping: assigns transaction ids, owns the
/// in-flight table and tracks which server the connection talks to. All
/// mutation happens under one mutex; senders park on a condition variable
/// while no server is attached.
pub struct ConnectionState {
    inner: Mutex<StateInner>,
    target_changed: Condvar,
}

impl ConnectionState {
    pub fn new(server: Arc<dyn ServerTarget>) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                target: ServerTargetState::Attached(server),
                closed: false,
                next_transaction_id: 1,
                in_flight: HashMap::new(),
            }),
            target_changed: Condvar::new(),
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        let inner = self.inner.lock();
        if inner.closed {
            return ConnectionPhase::Closed;
        }
        match inner.target {
            ServerTargetState::Attached(_) => ConnectionPhase::Attached,
            ServerTargetState::Disconnected => ConnectionPhase::Disconnected,
            ServerTargetState::Reconnecting(_) => ConnectionPhase::Reconnecting,
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    /// The id the next send will be assigned
    pub fn next_transaction_id(&self) -> TransactionId {
        self.inner.lock().next_transaction_id
    }

    /// Whether deliveries from `server_id` belong to this connection: true
    /// for the attached or the reconnecting server
    pub fn is_connected(&self, server_id: ServerId) -> bool {
        let inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        match &inner.target {
            ServerTargetState::Attached(target) | ServerTargetState::Reconnecting(target) => {
                target.server_id() == server_id
            }
            ServerTargetState::Disconnected => false,
        }
    }

    // Sending

    /// Send through a blocking waiter. Parks while no server is attached.
    /// On a closed connection the returned waiter has already failed.
    pub fn send_normal(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        message: WireMessage,
        stages: AckStages,
        block_get_on_retire: bool,
        monitor: Option<RawMonitor>,
    ) -> Arc<AckWaiter> {
        let waiter = Arc::new(AckWaiter::new(stages, block_get_on_retire, monitor));
        self.send_with(origin, message, waiter.clone(), stages.sent);
        waiter
    }

    /// Callback twin of `send_normal`
    pub fn send_async<M: 'static, R: 'static>(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        message: WireMessage,
        should_wait_for_sent: bool,
        codec: Arc<dyn MessageCodec<M, R>>,
        callback: Arc<dyn InvocationCallback<R>>,
    ) -> Arc<AsyncAckProcessor<M, R>> {
        let processor = Arc::new(AsyncAckProcessor::new(codec, callback));
        self.send_with(origin, message, processor.clone(), should_wait_for_sent);
        processor
    }

    fn send_with(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        message: WireMessage,
        waiter: Arc<dyn AckProcessor>,
        signal_sent: bool,
    ) {
        let mut inner = self.inner.lock();
        let target = loop {
            if inner.closed {
                break None;
            }
            if let ServerTargetState::Attached(target) = &inner.target {
                break Some(target.clone());
            }
            self.target_changed.wait(&mut inner);
        };

        match target {
            Some(target) => {
                let oldest = inner.oldest_transaction_id();
                inner.create_and_send(&target, origin, message, oldest, waiter.clone());
                drop(inner);
                // stage callbacks run outside the critical section
                if signal_sent {
                    waiter.sent();
                }
            }
            None => {
                drop(inner);
                debug!("Connection closed, failing {:?} before send", message.kind);
                waiter.force_disconnect();
            }
        }
    }

    /// Send a handshake to the reconnecting server. The message is stamped
    /// with oldest id 0 since nothing has been reclaimed on the new server.
    pub fn try_send_as_reconnect(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        message: WireMessage,
        stages: AckStages,
    ) -> Result<Arc<AckWaiter>, ConnectionStateError> {
        let mut inner = self.inner.lock();
        let target = match &inner.target {
            ServerTargetState::Reconnecting(target) => target.clone(),
            _ => return Err(ConnectionStateError::NotReconnecting),
        };
        let waiter = Arc::new(AckWaiter::new(stages, false, None));
        inner.create_and_send(&target, origin, message, 0, waiter.clone());
        drop(inner);
        if stages.sent {
            waiter.sent();
        }
        Ok(waiter)
    }

    pub fn send_as_reconnect(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        message: WireMessage,
        stages: AckStages,
    ) -> Arc<AckWaiter> {
        fatal(self.try_send_as_reconnect(origin, message, stages))
    }

    /// Replay a transaction to the reconnecting server under its original
    /// id. The caller's `get` is held until the new server retires it.
    pub fn try_send_as_resend(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        transaction_id: TransactionId,
        waiter: Arc<dyn AckProcessor>,
    ) -> Result<(), ConnectionStateError> {
        let mut inner = self.inner.lock();
        let target = match &inner.target {
            ServerTargetState::Reconnecting(target) => target.clone(),
            _ => return Err(ConnectionStateError::NotReconnecting),
        };
        let raw = waiter.reset_and_get_message_for_resend();
        inner.in_flight.insert(transaction_id, waiter.clone());
        waiter.block_get_on_retire();
        debug!(
            "Resending transaction {} to server {:?}",
            transaction_id,
            target.server_id()
        );
        target.send_message_to_server(origin, raw);
        Ok(())
    }

    pub fn send_as_resend(
        &self,
        origin: Arc<dyn ClientEndpoint>,
        transaction_id: TransactionId,
        waiter: Arc<dyn AckProcessor>,
    ) {
        fatal(self.try_send_as_resend(origin, transaction_id, waiter))
    }

    // In-flight table

    pub fn try_get_waiter_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Arc<dyn AckProcessor>, ConnectionStateError> {
        self.inner
            .lock()
            .in_flight
            .get(&transaction_id)
            .cloned()
            .ok_or(ConnectionStateError::MissingTransaction { transaction_id })
    }

    pub fn get_waiter_for_transaction(&self, transaction_id: TransactionId) -> Arc<dyn AckProcessor> {
        fatal(self.try_get_waiter_for_transaction(transaction_id))
    }

    pub fn try_remove_waiter_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Arc<dyn AckProcessor>, ConnectionStateError> {
        self.inner
            .lock()
            .in_flight
            .remove(&transaction_id)
            .ok_or(ConnectionStateError::MissingTransaction { transaction_id })
    }

    pub fn remove_waiter_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Arc<dyn AckProcessor> {
        fatal(self.try_remove_waiter_for_transaction(transaction_id))
    }

    // Lifecycle

    /// Designate `server` for replay. Returns the in-flight table, ordered
    /// by transaction id, without clearing it.
    pub fn try_enter_reconnect_state(
        &self,
        server: Arc<dyn ServerTarget>,
    ) -> Result<Vec<(TransactionId, Arc<dyn AckProcessor>)>, ConnectionStateError> {
        let mut inner = self.inner.lock();
        if !matches!(inner.target, ServerTargetState::Disconnected) {
            return Err(ConnectionStateError::StillConnected);
        }
        info!("Reconnecting to server {:?}", server.server_id());
        inner.target = ServerTargetState::Reconnecting(server);

        let mut snapshot: Vec<(TransactionId, Arc<dyn AckProcessor>)> = inner
            .in_flight
            .iter()
            .map(|(transaction_id, waiter)| (*transaction_id, waiter.clone()))
            .collect();
        snapshot.sort_by_key(|(transaction_id, _)| *transaction_id);
        self.target_changed.notify_all();
        Ok(snapshot)
    }

    pub fn enter_reconnect_state(
        &self,
        server: Arc<dyn ServerTarget>,
    ) -> Vec<(TransactionId, Arc<dyn AckProcessor>)> {
        fatal(self.try_enter_reconnect_state(server))
    }

    /// Promote the reconnecting server and release parked senders
    pub fn try_finish_reconnect_state(&self) -> Result<(), ConnectionStateError> {
        let mut inner = self.inner.lock();
        let target = match &inner.target {
            ServerTargetState::Reconnecting(target) => target.clone(),
            _ => return Err(ConnectionStateError::NotReconnecting),
        };
        info!("Attached to server {:?}", target.server_id());
        inner.target = ServerTargetState::Attached(target);
        self.target_changed.notify_all();
        Ok(())
    }

    pub fn finish_reconnect_state(&self) {
        fatal(self.try_finish_reconnect_state())
    }

    /// Drop the attached server. Senders park until a reconnect finishes.
    pub fn try_enter_disconnected_state(&self) -> Result<(), ConnectionStateError> {
        let mut inner = self.inner.lock();
        match &inner.target {
            ServerTargetState::Attached(target) => {
                info!("Disconnected from server {:?}", target.server_id());
            }
            _ => return Err(ConnectionStateError::NotAttached),
        }
        inner.target = ServerTargetState::Disconnected;
        self.target_changed.notify_all();
        Ok(())
    }

    pub fn enter_disconnected_state(&self) {
        fatal(self.try_enter_disconnected_state())
    }

    /// Fail every outstanding transaction with a connection-closed error
    /// and refuse further sends. Each waiter is forced exactly once.
    pub fn force_close(&self) {
        let mut outstanding: Vec<(TransactionId, Arc<dyn AckProcessor>)> = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            self.target_changed.notify_all();
            inner.in_flight.drain().collect()
        };
        outstanding.sort_by_key(|(transaction_id, _)| *transaction_id);
        info!(
            "Closing connection with {} transactions in flight",
            outstanding.len()
        );
        for (_, waiter) in outstanding {
            waiter.force_disconnect();
        }
    }
}

fn fatal<T>(result: Result<T, ConnectionStateError>) -> T {
    result.unwrap_or_else(|e| panic!("ConnectionState error: {}", e))
}
