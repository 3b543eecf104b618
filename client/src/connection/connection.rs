use std::sync::Arc;

use log::info;

use passthrough_shared::{ClientEndpoint, ClientId, MessageCodec, ServerTarget, WireMessage};

use crate::{
    ack::{
        ack_stages::AckStages,
        ack_waiter::{AckWaiter, RawMonitor},
        async_ack_processor::AsyncAckProcessor,
    },
    connection::{
        client_inbox::ClientInbox,
        connection_state::{ConnectionPhase, ConnectionState},
    },
    connection_config::ConnectionConfig,
    invocation::{
        async_invocation_builder::AsyncInvocationBuilder,
        invocation_builder::InvocationBuilder, invocation_callback::InvocationCallback,
    },
};

/// A client's connection to a server process. Owns the transaction
/// bookkeeping and the return path, and drives connect / reconnect / close
/// handshakes.
pub struct Connection {
    client_id: ClientId,
    config: ConnectionConfig,
    state: Arc<ConnectionState>,
    inbox: Arc<ClientInbox>,
}

impl Connection {
    /// Attach to `server` and announce this client with a `Connect`
    /// handshake. Returns once the server has completed the handshake.
    pub fn connect(
        config: ConnectionConfig,
        client_id: ClientId,
        server: Arc<dyn ServerTarget>,
    ) -> Self {
        info!("Client {:?} connecting to server {:?}", client_id, server.server_id());
        let state = Arc::new(ConnectionState::new(server));
        let inbox = Arc::new(ClientInbox::new(client_id, state.clone()));
        let connection = Self {
            client_id,
            config,
            state,
            inbox,
        };

        connection
            .state
            .send_normal(
                connection.origin(),
                WireMessage::connect(),
                handshake_stages(),
                false,
                None,
            )
            .wait_for_ack();
        connection
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase()
    }

    /// Start a blocking invocation against the server's entity
    pub fn invoke<M: 'static, R: 'static>(
        &self,
        codec: Arc<dyn MessageCodec<M, R>>,
    ) -> InvocationBuilder<'_, M, R> {
        InvocationBuilder::new(self, codec)
    }

    /// Start a callback invocation against the server's entity
    pub fn async_invoke<M: 'static, R: 'static>(
        &self,
        codec: Arc<dyn MessageCodec<M, R>>,
    ) -> AsyncInvocationBuilder<'_, M, R> {
        AsyncInvocationBuilder::new(self, codec)
    }

    pub(crate) fn invoke_and_wait_for_acks(
        &self,
        message: WireMessage,
        stages: AckStages,
        block_get_on_retire: bool,
        monitor: Option<RawMonitor>,
    ) -> Arc<AckWaiter> {
        let waiter =
            self.state
                .send_normal(self.origin(), message, stages, block_get_on_retire, monitor);
        waiter.wait_for_ack();
        waiter
    }

    pub(crate) fn invoke_async<M: 'static, R: 'static>(
        &self,
        message: WireMessage,
        should_wait_for_sent: bool,
        codec: Arc<dyn MessageCodec<M, R>>,
        callback: Arc<dyn InvocationCallback<R>>,
    ) -> Arc<AsyncAckProcessor<M, R>> {
        self.state
            .send_async(self.origin(), message, should_wait_for_sent, codec, callback)
    }

    /// The server process went away. Outstanding transactions stay in
    /// flight and new invocations park until `reconnect`.
    pub fn disconnect(&self) {
        self.state.enter_disconnected_state();
    }

    /// Attach to `server`: send a `Reconnect` handshake, replay every
    /// in-flight transaction in id order, then release parked senders
    pub fn reconnect(&self, server: Arc<dyn ServerTarget>) {
        let in_flight = self.state.enter_reconnect_state(server);
        self.state
            .send_as_reconnect(
                self.origin(),
                WireMessage::reconnect(Vec::new()),
                handshake_stages(),
            )
            .wait_for_ack();

        info!(
            "Client {:?} replaying {} transactions",
            self.client_id,
            in_flight.len()
        );
        for (transaction_id, waiter) in in_flight {
            self.state.send_as_resend(self.origin(), transaction_id, waiter);
        }
        self.state.finish_reconnect_state();
    }

    /// Say goodbye to an attached server, then fail whatever is still in
    /// flight
    pub fn close(&self) {
        if self.state.phase() == ConnectionPhase::Attached {
            self.state
                .send_normal(
                    self.origin(),
                    WireMessage::disconnect(),
                    handshake_stages(),
                    false,
                    None,
                )
                .wait_for_ack();
        }
        info!("Client {:?} closing", self.client_id);
        self.state.force_close();
    }

    fn origin(&self) -> Arc<dyn ClientEndpoint> {
        self.inbox.clone()
    }
}

// Retirement may be held behind another client's deferral, so handshakes
// only wait for completion
fn handshake_stages() -> AckStages {
    AckStages {
        completed: true,
        ..AckStages::none()
    }
}
