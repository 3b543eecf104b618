use std::sync::Arc;

use log::warn;

use passthrough_shared::{MessageCodec, WireMessage};

use crate::{
    ack::{ack_stages::AckStages, ack_waiter::RawMonitor},
    connection::connection::Connection,
    error::InvokeError,
    invocation::{invoke_future::InvokeFuture, invoke_monitor::InvokeMonitor},
};

/// Configures and sends one blocking invocation. `invoke` returns after
/// every requested acknowledgment stage has fired.
pub struct InvocationBuilder<'c, M, R> {
    connection: &'c Connection,
    codec: Arc<dyn MessageCodec<M, R>>,
    stages: AckStages,
    replicate: bool,
    block_get_on_retire: bool,
    monitor: Option<Arc<dyn InvokeMonitor<R>>>,
    message: Option<M>,
}

impl<'c, M: 'static, R: 'static> InvocationBuilder<'c, M, R> {
    pub(crate) fn new(connection: &'c Connection, codec: Arc<dyn MessageCodec<M, R>>) -> Self {
        let config = connection.config();
        Self {
            connection,
            codec,
            stages: AckStages::none(),
            replicate: config.replicate,
            block_get_on_retire: config.block_get_on_retire,
            monitor: None,
            message: None,
        }
    }

    pub fn ack_sent(mut self) -> Self {
        self.stages.sent = true;
        self
    }

    pub fn ack_received(mut self) -> Self {
        self.stages.received = true;
        self
    }

    pub fn ack_completed(mut self) -> Self {
        self.stages.completed = true;
        self
    }

    pub fn ack_retired(mut self) -> Self {
        self.stages.retired = true;
        self
    }

    pub fn replicate(mut self, replicate: bool) -> Self {
        self.replicate = replicate;
        self
    }

    pub fn block_get_on_retire(mut self, block_get_on_retire: bool) -> Self {
        self.block_get_on_retire = block_get_on_retire;
        self
    }

    /// The response depends on retirement ordering, so `get` always waits
    /// for retirement
    pub fn as_deferred_response(mut self) -> Self {
        self.block_get_on_retire = true;
        self
    }

    pub fn monitor<T: InvokeMonitor<R> + 'static>(mut self, monitor: T) -> Self {
        self.monitor = Some(Arc::new(monitor));
        self
    }

    pub fn message(mut self, message: M) -> Self {
        self.message = Some(message);
        self
    }

    pub fn invoke(self) -> Result<InvokeFuture<M, R>, InvokeError> {
        let message = self.message.ok_or(InvokeError::MissingMessage)?;
        let payload = self.codec.encode_message(&message)?;

        let monitor = self.monitor.map(|monitor| {
            let codec = self.codec.clone();
            Box::new(move |raw: Vec<u8>| match codec.decode_response(&raw) {
                Ok(intermediate) => monitor.accept(intermediate),
                Err(e) => warn!("Dropping undecodable intermediate response: {}", e),
            }) as RawMonitor
        });

        let waiter = self.connection.invoke_and_wait_for_acks(
            WireMessage::invoke(payload, self.replicate),
            self.stages,
            self.block_get_on_retire,
            monitor,
        );
        Ok(InvokeFuture::new(waiter, self.codec))
    }
}
