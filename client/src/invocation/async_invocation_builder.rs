use std::sync::Arc;

use passthrough_shared::{MessageCodec, WireMessage};

use crate::{
    connection::connection::Connection, error::InvokeError,
    invocation::invocation_callback::InvocationCallback,
};

/// Configures and sends one callback invocation
pub struct AsyncInvocationBuilder<'c, M, R> {
    connection: &'c Connection,
    codec: Arc<dyn MessageCodec<M, R>>,
    replicate: bool,
    block_enqueuing: bool,
    message: Option<M>,
}

impl<'c, M: 'static, R: 'static> AsyncInvocationBuilder<'c, M, R> {
    pub(crate) fn new(connection: &'c Connection, codec: Arc<dyn MessageCodec<M, R>>) -> Self {
        Self {
            connection,
            codec,
            replicate: connection.config().replicate,
            block_enqueuing: false,
            message: None,
        }
    }

    pub fn replicate(mut self, replicate: bool) -> Self {
        self.replicate = replicate;
        self
    }

    /// Report `sent` as soon as the request is handed to the transport
    pub fn block_enqueuing(mut self) -> Self {
        self.block_enqueuing = true;
        self
    }

    pub fn message(mut self, message: M) -> Self {
        self.message = Some(message);
        self
    }

    /// Send the invocation. Failures to build the request are reported
    /// through `callback.failure` without anything being sent.
    pub fn invoke(self, callback: Arc<dyn InvocationCallback<R>>) {
        let Some(message) = self.message else {
            callback.failure(InvokeError::MissingMessage);
            callback.complete();
            return;
        };
        let payload = match self.codec.encode_message(&message) {
            Ok(payload) => payload,
            Err(e) => {
                callback.failure(InvokeError::Codec(e));
                callback.complete();
                return;
            }
        };

        self.connection.invoke_async(
            WireMessage::invoke(payload, self.replicate),
            self.block_enqueuing,
            self.codec,
            callback,
        );
    }
}
