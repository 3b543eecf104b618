use std::{sync::Arc, time::Duration};

use passthrough_shared::MessageCodec;

use crate::{ack::ack_waiter::AckWaiter, error::InvokeError};

/// Handle on a blocking invocation's eventual response
pub struct InvokeFuture<M, R> {
    waiter: Arc<AckWaiter>,
    codec: Arc<dyn MessageCodec<M, R>>,
}

impl<M, R> Clone for InvokeFuture<M, R> {
    fn clone(&self) -> Self {
        Self {
            waiter: self.waiter.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<M, R> InvokeFuture<M, R> {
    pub(crate) fn new(waiter: Arc<AckWaiter>, codec: Arc<dyn MessageCodec<M, R>>) -> Self {
        Self { waiter, codec }
    }

    /// Block until the response may be retrieved and decode it
    pub fn get(&self) -> Result<R, InvokeError> {
        let raw = self.waiter.get()?;
        Ok(self.codec.decode_response(&raw)?)
    }

    pub fn get_timeout(&self, timeout: Duration) -> Result<R, InvokeError> {
        let raw = self.waiter.get_timeout(timeout)?;
        Ok(self.codec.decode_response(&raw)?)
    }

    pub fn is_done(&self) -> bool {
        self.waiter.is_done()
    }

    /// Wake threads blocked in `get`. The invocation itself keeps going.
    pub fn interrupt(&self) {
        self.waiter.interrupt();
    }
}
