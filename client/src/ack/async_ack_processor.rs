use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;

use passthrough_shared::{EntityError, MessageCodec};

use crate::{
    ack::ack_processor::AckProcessor, error::InvokeError,
    invocation::invocation_callback::InvocationCallback,
};

#[derive(Default)]
struct StagesFired {
    sent: bool,
    received: bool,
    completed: bool,
    retired: bool,
}

/// Callback acknowledgment processor. Each stage fires the matching
/// `InvocationCallback` method at most once, in the order sent, received,
/// result or failure, complete, retired.
///
/// `sent` runs on the thread that issued the invocation; `received`,
/// `result`/`failure`, `complete` and `retired` run on the server's dispatch
/// thread. Stage callbacks for one processor never overlap: a later stage
/// waits until an earlier callback has returned, so a callback must not
/// block on the server.
pub struct AsyncAckProcessor<M, R> {
    codec: Arc<dyn MessageCodec<M, R>>,
    callback: Arc<dyn InvocationCallback<R>>,
    // held across claiming a stage and running its callback
    stage_order: Mutex<()>,
    fired: Mutex<StagesFired>,
    raw_message: Mutex<Vec<u8>>,
}

impl<M, R> AsyncAckProcessor<M, R> {
    pub fn new(
        codec: Arc<dyn MessageCodec<M, R>>,
        callback: Arc<dyn InvocationCallback<R>>,
    ) -> Self {
        Self {
            codec,
            callback,
            stage_order: Mutex::new(()),
            fired: Mutex::new(StagesFired::default()),
            raw_message: Mutex::new(Vec::new()),
        }
    }

    /// True once the request was handed to the transport
    pub fn is_sent(&self) -> bool {
        self.fired.lock().sent
    }

    /// True once a result or failure was reported
    pub fn is_done(&self) -> bool {
        self.fired.lock().completed
    }

    // callers hold `stage_order`
    fn fire_sent_once(&self) {
        let first = {
            let mut fired = self.fired.lock();
            !std::mem::replace(&mut fired.sent, true)
        };
        if first {
            self.callback.sent();
        }
    }

    fn claim_completion(&self) -> bool {
        let mut fired = self.fired.lock();
        !std::mem::replace(&mut fired.completed, true)
    }
}

impl<M, R> AckProcessor for AsyncAckProcessor<M, R> {
    fn sent(&self) {
        let _order = self.stage_order.lock();
        self.fire_sent_once();
    }

    fn handle_ack(&self) {
        let _order = self.stage_order.lock();
        // received implies sent from the caller's point of view
        self.fire_sent_once();
        let first = {
            let mut fired = self.fired.lock();
            !std::mem::replace(&mut fired.received, true)
        };
        if first {
            self.callback.received();
        }
    }

    fn handle_complete(&self, outcome: Result<Vec<u8>, EntityError>) {
        let _order = self.stage_order.lock();
        if !self.claim_completion() {
            trace!("Ignoring repeated completion");
            return;
        }
        match outcome {
            Ok(bytes) => match self.codec.decode_response(&bytes) {
                Ok(response) => self.callback.result(response),
                Err(error) => self.callback.failure(InvokeError::Codec(error)),
            },
            Err(failure) => self.callback.failure(InvokeError::Entity(failure)),
        }
        self.callback.complete();
    }

    fn handle_monitor(&self, _intermediate: Vec<u8>) {
        trace!("Callback invocations do not stream intermediate responses");
    }

    fn handle_retire(&self) {
        let _order = self.stage_order.lock();
        let first = {
            let mut fired = self.fired.lock();
            !std::mem::replace(&mut fired.retired, true)
        };
        if first {
            self.callback.retired();
        }
    }

    fn save_raw_message_for_resend(&self, raw: Vec<u8>) {
        *self.raw_message.lock() = raw;
    }

    fn reset_and_get_message_for_resend(&self) -> Vec<u8> {
        // stages already reported stay reported
        self.raw_message.lock().clone()
    }

    fn force_disconnect(&self) {
        let _order = self.stage_order.lock();
        if self.claim_completion() {
            self.callback.failure(InvokeError::ConnectionClosed);
            self.callback.complete();
        }
    }

    fn block_get_on_retire(&self) {}
}
