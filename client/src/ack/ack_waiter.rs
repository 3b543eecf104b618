use std::time::{Duration, Instant};

use log::trace;
use parking_lot::{Condvar, Mutex};

use passthrough_shared::EntityError;

use crate::{
    ack::{ack_processor::AckProcessor, ack_stages::AckStages},
    error::InvokeError,
};

/// Receives the raw bytes of every intermediate response for one transaction
pub type RawMonitor = Box<dyn Fn(Vec<u8>) + Send + Sync>;

struct WaitState {
    waiting_for_sent: bool,
    waiting_for_receive: bool,
    waiting_for_complete: bool,
    waiting_for_retire: bool,
    block_get_on_retire: bool,
    can_get_return: bool,
    response: Option<Vec<u8>>,
    checked_failure: Option<EntityError>,
    fatal_failure: Option<InvokeError>,
    raw_message_for_resend: Vec<u8>,
    // interrupt bookkeeping
    get_waiters: usize,
    ack_waiters: usize,
    interrupt_generation: u64,
    pending_interrupt: bool,
}

impl WaitState {
    fn waiting_for_any_ack(&self) -> bool {
        self.waiting_for_sent
            || self.waiting_for_receive
            || self.waiting_for_complete
            || self.waiting_for_retire
    }

    fn arm(&mut self, requested: &AckStages) {
        self.waiting_for_receive = requested.received;
        self.waiting_for_complete = requested.completed;
        self.waiting_for_retire = requested.retired;
    }
}

/// Blocking acknowledgment waiter. Caller threads park in `wait_for_ack`
/// until every requested stage has fired, then in `get` until the result
/// gate opens.
pub struct AckWaiter {
    requested: AckStages,
    monitor: Option<RawMonitor>,
    state: Mutex<WaitState>,
    changed: Condvar,
}

impl AckWaiter {
    pub fn new(requested: AckStages, block_get_on_retire: bool, monitor: Option<RawMonitor>) -> Self {
        let mut state = WaitState {
            waiting_for_sent: requested.sent,
            waiting_for_receive: false,
            waiting_for_complete: false,
            waiting_for_retire: false,
            block_get_on_retire,
            can_get_return: false,
            response: None,
            checked_failure: None,
            fatal_failure: None,
            raw_message_for_resend: Vec::new(),
            get_waiters: 0,
            ack_waiters: 0,
            interrupt_generation: 0,
            pending_interrupt: false,
        };
        state.arm(&requested);

        Self {
            requested,
            monitor,
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    pub fn requested_stages(&self) -> AckStages {
        self.requested
    }

    /// Park until every requested stage has fired. Interrupts are not
    /// honored here; one that arrives is handed to the next `get`.
    pub fn wait_for_ack(&self) {
        let mut state = self.state.lock();
        state.ack_waiters += 1;
        while state.waiting_for_any_ack() {
            self.changed.wait(&mut state);
        }
        state.ack_waiters -= 1;
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().can_get_return
    }

    /// Park until the result gate opens, then return the raw response or
    /// the recorded failure
    pub fn get(&self) -> Result<Vec<u8>, InvokeError> {
        self.wait_for_result(None)
    }

    pub fn get_timeout(&self, timeout: Duration) -> Result<Vec<u8>, InvokeError> {
        self.wait_for_result(Some(Instant::now() + timeout))
    }

    /// Wake every thread parked in `get`. Threads parked on acknowledgment
    /// stages are left alone.
    pub fn interrupt(&self) {
        let mut state = self.state.lock();
        if state.get_waiters > 0 {
            state.interrupt_generation += 1;
            self.changed.notify_all();
        } else if state.ack_waiters > 0 {
            state.pending_interrupt = true;
        }
    }

    fn wait_for_result(&self, deadline: Option<Instant>) -> Result<Vec<u8>, InvokeError> {
        let mut state = self.state.lock();
        if state.pending_interrupt {
            state.pending_interrupt = false;
            return Err(InvokeError::Interrupted);
        }

        state.get_waiters += 1;
        let generation = state.interrupt_generation;
        let mut outcome = Ok(());
        while !state.can_get_return {
            if state.interrupt_generation != generation {
                outcome = Err(InvokeError::Interrupted);
                break;
            }
            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut state, deadline).timed_out()
                        && !state.can_get_return
                    {
                        outcome = Err(InvokeError::Timeout);
                        break;
                    }
                }
                None => self.changed.wait(&mut state),
            }
        }
        state.get_waiters -= 1;
        outcome?;

        if let Some(failure) = &state.checked_failure {
            return Err(InvokeError::Entity(failure.clone()));
        }
        if let Some(failure) = &state.fatal_failure {
            return Err(failure.clone());
        }
        Ok(state.response.clone().unwrap_or_default())
    }
}

impl AckProcessor for AckWaiter {
    fn sent(&self) {
        let mut state = self.state.lock();
        state.waiting_for_sent = false;
        self.changed.notify_all();
    }

    fn handle_ack(&self) {
        trace!("Transaction received");
        let mut state = self.state.lock();
        state.waiting_for_receive = false;
        self.changed.notify_all();
    }

    fn handle_complete(&self, outcome: Result<Vec<u8>, EntityError>) {
        trace!("Transaction completed");
        let mut state = self.state.lock();
        match outcome {
            Ok(response) => state.response = Some(response),
            Err(failure) => state.checked_failure = Some(failure),
        }
        state.waiting_for_complete = false;
        if !state.block_get_on_retire {
            state.can_get_return = true;
        }
        self.changed.notify_all();
    }

    fn handle_monitor(&self, intermediate: Vec<u8>) {
        match &self.monitor {
            Some(monitor) => monitor(intermediate),
            None => trace!("Dropping intermediate response, no monitor registered"),
        }
    }

    fn handle_retire(&self) {
        trace!("Transaction retired");
        let mut state = self.state.lock();
        state.waiting_for_retire = false;
        state.can_get_return = true;
        self.changed.notify_all();
    }

    fn save_raw_message_for_resend(&self, raw: Vec<u8>) {
        self.state.lock().raw_message_for_resend = raw;
    }

    fn reset_and_get_message_for_resend(&self) -> Vec<u8> {
        let mut state = self.state.lock();
        state.arm(&self.requested);
        state.can_get_return = false;
        state.response = None;
        state.checked_failure = None;
        state.raw_message_for_resend.clone()
    }

    fn force_disconnect(&self) {
        let mut state = self.state.lock();
        state.waiting_for_sent = false;
        state.waiting_for_receive = false;
        state.waiting_for_complete = false;
        state.waiting_for_retire = false;
        state.fatal_failure = Some(InvokeError::ConnectionClosed);
        state.can_get_return = true;
        self.changed.notify_all();
    }

    fn block_get_on_retire(&self) {
        self.state.lock().block_get_on_retire = true;
    }
}
