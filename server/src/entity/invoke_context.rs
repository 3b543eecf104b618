use passthrough_shared::{ClientId, MessageKey, TransactionId};

/// What an entity knows about the invocation it is serving
pub struct InvokeContext<R> {
    client: ClientId,
    current_transaction_id: TransactionId,
    oldest_transaction_id: TransactionId,
    deferred_until: Option<MessageKey>,
    intermediates: Vec<R>,
}

impl<R> InvokeContext<R> {
    pub fn new(
        client: ClientId,
        current_transaction_id: TransactionId,
        oldest_transaction_id: TransactionId,
    ) -> Self {
        Self {
            client,
            current_transaction_id,
            oldest_transaction_id,
            deferred_until: None,
            intermediates: Vec::new(),
        }
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn current_transaction_id(&self) -> TransactionId {
        self.current_transaction_id
    }

    /// Every transaction of this client older than this id is finished and
    /// anything kept for it may be dropped
    pub fn oldest_transaction_id(&self) -> TransactionId {
        self.oldest_transaction_id
    }

    /// Transaction ids start at 1, so 0 marks an invocation that did not
    /// come through a client connection
    pub fn is_valid_client_information(&self) -> bool {
        self.current_transaction_id > 0
    }

    pub fn message_key(&self) -> MessageKey {
        MessageKey::new(self.client, self.current_transaction_id)
    }

    /// Hold this invocation's retirement until `blocker` has retired
    pub fn defer_retirement_until(&mut self, blocker: MessageKey) {
        self.deferred_until = Some(blocker);
    }

    /// Publish an intermediate response to the caller's monitor
    pub fn send_intermediate(&mut self, intermediate: R) {
        self.intermediates.push(intermediate);
    }

    pub(crate) fn into_parts(self) -> (Option<MessageKey>, Vec<R>) {
        (self.deferred_until, self.intermediates)
    }
}
