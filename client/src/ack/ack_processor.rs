use passthrough_shared::EntityError;

/// The per-transaction object registered in a connection's in-flight table.
/// The connection and the return path drive it through its stages; the
/// implementation decides whether that wakes parked threads or fires
/// callbacks.
pub trait AckProcessor: Send + Sync {
    /// The request was handed to the transport
    fn sent(&self);

    /// The server's dispatch path picked the request up
    fn handle_ack(&self);

    /// The server produced a raw response or a checked failure
    fn handle_complete(&self, outcome: Result<Vec<u8>, EntityError>);

    /// The server published an intermediate response
    fn handle_monitor(&self, intermediate: Vec<u8>);

    /// The server released its bookkeeping for the transaction
    fn handle_retire(&self);

    fn save_raw_message_for_resend(&self, raw: Vec<u8>);

    /// Re-arm for a replay and return the bytes originally sent
    fn reset_and_get_message_for_resend(&self) -> Vec<u8>;

    /// Terminal failure: the connection went away with this transaction
    /// outstanding
    fn force_disconnect(&self);

    /// From now on `get` must wait for retirement even when completion
    /// already happened
    fn block_get_on_retire(&self);
}
