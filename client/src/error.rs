use thiserror::Error;

use passthrough_shared::{CodecError, EntityError, TransactionId};

/// The outcome a caller sees when an invocation does not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The server reported a checked failure for this invocation
    #[error("Invocation failed: {0}")]
    Entity(#[from] EntityError),

    /// The connection was torn down while the invocation was outstanding
    #[error("Connection closed before the invocation finished")]
    ConnectionClosed,

    /// `get_timeout` expired before a result could be retrieved
    #[error("Timed out waiting for the invocation result")]
    Timeout,

    /// A thread parked on result retrieval was interrupted
    #[error("Interrupted while waiting for the invocation result")]
    Interrupted,

    /// The local codec could not encode the message or decode the response
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// An invocation builder was asked to invoke without a message
    #[error("No message was supplied to the invocation builder")]
    MissingMessage,
}

/// A contradiction in a connection's bookkeeping. Never recovered from: the
/// infallible wrappers on `ConnectionState` panic with this text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectionStateError {
    /// No waiter is registered for the transaction
    #[error("No in-flight waiter for transaction {transaction_id}")]
    MissingTransaction { transaction_id: TransactionId },

    /// A transaction id was registered twice
    #[error("Transaction {transaction_id} is already in flight")]
    DuplicateTransaction { transaction_id: TransactionId },

    /// Operation requires an attached server target
    #[error("Connection is not attached to a server")]
    NotAttached,

    /// Operation requires the connection to be in the reconnecting state
    #[error("Connection is not reconnecting")]
    NotReconnecting,

    /// Reconnect was requested while a server target is still present
    #[error("Connection still has a server target, disconnect it first")]
    StillConnected,
}
