//! # Passthrough Client
//! Client half of the passthrough simulation: each `Connection` stamps its
//! invocations with transaction ids, tracks them in an in-flight table until
//! the server retires them, and replays them to a new server after a
//! failover.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use passthrough_shared::{
        ClientEndpoint, ClientId, CodecError, EntityError, MessageCodec, ServerId, ServerTarget,
        TransactionId, WireMessage,
    };
}

mod ack;
mod connection;
mod connection_config;
mod error;
mod invocation;

pub use ack::{
    ack_processor::AckProcessor,
    ack_stages::AckStages,
    ack_waiter::{AckWaiter, RawMonitor},
    async_ack_processor::AsyncAckProcessor,
};
pub use connection::{
    client_inbox::ClientInbox,
    connection::Connection,
    connection_state::{ConnectionPhase, ConnectionState},
};
pub use connection_config::ConnectionConfig;
pub use error::{ConnectionStateError, InvokeError};
pub use invocation::{
    async_invocation_builder::AsyncInvocationBuilder, invocation_builder::InvocationBuilder,
    invocation_callback::InvocationCallback, invoke_future::InvokeFuture,
    invoke_monitor::InvokeMonitor,
};
