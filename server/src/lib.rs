//! # Passthrough Server
//! A simulated server process: invocations arriving from client connections
//! are queued and served one at a time by a dedicated dispatch thread,
//! which hosts a single active entity and orders retirement of results
//! behind any deferred messages.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use passthrough_shared::{
        ClientId, ConcurrencyKey, ConcurrencyStrategy, EntityError, KeyedConcurrencyStrategy,
        MessageCodec, MessageKey, NoConcurrencyStrategy, ServerId, TransactionId,
        UniversalConcurrencyStrategy,
    };
}

mod entity;
mod error;
mod server;

pub use entity::{
    active_entity::ActiveEntity,
    entity_container::{DispatchOutcome, DispatchRequest, EntityContainer, EntityDispatcher},
    entity_endpoint::EntityEndpoint,
    invoke_context::InvokeContext,
};
pub use error::PassthroughServerError;
pub use server::{CachedReply, ClientRecord, ServerConfig, ServerProcess};
