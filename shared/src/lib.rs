//! # Passthrough Shared
//! Common functionality shared between passthrough-server & passthrough-client
//! crates: identifiers, the wire stamp every invocation carries, the codec
//! contract, the retirement ordering manager and the concurrency key strategy.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use passthrough_serde::{BitReader, BitWrite, Serde, SerdeErr, StreamWriter};

mod codec;
mod delivery;
mod entity;
mod retirement;
mod types;
mod wire;

pub use codec::{error::CodecError, message_codec::MessageCodec};
pub use delivery::{ClientEndpoint, ServerTarget};
pub use entity::{
    concurrency_strategy::{
        ConcurrencyKey, ConcurrencyStrategy, KeyedConcurrencyStrategy, NoConcurrencyStrategy,
        UniversalConcurrencyStrategy, MANAGEMENT_KEY, UNIVERSAL_KEY,
    },
    error::EntityError,
};
pub use retirement::retirement_manager::{RetirementManager, RetirementTuple};
pub use types::{ClientId, MessageKey, ServerId, TransactionId};
pub use wire::{message_kind::MessageKind, wire_message::WireMessage};
