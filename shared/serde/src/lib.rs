//! # Passthrough Serde
//! Bit-level serialization shared by the passthrough client & server crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod impls;
mod integer;
mod serde;
mod stream_writer;

pub use bit_reader::BitReader;
pub use bit_writer::BitWrite;
pub use error::SerdeErr;
pub use integer::UnsignedVariableInteger;
pub use serde::Serde;
pub use stream_writer::StreamWriter;
