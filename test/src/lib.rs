//! Harness for exercising the passthrough client & server together: a
//! sample ledger entity, its codec, an injected invocation log and a
//! cluster that can crash its active server and fail over to a spare.


pub use helpers::*;
