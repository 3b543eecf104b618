pub mod async_invocation_builder;
pub mod invocation_builder;
pub mod invocation_callback;
pub mod invoke_future;
pub mod invoke_monitor;
