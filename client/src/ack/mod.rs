pub mod ack_processor;
pub mod ack_stages;
pub mod ack_waiter;
pub mod async_ack_processor;
