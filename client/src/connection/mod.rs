pub mod client_inbox;
pub mod connection;
pub mod connection_state;
