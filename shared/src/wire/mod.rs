pub mod message_kind;
pub mod wire_message;
