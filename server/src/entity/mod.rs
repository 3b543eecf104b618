pub mod active_entity;
pub mod entity_container;
pub mod entity_endpoint;
pub mod invoke_context;
