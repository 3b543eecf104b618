mod client_record;
mod server_config;
mod server_process;

pub use client_record::{CachedReply, ClientRecord};
pub use server_config::ServerConfig;
pub use server_process::ServerProcess;
