use std::default::Default;

/// Contains Config properties which will be used by a ServerProcess
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Name given to the dispatch thread
    pub dispatch_thread_name: String,
    /// Abort the whole process when the dispatch thread panics. A panic
    /// there means the transaction bookkeeping can no longer be trusted.
    pub abort_on_dispatch_panic: bool,
    /// Keep completed outcomes per client so that a resent transaction is
    /// answered without invoking the entity again
    pub reply_cache: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dispatch_thread_name: "passthrough-dispatch".to_string(),
            abort_on_dispatch_panic: true,
            reply_cache: true,
        }
    }
}
