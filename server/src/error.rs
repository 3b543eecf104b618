use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassthroughServerError {
    /// The dispatch thread could not be spawned
    #[error("Failed to spawn the dispatch thread: {0}")]
    DispatchThread(#[from] std::io::Error),
}
