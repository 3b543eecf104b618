use std::default::Default;

/// Contains Config properties which will be used by a client Connection
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Withhold `get` results until the server has retired the transaction,
    /// not merely completed it
    pub block_get_on_retire: bool,
    /// Default replication flag stamped on outgoing invocations
    pub replicate: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            block_get_on_retire: true,
            replicate: true,
        }
    }
}
