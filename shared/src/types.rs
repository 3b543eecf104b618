/// Per-connection sequence number stamped on every outgoing invocation
pub type TransactionId = u64;

// ClientId
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn from_u64(value: u64) -> Self {
        ClientId(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

// ServerId
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ServerId(u64);

impl ServerId {
    pub fn from_u64(value: u64) -> Self {
        ServerId(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

/// Identifies one invocation across every connection of a server. Used as
/// the blocker identity when an invocation defers its retirement.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MessageKey {
    pub client: ClientId,
    pub transaction_id: TransactionId,
}

impl MessageKey {
    pub fn new(client: ClientId, transaction_id: TransactionId) -> Self {
        Self {
            client,
            transaction_id,
        }
    }
}
