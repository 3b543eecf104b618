// The kinds of message that travel between a connection and its server

use passthrough_serde::{BitReader, BitWrite, Serde, SerdeErr};

#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum MessageKind {
    // client -> server
    // An entity invocation
    Invoke,
    // Attach a new connection to the server
    Connect,
    // Detach a connection from the server
    Disconnect,
    // Re-attach an existing connection to a newly promoted server
    Reconnect,
    // server -> client
    // The dispatch thread picked the invocation up
    Received,
    // The invocation produced a response
    Completed,
    // The invocation produced a checked failure
    Failed,
    // An intermediate response streamed while the invocation runs
    Monitor,
    // Server side bookkeeping for the transaction has been released
    Retired,
}

impl MessageKind {
    pub fn is_client_to_server(&self) -> bool {
        matches!(
            self,
            MessageKind::Invoke
                | MessageKind::Connect
                | MessageKind::Disconnect
                | MessageKind::Reconnect
        )
    }

    fn index(&self) -> u8 {
        match self {
            MessageKind::Invoke => 0,
            MessageKind::Connect => 1,
            MessageKind::Disconnect => 2,
            MessageKind::Reconnect => 3,
            MessageKind::Received => 4,
            MessageKind::Completed => 5,
            MessageKind::Failed => 6,
            MessageKind::Monitor => 7,
            MessageKind::Retired => 8,
        }
    }
}

impl Serde for MessageKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.index().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(MessageKind::Invoke),
            1 => Ok(MessageKind::Connect),
            2 => Ok(MessageKind::Disconnect),
            3 => Ok(MessageKind::Reconnect),
            4 => Ok(MessageKind::Received),
            5 => Ok(MessageKind::Completed),
            6 => Ok(MessageKind::Failed),
            7 => Ok(MessageKind::Monitor),
            8 => Ok(MessageKind::Retired),
            // an unknown index means a corrupt stream, never panic on it
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        8
    }
}
