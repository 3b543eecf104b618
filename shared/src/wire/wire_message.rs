use passthrough_serde::{
    BitReader, BitWrite, Serde, SerdeErr, StreamWriter, UnsignedVariableInteger,
};

use crate::{types::TransactionId, wire::message_kind::MessageKind, EntityError};

/// A message as it crosses the in-process transport. Every outgoing
/// invocation is stamped with its transaction id and the oldest transaction
/// id still in flight on its connection, so the server can reclaim whatever
/// it kept for older transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireMessage {
    pub kind: MessageKind,
    pub transaction_id: TransactionId,
    pub oldest_transaction_id: TransactionId,
    pub replicate: bool,
    pub payload: Vec<u8>,
}

impl WireMessage {
    fn new(kind: MessageKind, replicate: bool, payload: Vec<u8>) -> Self {
        Self {
            kind,
            transaction_id: 0,
            oldest_transaction_id: 0,
            replicate,
            payload,
        }
    }

    fn reply(kind: MessageKind, transaction_id: TransactionId, payload: Vec<u8>) -> Self {
        Self {
            kind,
            transaction_id,
            oldest_transaction_id: 0,
            replicate: false,
            payload,
        }
    }

    // Client -> Server

    pub fn invoke(payload: Vec<u8>, replicate: bool) -> Self {
        Self::new(MessageKind::Invoke, replicate, payload)
    }

    pub fn connect() -> Self {
        Self::new(MessageKind::Connect, false, Vec::new())
    }

    pub fn disconnect() -> Self {
        Self::new(MessageKind::Disconnect, false, Vec::new())
    }

    pub fn reconnect(extended_data: Vec<u8>) -> Self {
        Self::new(MessageKind::Reconnect, false, extended_data)
    }

    // Server -> Client

    pub fn received(transaction_id: TransactionId) -> Self {
        Self::reply(MessageKind::Received, transaction_id, Vec::new())
    }

    pub fn completed(transaction_id: TransactionId, response: Vec<u8>) -> Self {
        Self::reply(MessageKind::Completed, transaction_id, response)
    }

    pub fn failed(transaction_id: TransactionId, error: &EntityError) -> Self {
        let mut writer = StreamWriter::new();
        error.ser(&mut writer);
        Self::reply(MessageKind::Failed, transaction_id, writer.to_bytes())
    }

    pub fn monitor(transaction_id: TransactionId, response: Vec<u8>) -> Self {
        Self::reply(MessageKind::Monitor, transaction_id, response)
    }

    pub fn retired(transaction_id: TransactionId) -> Self {
        Self::reply(MessageKind::Retired, transaction_id, Vec::new())
    }

    /// Stamp the ids assigned by the sending connection
    pub fn set_transaction_tracking(
        &mut self,
        transaction_id: TransactionId,
        oldest_transaction_id: TransactionId,
    ) {
        self.transaction_id = transaction_id;
        self.oldest_transaction_id = oldest_transaction_id;
    }

    /// Reads the checked failure carried by a `Failed` message
    pub fn failure(&self) -> Result<EntityError, SerdeErr> {
        if self.kind != MessageKind::Failed {
            return Err(SerdeErr);
        }
        let mut reader = BitReader::new(&self.payload);
        EntityError::de(&mut reader)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = StreamWriter::with_capacity(self.payload.len() + 24);
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        Self::de(&mut reader)
    }
}

impl Serde for WireMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.kind.ser(writer);
        UnsignedVariableInteger::<7>::new(self.transaction_id).ser(writer);
        UnsignedVariableInteger::<7>::new(self.oldest_transaction_id).ser(writer);
        self.replicate.ser(writer);
        self.payload.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let kind = MessageKind::de(reader)?;
        let transaction_id = UnsignedVariableInteger::<7>::de(reader)?.get();
        let oldest_transaction_id = UnsignedVariableInteger::<7>::de(reader)?.get();
        let replicate = bool::de(reader)?;
        let payload = Vec::<u8>::de(reader)?;
        Ok(Self {
            kind,
            transaction_id,
            oldest_transaction_id,
            replicate,
            payload,
        })
    }

    fn bit_length(&self) -> u32 {
        self.kind.bit_length()
            + UnsignedVariableInteger::<7>::new(self.transaction_id).bit_length()
            + UnsignedVariableInteger::<7>::new(self.oldest_transaction_id).bit_length()
            + self.replicate.bit_length()
            + self.payload.bit_length()
    }
}
