//! A single call in a Tempo transaction batch.

use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use core::mem;

/// One call of a batched Tempo transaction, encoded as `[to, value, data]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Call {
    /// Call target, or contract creation.
    pub to: TxKind,
    /// Value transferred with the call.
    pub value: U256,
    /// Call input.
    pub data: Bytes,
}

impl Call {
    /// Creates a call to `to` with no value.
    pub fn new(to: Address, data: Bytes) -> Self {
        Self { to: TxKind::Call(to), value: U256::ZERO, data }
    }

    fn rlp_header(&self) -> Header {
        Header {
            list: true,
            payload_length: self.to.length() + self.value.length() + self.data.length(),
        }
    }

    /// Heuristic in-memory size.
    pub fn size(&self) -> usize {
        mem::size_of::<Self>() + self.data.len()
    }
}

impl Encodable for Call {
    fn encode(&self, out: &mut dyn BufMut) {
        self.rlp_header().encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
    }

    fn length(&self) -> usize {
        self.rlp_header().length_with_payload()
    }
}

impl Decodable for Call {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        if header.payload_length > buf.len() {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let (mut fields, rest) = buf.split_at(header.payload_length);
        let call = Self {
            to: Decodable::decode(&mut fields)?,
            value: Decodable::decode(&mut fields)?,
            data: Decodable::decode(&mut fields)?,
        };
        if !fields.is_empty() {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: header.payload_length - fields.len(),
            });
        }
        *buf = rest;
        Ok(call)
    }
}
