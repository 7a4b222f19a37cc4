#![allow(clippy::len_without_is_empty)]

use crate::constants::*;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ParsePacketErr;

pub type TransId = [u8; TRANS_ID_LEN];

// type(2) + length(2) + magic cookie(4) + transaction id(12)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub msg_type: u16,

    // 不包括header的20字节
    pub msg_len: u16,

    pub trans_id: TransId,
}

impl Header {
    pub fn new(msg_type: u16, msg_len: u16, trans_id: TransId) -> Self {
        Self {
            msg_type,
            msg_len,
            trans_id,
        }
    }

    pub fn len(&self) -> usize {
        HEADER_LEN
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN);
        buf.put_u16(self.msg_type);
        buf.put_u16(self.msg_len);
        buf.put_slice(&MAGIC_COOKIE);
        buf.put_slice(&self.trans_id);
        buf.freeze()
    }

    /// Reads the fixed header, checking size and magic cookie only.
    pub fn unpack(buf: &[u8]) -> Result<Self, ParsePacketErr> {
        if buf.len() < HEADER_LEN {
            return Err(ParsePacketErr::Truncated(buf.len()));
        }

        let mut index = 0_usize;
        let msg_type = u16::from_be_bytes([buf[index], buf[index + 1]]);

        index += 2;
        let msg_len = u16::from_be_bytes([buf[index], buf[index + 1]]);

        index += 2;
        let cookie = u32::from_be_bytes([
            buf[index],
            buf[index + 1],
            buf[index + 2],
            buf[index + 3],
        ]);
        if cookie != MAGIC_COOKIE_U32 {
            return Err(ParsePacketErr::NotThisProtocol(cookie));
        }

        index += 4;
        let mut trans_id = [0_u8; TRANS_ID_LEN];
        trans_id.copy_from_slice(&buf[index..index + TRANS_ID_LEN]);

        Ok(Self {
            msg_type,
            msg_len,
            trans_id,
        })
    }
}

/// Cheap check used by the reflector before doing any real parsing: at least
/// a full header, and the low byte of the type is the binding method.
pub fn is_binding_request(buf: &[u8]) -> bool {
    buf.len() >= HEADER_LEN && buf[1] == (MESSAGE_TYPE_BIND_REQ & 0xff) as u8
}
