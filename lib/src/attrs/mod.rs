#![allow(clippy::len_without_is_empty)]

use crate::constants::ATTR_HEADER_LEN;
use crate::util::padding_len;
use bytes::{BufMut, Bytes, BytesMut};

pub mod xor_address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttr {
    pub attr_type: u16,
    // value 的原始长度，不含 padding
    pub attr_len: u16,
    pub value: Bytes,
}

impl RawAttr {
    pub fn new(attr_type: u16, value: Bytes) -> Self {
        debug_assert!(
            value.len() <= u16::MAX as usize,
            "attr value len {} > {}",
            value.len(),
            u16::MAX
        );
        Self {
            attr_type,
            attr_len: value.len() as u16,
            value,
        }
    }

    /// Encoded size on the wire, header and padding included.
    pub fn len(&self) -> usize {
        let value_len = self.attr_len as usize;
        ATTR_HEADER_LEN + value_len + padding_len(value_len)
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());

        buf.put_u16(self.attr_type);
        buf.put_u16(self.attr_len);
        buf.put_slice(&self.value);
        buf.put_bytes(0, padding_len(self.attr_len as usize));

        buf.freeze()
    }
}

/// Lenient scan over an attribute block.
///
/// Stops at the first attribute whose declared value overruns the block, so
/// a malformed tail yields the attributes before it instead of an error.
pub fn scan_attrs(block: &[u8]) -> Vec<RawAttr> {
    let mut attrs = vec![];
    let mut rest = block;

    while rest.len() >= ATTR_HEADER_LEN {
        let attr_type = u16::from_be_bytes([rest[0], rest[1]]);
        let attr_len = u16::from_be_bytes([rest[2], rest[3]]) as usize;

        let value_end = ATTR_HEADER_LEN + attr_len;
        if rest.len() < value_end {
            log::debug!(
                "attr {:#06x} overruns block: {} < {}",
                attr_type,
                rest.len(),
                value_end
            );
            break;
        }

        let value = Bytes::copy_from_slice(&rest[ATTR_HEADER_LEN..value_end]);
        attrs.push(RawAttr::new(attr_type, value));

        let next = value_end + padding_len(attr_len);
        rest = rest.get(next..).unwrap_or_default();
    }

    attrs
}
