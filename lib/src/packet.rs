use crate::attrs::xor_address::XorMappedAddress;
use crate::attrs::{scan_attrs, RawAttr};
use crate::constants::*;
use crate::error::ParsePacketErr;
use crate::header::{Header, TransId};
use bytes::{BufMut, Bytes, BytesMut};
use std::net::SocketAddr;

// 一个 binding 消息
// header.msg_len 始终等于所有属性编码后（含 padding）的总长度

#[derive(Debug, Clone)]
pub struct Packet {
    pub header: Header,
    pub attrs: Vec<RawAttr>,
}

impl Packet {
    pub fn new(header: Header) -> Self {
        let mut packet = Self {
            header,
            attrs: vec![],
        };
        packet.update_header_len();
        packet
    }

    fn update_header_len(&mut self) {
        let total = self.attrs.iter().fold(0_usize, |acc, x| acc + x.len());
        debug_assert!(
            total <= u16::MAX as usize,
            "attr block len {} > {}",
            total,
            u16::MAX
        );
        self.header.msg_len = total as u16;
    }

    pub fn add_attr(&mut self, attr: RawAttr) -> &mut Self {
        self.attrs.push(attr);
        self.update_header_len();
        self
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.header.msg_len as usize);
        buf.put_slice(&self.header.pack());
        for v in self.attrs.iter() {
            buf.put_slice(&v.pack());
        }

        buf.freeze()
    }

    /// Parses header and attribute block.
    ///
    /// Bytes past the declared length are ignored. The attribute scan is
    /// lenient, see [`scan_attrs`].
    pub fn unpack(buf: &[u8]) -> Result<Self, ParsePacketErr> {
        let header = Header::unpack(buf)?;

        let declared = header.msg_len as usize;
        let available = buf.len() - HEADER_LEN;
        if declared > available {
            return Err(ParsePacketErr::BadLength {
                declared,
                available,
            });
        }

        let attrs = scan_attrs(&buf[HEADER_LEN..HEADER_LEN + declared]);

        Ok(Self { header, attrs })
    }

    /// First xor-mapped-address with a known family wins.
    pub fn xor_mapped_address(&self) -> Result<SocketAddr, ParsePacketErr> {
        for attr in self.attrs.iter() {
            if attr.attr_type != ATTR_XOR_MAPPED_ADDRESS {
                continue;
            }
            if let Some(v) = XorMappedAddress::from_value(&attr.value)? {
                return Ok(v.address);
            }
        }

        Err(ParsePacketErr::NotFound)
    }
}

pub fn build_binding_request(trans_id: TransId) -> Bytes {
    let header = Header::new(MESSAGE_TYPE_BIND_REQ, 0, trans_id);
    Packet::new(header).pack()
}

pub fn build_binding_response(trans_id: TransId, mapped: SocketAddr) -> Bytes {
    let header = Header::new(MESSAGE_TYPE_BIND_RES, 0, trans_id);
    let mut response = Packet::new(header);
    response.add_attr(XorMappedAddress::new(mapped).into());
    response.pack()
}

/// Extracts the observed address from a binding response.
///
/// The transaction id is not compared against the request; each probe owns
/// its socket and has a single exchange in flight.
pub fn parse_xor_mapped(buf: &[u8]) -> Result<SocketAddr, ParsePacketErr> {
    Packet::unpack(buf)?.xor_mapped_address()
}
