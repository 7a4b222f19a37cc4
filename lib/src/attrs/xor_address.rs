use crate::attrs::RawAttr;
use crate::constants::*;
use bytes::{BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::ParsePacketErr;
use crate::util;

// xor-mapped-address 端口和ip需要混淆
// port 和 magic cookie 高16位做 xor
// address(ipv4) 和 magic cookie做xor
// address(ipv6) 和 magic cookie 循环做xor，不使用 trans_id

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorMappedAddress {
    pub address: SocketAddr,
}

impl XorMappedAddress {
    pub fn new(address: SocketAddr) -> Self {
        Self { address }
    }

    /// Decodes an attribute value.
    ///
    /// `Ok(None)` means the family byte is neither IPv4 nor IPv6; callers
    /// treat that attribute like any unrelated one and keep scanning.
    pub fn from_value(value: &[u8]) -> Result<Option<Self>, ParsePacketErr> {
        if value.len() < 4 {
            return Err(ParsePacketErr::ShortAttribute {
                family: value.get(1).copied().unwrap_or_default(),
                len: value.len(),
            });
        }

        let family = value[1];
        let port = u16::from_be_bytes([value[2], value[3]]);

        let ip = match family {
            ATTR_FAMILY_IPV4 => {
                let raw = value.get(4..8).ok_or(ParsePacketErr::ShortAttribute {
                    family,
                    len: value.len(),
                })?;
                let mut addr = [0_u8; 4];
                addr.copy_from_slice(raw);
                IpAddr::V4(Ipv4Addr::from(addr))
            }
            ATTR_FAMILY_IPV6 => {
                let raw = value.get(4..20).ok_or(ParsePacketErr::ShortAttribute {
                    family,
                    len: value.len(),
                })?;
                let mut addr = [0_u8; 16];
                addr.copy_from_slice(raw);
                IpAddr::V6(Ipv6Addr::from(addr))
            }
            v => {
                log::debug!("skip xor-mapped-address, unknown family: {}", v);
                return Ok(None);
            }
        };

        // xor 是对称的，同一个函数既混淆也还原
        let address = util::xor_address(SocketAddr::new(ip, port));
        Ok(Some(Self { address }))
    }
}

impl From<XorMappedAddress> for RawAttr {
    fn from(attr: XorMappedAddress) -> Self {
        let xor_socket_addr = util::xor_address(attr.address);

        let (family, ip_bytes): (u8, Vec<u8>) = match xor_socket_addr.ip() {
            IpAddr::V4(ip) => (ATTR_FAMILY_IPV4, ip.octets().into()),
            IpAddr::V6(ip) => (ATTR_FAMILY_IPV6, ip.octets().into()),
        };

        let mut bytes_buf = BytesMut::with_capacity(4 + ip_bytes.len());

        bytes_buf.put_u8(0);
        bytes_buf.put_u8(family);
        bytes_buf.put_u16(xor_socket_addr.port());
        bytes_buf.put_slice(&ip_bytes);
        let value = bytes_buf.freeze();

        RawAttr::new(ATTR_XOR_MAPPED_ADDRESS, value)
    }
}
