use crate::constants::{MAGIC_COOKIE, TRANS_ID_LEN};
use crate::header::TransId;
use rand::prelude::*;
use std::fmt::Write as _;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

pub fn print_bytes(buf: &[u8], separator: &str, row_width: usize) -> String {
    let mut hex = String::new();
    buf.iter().enumerate().for_each(|(x, y)| {
        let _ = write!(hex, "{:02X}", y);
        if (x + 1) % row_width == 0 {
            hex.push('\n');
        } else {
            hex.push_str(separator);
        }
    });

    hex
}

pub fn new_trans_id() -> TransId {
    let mut trans_id = [0u8; TRANS_ID_LEN];
    rand::thread_rng().fill_bytes(&mut trans_id);
    trans_id
}

// 补齐到 4 字节边界
pub fn padding_len(len: usize) -> usize {
    (4 - (len & 3)) & 3
}

fn xor_port(port: u16) -> u16 {
    let magic_prefix = u16::from_be_bytes([MAGIC_COOKIE[0], MAGIC_COOKIE[1]]);
    port ^ magic_prefix
}

pub fn xor_address_v4(addr: SocketAddrV4) -> SocketAddrV4 {
    let src_buf = addr.ip().octets();
    let mut buf = [0_u8; 4];
    for (i, b) in buf.iter_mut().enumerate() {
        *b = src_buf[i] ^ MAGIC_COOKIE[i];
    }

    SocketAddrV4::new(Ipv4Addr::from(buf), xor_port(addr.port()))
}

pub fn xor_address_v6(addr: SocketAddrV6) -> SocketAddrV6 {
    let src_buf = addr.ip().octets();
    let mut buf = [0_u8; 16];
    for (i, b) in buf.iter_mut().enumerate() {
        *b = src_buf[i] ^ MAGIC_COOKIE[i % MAGIC_COOKIE.len()];
    }

    SocketAddrV6::new(Ipv6Addr::from(buf), xor_port(addr.port()), 0, 0)
}

pub fn xor_address(addr: SocketAddr) -> SocketAddr {
    match addr {
        SocketAddr::V4(v) => SocketAddr::V4(xor_address_v4(v)),
        SocketAddr::V6(v) => SocketAddr::V6(xor_address_v6(v)),
    }
}

/// Collapses `::ffff:a.b.c.d` to plain IPv4, as seen on dual-stack sockets.
pub fn canonical_addr(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(addr.ip().to_canonical(), addr.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_len() {
        assert_eq!(padding_len(0), 0);
        assert_eq!(padding_len(1), 3);
        assert_eq!(padding_len(2), 2);
        assert_eq!(padding_len(3), 1);
        assert_eq!(padding_len(8), 0);
        assert_eq!(padding_len(20), 0);
    }

    #[test]
    fn test_xor_v4_known_value() {
        let addr: SocketAddrV4 = "1.2.3.4:17185".parse().unwrap();
        let xor = xor_address_v4(addr);
        assert_eq!(xor.port(), 0x4321 ^ 0x2112);
        assert_eq!(xor.ip().octets(), [0x20, 0x10, 0xA7, 0x46]);
    }

    #[test]
    fn test_xor_v6_repeats_cookie() {
        let addr: SocketAddrV6 = "[::]:0".parse().unwrap();
        let xor = xor_address_v6(addr);
        let expect: Vec<u8> = MAGIC_COOKIE.iter().copied().cycle().take(16).collect();
        assert_eq!(xor.ip().octets().to_vec(), expect);
    }

    #[test]
    fn test_canonical_addr() {
        let mapped: SocketAddr = "[::ffff:10.0.0.5]:9".parse().unwrap();
        assert_eq!(canonical_addr(mapped), "10.0.0.5:9".parse::<SocketAddr>().unwrap());

        let v6: SocketAddr = "[2001:db8::1]:9".parse().unwrap();
        assert_eq!(canonical_addr(v6), v6);
    }

    #[test]
    fn test_trans_id_is_random() {
        assert_ne!(new_trans_id(), new_trans_id());
    }
}
