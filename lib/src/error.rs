use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePacketErr {
    // 不足 20 字节的 header
    #[error("truncated: {0} bytes < header")]
    Truncated(usize),

    #[error("not a stun message, cookie: {0:#010x}")]
    NotThisProtocol(u32),

    // header 声明的长度超过实际数据
    #[error("bad length: declared {declared}, available {available}")]
    BadLength { declared: usize, available: usize },

    #[error("short xor-mapped-address: family {family}, value len {len}")]
    ShortAttribute { family: u8, len: usize },

    #[error("no xor-mapped-address attribute")]
    NotFound,
}

