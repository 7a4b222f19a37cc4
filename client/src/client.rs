use log::{debug, warn};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{lookup_host, TcpSocket, UdpSocket};

use natcheck_stun::error::ParsePacketErr;
use natcheck_stun::packet::{build_binding_request, parse_xor_mapped};
use natcheck_stun::util::{canonical_addr, new_trans_id, print_bytes};

use crate::config::{Family, ProbeConfig, Protocol};
use crate::iface::LocalInterface;

const RECV_BUF_LEN: usize = 1500;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("resolve {target}: {reason}")]
    Resolve { target: String, reason: String },

    #[error("dial: {0}")]
    DialFailure(#[source] io::Error),

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("write: {0}")]
    WriteFailure(#[source] io::Error),

    #[error("read: {0}")]
    ReadFailure(#[source] io::Error),

    #[error(transparent)]
    Codec(#[from] ParsePacketErr),
}

/// Both sides of one exchange, rendered as `ip:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub external: String,
    pub internal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Direct,
    Translated,
    Error,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Direct => write!(f, "direct"),
            Classification::Translated => write!(f, "nat"),
            Classification::Error => write!(f, "error"),
        }
    }
}

pub fn classify(external: &str, internal: &str) -> Classification {
    if external == internal {
        Classification::Direct
    } else {
        Classification::Translated
    }
}

#[derive(Debug)]
pub struct ProbeResult {
    pub family: Family,
    pub outcome: Result<Observed, ProbeError>,
}

impl ProbeResult {
    pub fn classification(&self) -> Classification {
        match &self.outcome {
            Ok(v) => classify(&v.external, &v.internal),
            Err(_) => Classification::Error,
        }
    }
}

/// Probes one `(interface, family)` pair.
///
/// Returns `None` when the interface has no address of that family.
pub async fn probe(
    iface: &LocalInterface,
    family: Family,
    config: &ProbeConfig,
) -> Option<ProbeResult> {
    let local_ip = iface.select_address(family)?;
    debug!("{} / {}, local ip: {}", iface.name, family, local_ip);

    let exchange = async {
        match config.protocol.effective() {
            Protocol::Tcp => tcp_exchange(local_ip, family, &config.echo_target()).await,
            _ => udp_exchange(local_ip, family, &config.server).await,
        }
    };

    let outcome = match tokio::time::timeout(config.timeout, exchange).await {
        Ok(v) => v,
        Err(_) => Err(ProbeError::Timeout(config.timeout)),
    };

    if let Err(e) = &outcome {
        warn!("{} / {}, {}", iface.name, family, e);
    }

    Some(ProbeResult { family, outcome })
}

async fn resolve(target: &str, family: Family) -> Result<SocketAddr, ProbeError> {
    let addrs = lookup_host(target).await.map_err(|e| ProbeError::Resolve {
        target: target.to_string(),
        reason: e.to_string(),
    })?;

    // ::ffff:a.b.c.d 按 ipv4 连接
    addrs
        .map(canonical_addr)
        .find(|x| family.matches(x.ip()))
        .ok_or_else(|| ProbeError::Resolve {
            target: target.to_string(),
            reason: format!("no {} address", family),
        })
}

async fn udp_exchange(
    local_ip: IpAddr,
    family: Family,
    server: &str,
) -> Result<Observed, ProbeError> {
    let server = resolve(server, family).await?;

    let sock = UdpSocket::bind(SocketAddr::new(local_ip, 0))
        .await
        .map_err(ProbeError::DialFailure)?;
    sock.connect(server).await.map_err(ProbeError::DialFailure)?;
    let local_addr = sock.local_addr().map_err(ProbeError::DialFailure)?;

    let request = build_binding_request(new_trans_id());
    debug!("{} --> {}\n{}", local_addr, server, print_bytes(&request, " ", 8));
    sock.send(&request).await.map_err(ProbeError::WriteFailure)?;

    let mut buf = vec![0u8; RECV_BUF_LEN];
    let len = sock.recv(&mut buf).await.map_err(ProbeError::ReadFailure)?;
    debug!("{} <-- {}\n{}", local_addr, server, print_bytes(&buf[..len], " ", 8));

    let mapped = parse_xor_mapped(&buf[..len])?;

    Ok(Observed {
        external: mapped.to_string(),
        internal: local_addr.to_string(),
    })
}

async fn tcp_exchange(
    local_ip: IpAddr,
    family: Family,
    target: &str,
) -> Result<Observed, ProbeError> {
    let target = resolve(target, family).await?;

    let socket = match family {
        Family::V4 => TcpSocket::new_v4(),
        Family::V6 => TcpSocket::new_v6(),
    }
    .map_err(ProbeError::DialFailure)?;
    socket
        .bind(SocketAddr::new(local_ip, 0))
        .map_err(ProbeError::DialFailure)?;

    let stream = socket
        .connect(target)
        .await
        .map_err(ProbeError::DialFailure)?;
    let local_addr = stream.local_addr().map_err(ProbeError::DialFailure)?;
    debug!("{} --> {}, connected", local_addr, target);

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .await
        .map_err(ProbeError::ReadFailure)?;
    if n == 0 {
        return Err(ProbeError::ReadFailure(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "echo closed without a line",
        )));
    }

    Ok(Observed {
        external: line.trim().to_string(),
        internal: local_addr.to_string(),
    })
}
