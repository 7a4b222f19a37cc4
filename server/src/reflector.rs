use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::watch::Receiver as WatchReceiver;

use bytes::Bytes;
use log::{debug, error, info};
use natcheck_stun::constants::{HEADER_LEN, TRANS_ID_LEN};
use natcheck_stun::header::{is_binding_request, TransId};
use natcheck_stun::packet::build_binding_response;
use natcheck_stun::util::{canonical_addr, print_bytes};

use crate::net::bind_udp;

const RECV_BUF_LEN: usize = 1500;

/// Answers binding requests with the source address the datagram arrived
/// from. Keeps no state between datagrams.
pub struct Reflector {
    socket: UdpSocket,
}

impl Reflector {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = bind_udp(addr)?;
        info!("reflector listening: {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn run(self, mut signal_rx: WatchReceiver<bool>) {
        let mut buf = vec![0u8; RECV_BUF_LEN];

        loop {
            tokio::select! {
                res = self.socket.recv_from(&mut buf) => {
                    match res {
                        Ok((len, remote_addr)) => {
                            self.process_one(&buf[..len], remote_addr).await;
                        }
                        Err(e) => {
                            error!("error, recv_from, {:?}", e);
                        }
                    }
                },
                _ = signal_rx.changed() => {
                    debug!("recv signal, reflector will exit.");
                    break;
                }
            }
        }
    }

    async fn process_one(&self, data: &[u8], remote_addr: SocketAddr) {
        debug!("<--- {}\n{}", remote_addr, print_bytes(data, " ", 8));

        let response = match reflect(data, remote_addr) {
            Some(v) => v,
            None => {
                debug!("drop {} bytes from {}, not a binding request", data.len(), remote_addr);
                return;
            }
        };

        match self.socket.send_to(&response, remote_addr).await {
            Ok(v) => {
                debug!("---> {}, sent: {}\n{}", remote_addr, v, print_bytes(&response, " ", 8));
            }
            Err(e) => {
                error!("error, ---> {}, {:?}", remote_addr, e);
            }
        }
    }
}

/// Builds the reply for one datagram, `None` when it should be dropped.
///
/// Only the size and the low byte of the message type are looked at; the
/// transaction id is echoed back untouched.
pub fn reflect(data: &[u8], remote_addr: SocketAddr) -> Option<Bytes> {
    if !is_binding_request(data) {
        return None;
    }

    let mut trans_id: TransId = [0_u8; TRANS_ID_LEN];
    trans_id.copy_from_slice(&data[HEADER_LEN - TRANS_ID_LEN..HEADER_LEN]);

    Some(build_binding_response(trans_id, canonical_addr(remote_addr)))
}
