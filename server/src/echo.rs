use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch::Receiver as WatchReceiver;

use log::{debug, error, info};
use natcheck_stun::util::canonical_addr;

use crate::net::bind_tcp;

/// Fallback for networks that drop UDP: every connection gets one line with
/// the peer address and is closed.
pub struct EchoServer {
    listener: TcpListener,
}

impl EchoServer {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = bind_tcp(addr)?;
        info!("echo listening: {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self, mut signal_rx: WatchReceiver<bool>) {
        loop {
            tokio::select! {
                res = self.listener.accept() => {
                    match res {
                        Ok((stream, remote_addr)) => {
                            tokio::spawn(async move {
                                if let Err(e) = answer(stream, remote_addr).await {
                                    error!("error, echo ---> {}, {:?}", remote_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("error, accept, {:?}", e);
                        }
                    }
                },
                _ = signal_rx.changed() => {
                    debug!("recv signal, echo will exit.");
                    break;
                }
            }
        }
    }
}

pub fn echo_line(remote_addr: SocketAddr) -> String {
    format!("{}\n", canonical_addr(remote_addr))
}

async fn answer(mut stream: TcpStream, remote_addr: SocketAddr) -> io::Result<()> {
    let line = echo_line(remote_addr);
    stream.write_all(line.as_bytes()).await?;
    stream.shutdown().await?;
    debug!("---> {}, {}", remote_addr, line.trim_end());
    Ok(())
}
