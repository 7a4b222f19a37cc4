use std::net::SocketAddr;
use std::time::{Duration, Instant};

use natcheck::client::{probe, Classification, ProbeError};
use natcheck::config::{Family, ProbeConfig, Protocol};
use natcheck::iface::LocalInterface;
use natcheck_server::echo::EchoServer;
use natcheck_server::reflector::Reflector;
use natcheck_stun::error::ParsePacketErr;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::watch;

fn loopback() -> LocalInterface {
    LocalInterface::new("lo", vec!["127.0.0.1".parse().unwrap()])
}

fn config(server: SocketAddr) -> ProbeConfig {
    let mut config = ProbeConfig::new(server.to_string());
    config.timeout = Duration::from_secs(2);
    config
}

#[tokio::test]
async fn test_udp_probe_direct() {
    let (_tx, rx) = watch::channel(false);
    let reflector = Reflector::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let server_addr = reflector.local_addr().unwrap();
    tokio::spawn(reflector.run(rx));

    let result = probe(&loopback(), Family::V4, &config(server_addr))
        .await
        .expect("loopback has an ipv4 address");

    let observed = result.outcome.as_ref().unwrap();
    assert_eq!(observed.external, observed.internal);
    assert!(observed.internal.starts_with("127.0.0.1:"));
    assert_eq!(result.classification(), Classification::Direct);
}

#[tokio::test]
async fn test_mapped_server_literal_probed_as_v4() {
    let (_tx, rx) = watch::channel(false);
    let reflector = Reflector::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let port = reflector.local_addr().unwrap().port();
    tokio::spawn(reflector.run(rx));

    let mut config = ProbeConfig::new(format!("[::ffff:127.0.0.1]:{}", port));
    config.timeout = Duration::from_secs(2);

    let result = probe(&loopback(), Family::V4, &config).await.unwrap();

    let observed = result.outcome.as_ref().unwrap();
    assert!(observed.internal.starts_with("127.0.0.1:"));
    assert_eq!(result.classification(), Classification::Direct);
}

#[tokio::test]
async fn test_udp_probe_dual_stack_reflector() {
    let (_tx, rx) = watch::channel(false);
    let reflector = match Reflector::bind("[::]:0".parse().unwrap()).await {
        Ok(v) => v,
        Err(e) => {
            println!("skip, no ipv6 wildcard: {:?}", e);
            return;
        }
    };
    let port = reflector.local_addr().unwrap().port();
    tokio::spawn(reflector.run(rx));

    let server: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let result = probe(&loopback(), Family::V4, &config(server)).await.unwrap();

    let observed = result.outcome.as_ref().unwrap();
    assert!(observed.external.starts_with("127.0.0.1:"));
    assert_eq!(observed.external, observed.internal);
    assert_eq!(result.classification(), Classification::Direct);
}

#[tokio::test]
async fn test_udp_probe_ipv6_direct() {
    let (_tx, rx) = watch::channel(false);
    let reflector = match Reflector::bind("[::1]:0".parse().unwrap()).await {
        Ok(v) => v,
        Err(e) => {
            println!("skip, ::1 unavailable: {:?}", e);
            return;
        }
    };
    let server_addr = reflector.local_addr().unwrap();
    tokio::spawn(reflector.run(rx));

    let lo6 = LocalInterface::new("lo", vec!["::1".parse().unwrap()]);
    let result = probe(&lo6, Family::V6, &config(server_addr)).await.unwrap();

    let observed = result.outcome.as_ref().unwrap();
    assert!(observed.external.starts_with("[::1]:"));
    assert_eq!(observed.external, observed.internal);
    assert_eq!(result.classification(), Classification::Direct);
}

#[tokio::test]
async fn test_tcp_probe_direct() {
    let (_tx, rx) = watch::channel(false);
    let echo = EchoServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let echo_addr = echo.local_addr().unwrap();
    tokio::spawn(echo.run(rx));

    let mut config = config("127.0.0.1:1".parse().unwrap());
    config.protocol = Protocol::Tcp;
    config.echo = Some(echo_addr.to_string());

    let result = probe(&loopback(), Family::V4, &config).await.unwrap();

    let observed = result.outcome.as_ref().unwrap();
    assert_eq!(observed.external, observed.internal);
    assert_eq!(result.classification(), Classification::Direct);
}

#[tokio::test]
async fn test_udp_timeout() {
    // 只接收不回复
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = config(silent.local_addr().unwrap());
    config.timeout = Duration::from_millis(100);

    let start = Instant::now();
    let result = probe(&loopback(), Family::V4, &config).await.unwrap();
    let elapsed = start.elapsed();

    assert!(matches!(result.outcome, Err(ProbeError::Timeout(_))));
    assert_eq!(result.classification(), Classification::Error);
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(1), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_udp_bad_reply() {
    let fake = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = fake.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0_u8; 1500];
        if let Ok((_, from)) = fake.recv_from(&mut buf).await {
            let _ = fake.send_to(&[0xff_u8; 20], from).await;
        }
    });

    let result = probe(&loopback(), Family::V4, &config(server_addr))
        .await
        .unwrap();

    assert!(matches!(
        result.outcome,
        Err(ProbeError::Codec(ParsePacketErr::NotThisProtocol(_)))
    ));
}

#[tokio::test]
async fn test_tcp_dial_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config(closed);
    config.protocol = Protocol::Tcp;
    config.echo = Some(closed.to_string());

    let result = probe(&loopback(), Family::V4, &config).await.unwrap();
    assert!(matches!(result.outcome, Err(ProbeError::DialFailure(_))));
}

#[tokio::test]
async fn test_skip_missing_family() {
    let config = config("127.0.0.1:3478".parse().unwrap());
    assert!(probe(&loopback(), Family::V6, &config).await.is_none());
}

#[tokio::test]
async fn test_server_without_family_address() {
    let lo6 = LocalInterface::new("lo", vec!["::1".parse().unwrap()]);
    let config = config("127.0.0.1:3478".parse().unwrap());

    let result = probe(&lo6, Family::V6, &config).await.unwrap();
    assert!(matches!(result.outcome, Err(ProbeError::Resolve { .. })));
}
