// ./natcheck-server --udp [::]:3478 --tcp [::]:8080

use log::{debug, error, info};
use std::net::SocketAddr;
use std::process;

use clap::{Arg, ArgAction, Command};

use natcheck_server::echo::EchoServer;
use natcheck_server::reflector::Reflector;
use natcheck_server::signal::shutdown_channel;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("binding reflector and address echo for nat detection")
        .arg(
            Arg::new("udp")
                .long("udp")
                .takes_value(true)
                .default_value("[::]:3478")
                .help("reflector listen address")
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new("tcp")
                .long("tcp")
                .takes_value(true)
                .default_value("[::]:8080")
                .help("echo listen address")
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new("no-echo")
                .long("no-echo")
                .action(ArgAction::SetTrue)
                .help("don't start the tcp echo service"),
        )
        .get_matches();

    let udp_addr: SocketAddr = *app.get_one("udp").expect("default udp address");
    let tcp_addr: SocketAddr = *app.get_one("tcp").expect("default tcp address");
    let no_echo = app.get_one::<bool>("no-echo").copied().unwrap_or(false);

    debug!("udp:{}  tcp:{}  echo:{}", udp_addr, tcp_addr, !no_echo);

    let signal_rx = shutdown_channel();
    let mut handles = vec![];

    let reflector = match Reflector::bind(udp_addr).await {
        Ok(v) => v,
        Err(e) => {
            error!("error, bind reflector {}, {:?}", udp_addr, e);
            process::exit(1);
        }
    };
    let rx = signal_rx.clone();
    handles.push(tokio::spawn(async move {
        reflector.run(rx).await;
    }));

    if !no_echo {
        let echo = match EchoServer::bind(tcp_addr).await {
            Ok(v) => v,
            Err(e) => {
                error!("error, bind echo {}, {:?}", tcp_addr, e);
                process::exit(1);
            }
        };
        let rx = signal_rx.clone();
        handles.push(tokio::spawn(async move {
            echo.run(rx).await;
        }));
    }

    info!("start server ...");

    for v in handles {
        let _ = v.await;
    }

    info!("end.");
}
