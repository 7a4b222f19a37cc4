use std::process;
use std::time::Duration;

use clap::builder::ValueParser;
use clap::{Arg, ArgAction, Command};
use log::debug;

use natcheck::client::probe;
use natcheck::config::{parse_duration, ProbeConfig, Protocol, DEFAULT_SERVER};
use natcheck::iface::{self, LocalInterface};
use natcheck::report::render;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_protocol(s: &str) -> Result<Protocol, String> {
    s.parse()
}

fn parse_target(s: &str) -> Result<String, String> {
    match s.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(s.to_string()),
        _ => Err(format!("expect host:port, got {:?}", s)),
    }
}

fn select_interfaces(all: bool, name: Option<&String>) -> Result<Vec<LocalInterface>, String> {
    let list = iface::enumerate().map_err(|e| format!("list interfaces, {}", e))?;

    if all {
        return Ok(iface::non_loopback(list));
    }

    let name = name.ok_or_else(|| "either --iface or --all-ifaces required".to_string())?;
    list.into_iter()
        .find(|x| &x.name == name)
        .map(|x| vec![x])
        .ok_or_else(|| format!("no such interface: {}", name))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("check whether each interface sits behind nat")
        .arg(
            Arg::new("server")
                .long("server")
                .takes_value(true)
                .default_value(DEFAULT_SERVER)
                .help("stun server host:port")
                .value_parser(ValueParser::new(parse_target)),
        )
        .arg(
            Arg::new("echo")
                .long("echo")
                .takes_value(true)
                .help("tcp echo host:port, defaults to the server host on :8080")
                .value_parser(ValueParser::new(parse_target)),
        )
        .arg(
            Arg::new("iface")
                .long("iface")
                .takes_value(true)
                .help("interface name to test"),
        )
        .arg(
            Arg::new("all-ifaces")
                .long("all-ifaces")
                .action(ArgAction::SetTrue)
                .help("test every non-loopback interface"),
        )
        .arg(
            Arg::new("proto")
                .long("proto")
                .takes_value(true)
                .default_value("auto")
                .help("auto|udp|tcp")
                .value_parser(ValueParser::new(parse_protocol)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .takes_value(true)
                .default_value("3s")
                .help("network timeout per probe, e.g. 500ms, 3s")
                .value_parser(ValueParser::new(parse_duration)),
        )
        .get_matches();

    let server: String = app.get_one::<String>("server").cloned().expect("default server");
    let echo: Option<String> = app.get_one::<String>("echo").cloned();
    let protocol: Protocol = *app.get_one("proto").expect("default proto");
    let timeout: Duration = *app.get_one("timeout").expect("default timeout");
    let all = app.get_one::<bool>("all-ifaces").copied().unwrap_or(false);

    let config = ProbeConfig {
        server,
        echo,
        protocol,
        timeout,
    };
    debug!("{:?}", config);

    let ifaces = match select_interfaces(all, app.get_one::<String>("iface")) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    for (ifc, family) in iface::worklist(&ifaces) {
        let result = probe(ifc, family, &config).await;
        println!("{}", render(&ifc.name, family, result.as_ref()));
    }
}
