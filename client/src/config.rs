use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use natcheck_stun::constants::DEFAULT_ECHO_PORT;

pub const DEFAULT_SERVER: &str = "stun.l.google.com:19302";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Auto,
    Udp,
    Tcp,
}

impl Protocol {
    /// The transport actually used for a probe. `Auto` means udp only,
    /// tcp is never tried unless asked for.
    pub fn effective(self) -> Protocol {
        match self {
            Protocol::Auto | Protocol::Udp => Protocol::Udp,
            Protocol::Tcp => Protocol::Tcp,
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Protocol::Auto),
            "udp" => Ok(Protocol::Udp),
            "tcp" => Ok(Protocol::Tcp),
            v => Err(format!("unknown proto: {}, expect auto|udp|tcp", v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::V4, Family::V6];

    pub fn matches(self, ip: IpAddr) -> bool {
        match (self, ip) {
            (Family::V4, IpAddr::V4(_)) => true,
            (Family::V6, IpAddr::V6(v)) => v.to_ipv4_mapped().is_none(),
            (Family::V4, IpAddr::V6(v)) => v.to_ipv4_mapped().is_some(),
            (Family::V6, IpAddr::V4(_)) => false,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// Everything a run needs, read-only while probing.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Reflector `host:port`.
    pub server: String,
    /// Echo `host:port`; same host as `server` on the default echo port
    /// when unset.
    pub echo: Option<String>,
    pub protocol: Protocol,
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            echo: None,
            protocol: Protocol::Auto,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn echo_target(&self) -> String {
        match &self.echo {
            Some(v) => v.clone(),
            None => default_echo_target(&self.server),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER)
    }
}

pub fn default_echo_target(server: &str) -> String {
    let host = match server.rsplit_once(':') {
        Some((host, _)) => host,
        None => server,
    };
    format!("{}:{}", host, DEFAULT_ECHO_PORT)
}

/// Accepts `500ms`, `3s`, `1m` or bare seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (num, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => s.split_at(i),
        None => (s, "s"),
    };

    let value = num
        .parse::<u64>()
        .map_err(|e| format!("bad duration {:?}, {}", s, e))?;

    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value * 60),
        v => return Err(format!("bad duration unit {:?}, expect ms|s|m", v)),
    };

    if duration.is_zero() {
        return Err("timeout must be positive".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_is_udp() {
        assert_eq!(Protocol::Auto.effective(), Protocol::Udp);
        assert_eq!(Protocol::Tcp.effective(), Protocol::Tcp);
        assert_eq!("TCP".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert!("quic".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_family_matches() {
        let v4: IpAddr = "10.0.0.5".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        let mapped: IpAddr = "::ffff:10.0.0.5".parse().unwrap();

        assert!(Family::V4.matches(v4));
        assert!(!Family::V6.matches(v4));
        assert!(Family::V6.matches(v6));
        assert!(!Family::V6.matches(mapped));
        assert!(Family::V4.matches(mapped));
    }

    #[test]
    fn test_default_echo_target() {
        assert_eq!(default_echo_target("stun.example.org:3478"), "stun.example.org:8080");
        assert_eq!(default_echo_target("[2001:db8::1]:3478"), "[2001:db8::1]:8080");

        let mut config = ProbeConfig::new("1.2.3.4:3478");
        assert_eq!(config.echo_target(), "1.2.3.4:8080");
        config.echo = Some("5.6.7.8:9".to_string());
        assert_eq!(config.echo_target(), "5.6.7.8:9");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("3h").is_err());
    }
}
