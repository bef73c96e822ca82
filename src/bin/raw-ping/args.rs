use raw_ping::SessionConfig;
use std::net::Ipv4Addr;
use std::time::Duration;

// Largest ICMP payload that still fits one IPv4 datagram.
const MAX_PAYLOAD_SIZE: usize = 65_507;
const MIN_INTERVAL_SECS: f64 = 0.002;

#[derive(argh::FromArgs, Debug)]
/// raw-ping - send ICMP ECHO_REQUEST to a network host
pub(crate) struct Args {
    #[argh(option, short = 'c', from_str_fn(parse_count))]
    /// stop after <count> sent requests; 0 or less runs until interrupted
    pub count: Option<u64>,

    #[argh(option, short = 'i', from_str_fn(parse_interval))]
    /// seconds between sending each request (default 1)
    pub interval: Option<Duration>,

    #[argh(option, short = 't', default = "0", from_str_fn(parse_ttl))]
    /// IP time to live; 0 keeps the system default
    pub ttl: u8,

    #[argh(option, short = 's', default = "raw_ping::DEFAULT_PAYLOAD_SIZE", from_str_fn(parse_size))]
    /// number of data bytes to send (default 56)
    pub size: usize,

    #[argh(option, short = 'w', from_str_fn(parse_timeout))]
    /// milliseconds to wait for each reply (default: the interval)
    pub timeout: Option<Duration>,

    #[argh(switch, short = 'v')]
    /// verbose output
    pub verbose: bool,

    #[argh(switch, short = 'q')]
    /// print only the header and the summary
    pub quiet: bool,

    #[argh(positional)]
    /// host name or IPv4 address
    pub destination: String,
}

impl Args {
    pub(crate) fn session_config(&self, target: Ipv4Addr) -> SessionConfig {
        let defaults = SessionConfig::new(target);
        SessionConfig {
            payload_size: self.size,
            ttl: self.ttl,
            send_interval: self.interval.unwrap_or(defaults.send_interval),
            timeout: self.timeout,
            count: self.count.filter(|&count| count > 0),
            verbose: self.verbose && !self.quiet,
            quiet: self.quiet,
            ..defaults
        }
    }
}

fn parse_count(value: &str) -> Result<u64, String> {
    let count: i64 = value.parse().map_err(|_| format!("invalid count: '{value}'"))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|_| format!("invalid interval: '{value}'"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid interval: '{value}'"));
    }
    if secs > 0.0 && secs < MIN_INTERVAL_SECS {
        return Err(format!("interval too short: '{value}'"));
    }
    if secs == 0.0 {
        return Ok(Duration::from_millis(1));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let micros = (secs * 1_000_000.0).round() as u64;
    Ok(Duration::from_micros(micros))
}

fn parse_ttl(value: &str) -> Result<u8, String> {
    let ttl: i64 = value.parse().map_err(|_| format!("invalid TTL: '{value}'"))?;
    u8::try_from(ttl).map_err(|_| format!("ttl out of range: {value}"))
}

fn parse_size(value: &str) -> Result<usize, String> {
    let size: i64 = value.parse().map_err(|_| format!("invalid packet size: '{value}'"))?;
    match usize::try_from(size) {
        Ok(size) if size <= MAX_PAYLOAD_SIZE => Ok(size),
        Ok(_) => Err(format!("packet size too large: '{value}' (max {MAX_PAYLOAD_SIZE})")),
        Err(_) => Err(format!("size cannot be negative: '{value}'")),
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let millis: u64 = value.parse().map_err(|_| format!("invalid timeout: '{value}'"))?;
    Ok(Duration::from_millis(millis))
}
