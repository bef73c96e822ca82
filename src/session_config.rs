use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_PAYLOAD_SIZE: usize = 56;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Everything a `PingSession` needs to know, validated up front.
///
/// The session never re-validates these values; it only applies the floors
/// that keep the receive loop from spinning (see [`SessionConfig::interval`]
/// and [`SessionConfig::reply_timeout`]).
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Goes into every echo request; replies and errors carrying another
    /// identifier belong to somebody else.
    pub identifier: u16,
    pub target: Ipv4Addr,
    /// ICMP payload bytes after the 8-byte header.
    pub payload_size: usize,
    /// 0 keeps the operating system default.
    pub ttl: u8,
    pub send_interval: Duration,
    /// How long one cycle waits for its reply. `None` waits one interval.
    pub timeout: Option<Duration>,
    /// Stop after this many requests were sent. `None` runs until stopped.
    pub count: Option<u64>,
    pub verbose: bool,
    pub quiet: bool,
}

impl SessionConfig {
    pub fn new(target: Ipv4Addr) -> Self {
        Self {
            identifier: identifier_from_pid(),
            target,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            ttl: 0,
            send_interval: DEFAULT_INTERVAL,
            timeout: None,
            count: None,
            verbose: false,
            quiet: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.send_interval.max(MIN_WAIT)
    }

    pub fn reply_timeout(&self) -> Duration {
        self.timeout.unwrap_or(self.send_interval).max(MIN_WAIT)
    }

    pub(crate) fn count_reached(&self, sent: u64) -> bool {
        matches!(self.count, Some(limit) if sent >= limit)
    }
}

/// Lower 16 bits of the process id.
pub fn identifier_from_pid() -> u16 {
    #[allow(clippy::cast_possible_truncation)]
    let identifier = (std::process::id() & 0xFFFF) as u16;
    identifier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::new(Ipv4Addr::LOCALHOST);
        assert_eq!(56, config.payload_size);
        assert_eq!(Duration::from_secs(1), config.interval());
        assert_eq!(Duration::from_secs(1), config.reply_timeout());
        assert!(config.count.is_none());
        assert!(!config.count_reached(u64::MAX));
    }

    #[test]
    fn zero_interval_is_floored() {
        let config = SessionConfig { send_interval: Duration::ZERO, ..SessionConfig::new(Ipv4Addr::LOCALHOST) };
        assert_eq!(Duration::from_millis(1), config.interval());
        assert_eq!(Duration::from_millis(1), config.reply_timeout());
    }

    #[test]
    fn explicit_timeout_overrides_interval() {
        let config =
            SessionConfig { timeout: Some(Duration::from_millis(250)), ..SessionConfig::new(Ipv4Addr::LOCALHOST) };
        assert_eq!(Duration::from_millis(250), config.reply_timeout());
    }

    #[test]
    fn count_limit_counts_sent_requests() {
        let config = SessionConfig { count: Some(3), ..SessionConfig::new(Ipv4Addr::LOCALHOST) };
        assert!(!config.count_reached(2));
        assert!(config.count_reached(3));
        assert!(config.count_reached(4));
    }

    #[test]
    fn identifier_is_derived_from_pid() {
        assert_eq!(std::process::id() & 0xFFFF, u32::from(identifier_from_pid()));
    }
}
