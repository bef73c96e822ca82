use crate::icmp::v4::{IcmpErrorCause, Ttl};
use std::net::IpAddr;
use std::time::Duration;

/// One echo reply, ready for printing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PingOutput {
    pub package_size: usize,
    pub ip_addr: IpAddr,
    pub ttl: Ttl,
    pub sequence_number: u16,
    pub ping_duration: Duration,
    /// A second reply for a sequence number that was already answered.
    pub duplicate: bool,
}

/// An ICMP error some router sent back for one of our requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PingErrorOutput {
    pub ip_addr: IpAddr,
    pub sequence_number: u16,
    pub cause: IcmpErrorCause,
}

/// Everything a session reports while it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PingReceive {
    Data(PingOutput),
    IcmpError(PingErrorOutput),
    SendFailed { sequence_number: u16, message: String },
    /// The cycle ended without a reply for its request.
    Timeout { sequence_number: u16 },
}
