use super::checksum::checksum;
use super::icmpv4::{parse_inbound, read_timestamp, ParsedDatagram, TIMESTAMP_SIZE};
use super::{SequenceNumber, Ttl};
use crate::SessionConfig;
use pnet_packet::icmp::{IcmpCode, IcmpType, IcmpTypes};
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

/// What one received datagram turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    /// A reply to one of our echo requests.
    EchoReply(EchoReplyData),
    /// An echo request: our own looped back, or another host probing us.
    ForeignEcho,
    /// Time exceeded or destination unreachable for a datagram we sent.
    IcmpError(IcmpErrorData),
    /// Well-formed ICMP that is not ours.
    Unrelated,
    /// Truncated, or failed the checksum.
    Malformed,
}

#[derive(Debug, PartialEq, Eq)]
pub struct EchoReplyData {
    pub ip_addr: IpAddr,
    pub ttl: Ttl,
    pub sequence_number: SequenceNumber,
    /// ICMP bytes, header included.
    pub package_size: usize,
    /// `None` when the reply carries no timestamp.
    pub rtt: Option<Duration>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct IcmpErrorData {
    pub ip_addr: IpAddr,
    pub ttl: Ttl,
    /// Sequence number of the request that triggered the error.
    pub sequence_number: SequenceNumber,
    pub package_size: usize,
    pub cause: IcmpErrorCause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IcmpErrorCause {
    TtlExceeded,
    FragmentReassemblyTimeExceeded,
    NetUnreachable,
    HostUnreachable,
    ProtocolUnreachable,
    PortUnreachable,
    FragmentationNeeded,
    SourceRouteFailed,
    AdministrativelyProhibited,
    Other { icmp_type: u8, icmp_code: u8 },
}

impl IcmpErrorCause {
    fn new(icmp_type: IcmpType, icmp_code: IcmpCode) -> Self {
        match (icmp_type, icmp_code.0) {
            (IcmpTypes::TimeExceeded, 0) => Self::TtlExceeded,
            (IcmpTypes::TimeExceeded, 1) => Self::FragmentReassemblyTimeExceeded,
            (IcmpTypes::DestinationUnreachable, 0) => Self::NetUnreachable,
            (IcmpTypes::DestinationUnreachable, 1) => Self::HostUnreachable,
            (IcmpTypes::DestinationUnreachable, 2) => Self::ProtocolUnreachable,
            (IcmpTypes::DestinationUnreachable, 3) => Self::PortUnreachable,
            (IcmpTypes::DestinationUnreachable, 4) => Self::FragmentationNeeded,
            (IcmpTypes::DestinationUnreachable, 5) => Self::SourceRouteFailed,
            (IcmpTypes::DestinationUnreachable, 13) => Self::AdministrativelyProhibited,
            (icmp_type, icmp_code) => Self::Other { icmp_type: icmp_type.0, icmp_code },
        }
    }
}

impl std::fmt::Display for IcmpErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TtlExceeded => write!(f, "Time to live exceeded"),
            Self::FragmentReassemblyTimeExceeded => write!(f, "Frag reassembly time exceeded"),
            Self::NetUnreachable => write!(f, "Destination Net Unreachable"),
            Self::HostUnreachable => write!(f, "Destination Host Unreachable"),
            Self::ProtocolUnreachable => write!(f, "Destination Protocol Unreachable"),
            Self::PortUnreachable => write!(f, "Destination Port Unreachable"),
            Self::FragmentationNeeded => write!(f, "Frag needed and DF set"),
            Self::SourceRouteFailed => write!(f, "Source Route Failed"),
            Self::AdministrativelyProhibited => write!(f, "Communication prohibited by filter"),
            Self::Other { icmp_type, icmp_code } => write!(f, "ICMP error type={icmp_type} code={icmp_code}"),
        }
    }
}

/// Decides what a datagram read from the raw socket means for this session.
///
/// Replies and errors are matched on the identifier only, so a late reply to
/// an earlier request is still recognised.
pub fn classify(config: &SessionConfig, datagram: &[u8], ip_addr: IpAddr, now: SystemTime) -> Inbound {
    let Some(parsed) = parse_inbound(datagram) else {
        return Inbound::Malformed;
    };
    if checksum(parsed.icmp()) != 0 {
        return Inbound::Malformed;
    }

    match parsed.icmp_type {
        IcmpTypes::EchoRequest => Inbound::ForeignEcho,
        IcmpTypes::EchoReply => classify_echo_reply(config, &parsed, ip_addr, now),
        IcmpTypes::TimeExceeded | IcmpTypes::DestinationUnreachable => classify_icmp_error(config, &parsed, ip_addr),
        _ => Inbound::Unrelated,
    }
}

fn classify_echo_reply(
    config: &SessionConfig,
    parsed: &ParsedDatagram<'_>,
    ip_addr: IpAddr,
    now: SystemTime,
) -> Inbound {
    if parsed.identifier != config.identifier {
        return Inbound::Unrelated;
    }
    let rtt = if config.payload_size >= TIMESTAMP_SIZE {
        read_timestamp(parsed.icmp_payload()).map(|sent| now.duration_since(sent).unwrap_or(Duration::ZERO))
    } else {
        None
    };
    Inbound::EchoReply(EchoReplyData {
        ip_addr,
        ttl: parsed.ttl,
        sequence_number: parsed.sequence_number,
        package_size: parsed.icmp().len(),
        rtt,
    })
}

/// The error payload is the IP header of the offending datagram plus at least
/// the first 8 bytes of its ICMP message.
fn classify_icmp_error(config: &SessionConfig, parsed: &ParsedDatagram<'_>, ip_addr: IpAddr) -> Inbound {
    let Some(original) = parse_inbound(parsed.icmp_payload()) else {
        return Inbound::Unrelated;
    };
    if original.icmp_type != IcmpTypes::EchoRequest || original.identifier != config.identifier {
        return Inbound::Unrelated;
    }
    Inbound::IcmpError(IcmpErrorData {
        ip_addr,
        ttl: parsed.ttl,
        sequence_number: original.sequence_number,
        package_size: parsed.icmp().len(),
        cause: IcmpErrorCause::new(parsed.icmp_type, parsed.icmp_code),
    })
}
