use super::checksum::checksum;
use super::{SequenceNumber, Ttl};
use crate::SessionConfig;
use pnet_packet::icmp::{
    echo_reply::EchoReplyPacket,
    echo_request::{EchoRequestPacket as EchoRequestPacketV4, MutableEchoRequestPacket as MutableEchoRequestPacketV4},
    IcmpCode, IcmpPacket, IcmpType, IcmpTypes,
};
use pnet_packet::ipv4::Ipv4Packet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const ICMP_HEADER_SIZE: usize = 8;
pub const IPV4_MIN_HEADER_SIZE: usize = 20;
pub const TIMESTAMP_SIZE: usize = 8;

const FILL_FIRST: u8 = b'!';
const FILL_PERIOD: usize = 56;

/// Builds a complete ICMP echo request: header, send timestamp, fill pattern.
///
/// The result is exactly `8 + config.payload_size` bytes with a valid
/// checksum. The first 8 payload bytes carry the current wall-clock time when
/// the payload is large enough to hold it.
pub fn build_echo_request(config: &SessionConfig, sequence_number: SequenceNumber) -> Option<Vec<u8>> {
    new_icmpv4_package(config.identifier, sequence_number, config.payload_size, SystemTime::now())
}

pub(crate) fn new_icmpv4_package(
    identifier: u16,
    sequence_number: SequenceNumber,
    payload_size: usize,
    send_time: SystemTime,
) -> Option<Vec<u8>> {
    let mut payload = vec![0u8; payload_size];
    fill_payload(&mut payload);
    if let Some(slot) = payload.get_mut(..TIMESTAMP_SIZE) {
        if let Ok(slot) = slot.try_into() {
            write_timestamp(slot, send_time);
        }
    }

    let mut buf = vec![0u8; EchoRequestPacketV4::minimum_packet_size() + payload_size];
    {
        let mut package = MutableEchoRequestPacketV4::new(&mut buf)?;
        package.set_icmp_type(IcmpTypes::EchoRequest);
        package.set_icmp_code(IcmpCode::new(0));
        package.set_identifier(identifier);
        package.set_sequence_number(sequence_number.into());
        package.set_payload(&payload);
        package.set_checksum(0_u16);
    }
    let value = checksum(&buf);
    buf[2..4].copy_from_slice(&value.to_be_bytes());
    Some(buf)
}

fn fill_payload(payload: &mut [u8]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let offset = (i % FILL_PERIOD) as u8;
        *byte = FILL_FIRST + offset;
    }
}

/// Seconds since the epoch then microseconds, both u32 big-endian.
pub fn write_timestamp(slot: &mut [u8; TIMESTAMP_SIZE], time: SystemTime) {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    #[allow(clippy::cast_possible_truncation)]
    let secs = since_epoch.as_secs() as u32;
    let (seconds, micros) = slot.split_at_mut(4);
    seconds.copy_from_slice(&secs.to_be_bytes());
    micros.copy_from_slice(&since_epoch.subsec_micros().to_be_bytes());
}

pub fn read_timestamp(buf: &[u8]) -> Option<SystemTime> {
    let secs = u32::from_be_bytes(buf.get(..4)?.try_into().ok()?);
    let micros = u32::from_be_bytes(buf.get(4..TIMESTAMP_SIZE)?.try_into().ok()?);
    let since_epoch = Duration::from_secs(u64::from(secs)) + Duration::from_micros(u64::from(micros));
    UNIX_EPOCH.checked_add(since_epoch)
}

/// Header fields of a received IPv4 datagram carrying ICMP.
#[derive(Debug)]
pub struct ParsedDatagram<'a> {
    pub ip_header_len: usize,
    pub ttl: Ttl,
    pub icmp_type: IcmpType,
    pub icmp_code: IcmpCode,
    /// Bytes 4..6 of the ICMP header. Only meaningful for echo messages.
    pub identifier: u16,
    /// Bytes 6..8 of the ICMP header. Only meaningful for echo messages.
    pub sequence_number: SequenceNumber,
    icmp: &'a [u8],
}

impl<'a> ParsedDatagram<'a> {
    /// The ICMP message, header included.
    pub fn icmp(&self) -> &'a [u8] {
        self.icmp
    }

    /// Everything after the 8-byte ICMP header.
    pub fn icmp_payload(&self) -> &'a [u8] {
        &self.icmp[ICMP_HEADER_SIZE..]
    }
}

/// Splits a raw-socket datagram into its IP and ICMP headers.
///
/// Returns `None` for anything that cannot hold an IPv4 header followed by a
/// full ICMP header. Relevance is not decided here.
pub fn parse_inbound(datagram: &[u8]) -> Option<ParsedDatagram<'_>> {
    let ipv4_packet = Ipv4Packet::new(datagram)?;
    if ipv4_packet.get_version() != 4 {
        return None;
    }
    let ip_header_len = usize::from(ipv4_packet.get_header_length()) * 4;
    if ip_header_len < IPV4_MIN_HEADER_SIZE || datagram.len() < ip_header_len + ICMP_HEADER_SIZE {
        return None;
    }

    let icmp = &datagram[ip_header_len..];
    let icmp_packet = IcmpPacket::new(icmp)?;
    // Echo request and reply share the layout; the view is only used to read
    // the identifier and sequence words.
    let echo_packet = EchoReplyPacket::new(icmp)?;

    Some(ParsedDatagram {
        ip_header_len,
        ttl: ipv4_packet.get_ttl().into(),
        icmp_type: icmp_packet.get_icmp_type(),
        icmp_code: icmp_packet.get_icmp_code(),
        identifier: echo_packet.get_identifier(),
        sequence_number: echo_packet.get_sequence_number().into(),
        icmp,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pnet_packet::ipv4::MutableIpv4Packet;

    /// Wraps an ICMP message in a minimal IPv4 header, the way a raw socket
    /// hands it to us.
    pub(crate) fn wrap_in_ipv4(icmp: &[u8], ttl: u8, source: std::net::Ipv4Addr) -> Vec<u8> {
        let mut buf = vec![0u8; IPV4_MIN_HEADER_SIZE + icmp.len()];
        {
            let mut ip = MutableIpv4Packet::new(&mut buf).unwrap();
            ip.set_version(4);
            ip.set_header_length(5);
            ip.set_total_length(u16::try_from(IPV4_MIN_HEADER_SIZE + icmp.len()).unwrap());
            ip.set_ttl(ttl);
            ip.set_next_level_protocol(pnet_packet::ip::IpNextHeaderProtocols::Icmp);
            ip.set_source(source);
            ip.set_destination(std::net::Ipv4Addr::LOCALHOST);
        }
        buf[IPV4_MIN_HEADER_SIZE..].copy_from_slice(icmp);
        buf
    }

    /// Turns one of our echo requests into the matching echo reply.
    pub(crate) fn as_echo_reply(request: &[u8]) -> Vec<u8> {
        let mut reply = request.to_vec();
        reply[0] = IcmpTypes::EchoReply.0;
        reply[2] = 0;
        reply[3] = 0;
        let value = checksum(&reply);
        reply[2..4].copy_from_slice(&value.to_be_bytes());
        reply
    }

    #[test]
    fn echo_request_layout() {
        let config = SessionConfig { identifier: 0xBEEF, ..SessionConfig::new(std::net::Ipv4Addr::LOCALHOST) };
        let package = build_echo_request(&config, SequenceNumber::from(7)).unwrap();

        assert_eq!(ICMP_HEADER_SIZE + 56, package.len());
        let request = EchoRequestPacketV4::new(&package).unwrap();
        assert_eq!(IcmpTypes::EchoRequest, request.get_icmp_type());
        assert_eq!(IcmpCode::new(0), request.get_icmp_code());
        assert_eq!(0xBEEF, request.get_identifier());
        assert_eq!(7, request.get_sequence_number());
        assert_eq!(0, checksum(&package));
    }

    #[test]
    fn checksum_matches_pnet() {
        let package = new_icmpv4_package(1, SequenceNumber::from(2), 56, SystemTime::now()).unwrap();
        let icmp = IcmpPacket::new(&package).unwrap();
        assert_eq!(pnet_packet::icmp::checksum(&icmp), icmp.get_checksum());
    }

    #[test]
    fn payload_sizes() {
        for payload_size in [0usize, 1, 7, 8, 9, 56, 1472] {
            let package = new_icmpv4_package(1, SequenceNumber::from(0), payload_size, SystemTime::now()).unwrap();
            assert_eq!(ICMP_HEADER_SIZE + payload_size, package.len());
            assert_eq!(0, checksum(&package));
        }
    }

    #[test]
    fn payload_is_timestamp_then_pattern() {
        let send_time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_000);
        let package = new_icmpv4_package(1, SequenceNumber::from(0), 64, send_time).unwrap();
        let payload = &package[ICMP_HEADER_SIZE..];

        assert_eq!(Some(send_time), read_timestamp(payload));
        assert_eq!(b'!' + 8, payload[8]);
        assert_eq!(b'!' + 55, payload[55]);
        assert_eq!(b'!', payload[56]);
        assert_eq!(b'!' + 7, payload[63]);
    }

    #[test]
    fn short_payload_has_no_timestamp() {
        let package = new_icmpv4_package(1, SequenceNumber::from(0), 4, SystemTime::now()).unwrap();
        assert_eq!(b"!\"#$", &package[ICMP_HEADER_SIZE..]);
    }

    #[test]
    fn identical_arguments_differ_only_in_timestamp() {
        let first = new_icmpv4_package(9, SequenceNumber::from(3), 56, UNIX_EPOCH + Duration::from_secs(1)).unwrap();
        let second = new_icmpv4_package(9, SequenceNumber::from(3), 56, UNIX_EPOCH + Duration::from_secs(2)).unwrap();
        assert_eq!(first[..2], second[..2]);
        assert_eq!(first[4..ICMP_HEADER_SIZE], second[4..ICMP_HEADER_SIZE]);
        assert_eq!(first[ICMP_HEADER_SIZE + TIMESTAMP_SIZE..], second[ICMP_HEADER_SIZE + TIMESTAMP_SIZE..]);
        let timestamp = ICMP_HEADER_SIZE..ICMP_HEADER_SIZE + TIMESTAMP_SIZE;
        assert_ne!(first[timestamp.clone()], second[timestamp]);
    }

    #[test]
    fn timestamp_slot_round_trip() {
        let time = UNIX_EPOCH + Duration::new(1_234_567_890, 999_999_000);
        let mut slot = [0u8; TIMESTAMP_SIZE];
        write_timestamp(&mut slot, time);

        assert_eq!(1_234_567_890_u32.to_be_bytes(), slot[..4]);
        assert_eq!(999_999_u32.to_be_bytes(), slot[4..]);
        assert_eq!(Some(time), read_timestamp(&slot));
    }

    #[test]
    fn payloads_shorter_than_a_timestamp_are_left_alone() {
        for payload_size in 0..TIMESTAMP_SIZE {
            let package = new_icmpv4_package(1, SequenceNumber::from(0), payload_size, SystemTime::now()).unwrap();
            let payload = &package[ICMP_HEADER_SIZE..];
            assert!(payload.iter().enumerate().all(|(i, b)| *b == b'!' + u8::try_from(i).unwrap()));
        }
    }

    #[test]
    fn read_timestamp_needs_eight_bytes() {
        assert!(read_timestamp(&[0u8; 7]).is_none());
    }

    #[test]
    fn parse_inbound_extracts_headers() {
        let request = new_icmpv4_package(0x1234, SequenceNumber::from(42), 56, SystemTime::now()).unwrap();
        let datagram = wrap_in_ipv4(&as_echo_reply(&request), 61, std::net::Ipv4Addr::new(10, 0, 0, 1));

        let parsed = parse_inbound(&datagram).unwrap();
        assert_eq!(IPV4_MIN_HEADER_SIZE, parsed.ip_header_len);
        assert_eq!(Ttl(61), parsed.ttl);
        assert_eq!(IcmpTypes::EchoReply, parsed.icmp_type);
        assert_eq!(0x1234, parsed.identifier);
        assert_eq!(SequenceNumber::from(42), parsed.sequence_number);
        assert_eq!(ICMP_HEADER_SIZE + 56, parsed.icmp().len());
        assert_eq!(56, parsed.icmp_payload().len());
    }

    #[test]
    fn parse_inbound_honours_ip_options() {
        let request = new_icmpv4_package(1, SequenceNumber::from(5), 8, SystemTime::now()).unwrap();
        let plain = wrap_in_ipv4(&request, 64, std::net::Ipv4Addr::LOCALHOST);
        // Same datagram with 4 bytes of IP options (IHL = 6).
        let mut datagram = plain[..IPV4_MIN_HEADER_SIZE].to_vec();
        datagram[0] = 0x46;
        datagram.extend_from_slice(&[1, 1, 1, 0]);
        datagram.extend_from_slice(&request);

        let parsed = parse_inbound(&datagram).unwrap();
        assert_eq!(24, parsed.ip_header_len);
        assert_eq!(SequenceNumber::from(5), parsed.sequence_number);
    }

    #[test]
    fn parse_inbound_rejects_truncated_datagrams() {
        let request = new_icmpv4_package(1, SequenceNumber::from(0), 0, SystemTime::now()).unwrap();
        let datagram = wrap_in_ipv4(&request, 64, std::net::Ipv4Addr::LOCALHOST);

        assert!(parse_inbound(&datagram).is_some());
        assert!(parse_inbound(&datagram[..datagram.len() - 1]).is_none());
        assert!(parse_inbound(&datagram[..IPV4_MIN_HEADER_SIZE - 1]).is_none());
        assert!(parse_inbound(&[]).is_none());
    }

    #[test]
    fn parse_inbound_rejects_bad_header_length() {
        let request = new_icmpv4_package(1, SequenceNumber::from(0), 56, SystemTime::now()).unwrap();
        let mut datagram = wrap_in_ipv4(&request, 64, std::net::Ipv4Addr::LOCALHOST);
        datagram[0] = 0x44;
        assert!(parse_inbound(&datagram).is_none());
        datagram[0] = 0x4F;
        assert!(parse_inbound(&datagram[..40]).is_none());
    }
}
