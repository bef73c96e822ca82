mod checksum;
pub use checksum::checksum;

mod classify;
pub use classify::{classify, EchoReplyData, IcmpErrorCause, IcmpErrorData, Inbound};

mod icmpv4;
pub use icmpv4::{
    build_echo_request, parse_inbound, read_timestamp, write_timestamp, ParsedDatagram, ICMP_HEADER_SIZE,
    IPV4_MIN_HEADER_SIZE, TIMESTAMP_SIZE,
};

mod sequence_number;
pub use sequence_number::SequenceNumber;

mod socket;
pub use socket::raw_socket::RawSocket;
pub use socket::TSocket;
#[cfg(test)]
pub(crate) use socket::tests;

mod ttl;
pub use ttl::Ttl;
