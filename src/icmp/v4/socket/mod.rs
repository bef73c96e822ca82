use std::io;
use std::net::IpAddr;
use std::time::Duration;

pub(crate) mod raw_socket;

/// The only thing a `PingSession` needs from the operating system.
///
/// `recv_from` hands back the whole IPv4 datagram, header included, so the
/// TTL and any datagram embedded in an ICMP error can be read.
pub trait TSocket: Send + Sync {
    /// Bounds the next `recv_from`; a zero timeout is not allowed.
    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()>;
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)>;
}
