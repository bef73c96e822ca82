use super::TSocket;
use crate::icmp::v4::Ttl;
use crate::PingError;
use socket2::{Domain, Protocol, Type};
use std::{io, net::IpAddr, time::Duration};

/// `SOCK_RAW` / `IPPROTO_ICMP`. Needs root or `CAP_NET_RAW`.
pub struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    /// Opens the socket and applies the receive timeout and, when one was
    /// requested, the outgoing TTL. Any failure here is fatal for the session.
    pub fn new(timeout: Duration, ttl: Option<Ttl>) -> Result<Self, PingError> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
            .map_err(|e| PingError::socket_setup(format!("could not create raw socket: {e}")))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| PingError::socket_setup(format!("could not set socket timeout: {e}")))?;
        if let Some(ttl) = ttl {
            socket
                .set_ttl(ttl.socket_option())
                .map_err(|e| PingError::socket_setup(format!("could not set TTL {ttl}: {e}")))?;
        }
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.socket.set_read_timeout(Some(timeout))
    }

    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`: it never writes uninitialized bytes into it.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get the IP packet, header included.
        let (n, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(*buf) as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let ip = socket_addr
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sender is not an IP address"))?
            .ip();
        Ok((n, ip))
    }
}
