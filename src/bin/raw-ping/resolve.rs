use raw_ping::PingError;
use std::net::{IpAddr, Ipv4Addr};

/// Literal addresses are used as they are; names go through the system
/// resolver and the first IPv4 answer wins.
pub(crate) fn lookup_host_v4(hostname: &str) -> Result<Ipv4Addr, PingError> {
    if let Ok(ip) = hostname.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let ips: Vec<IpAddr> = dns_lookup::lookup_host(hostname)
        .map_err(|e| PingError::resolve(format!("could not resolve hostname {hostname}: {e}")))?;
    ips.into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| PingError::resolve(format!("could not resolve hostname {hostname} to IPv4")))
}
