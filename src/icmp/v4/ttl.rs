/// IP time-to-live, either requested for outgoing datagrams or read from a
/// received one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct Ttl(pub u8);

impl Ttl {
    /// A requested TTL of 0 means "leave the operating system default".
    pub fn requested(hops: u8) -> Option<Ttl> {
        (hops != 0).then_some(Ttl(hops))
    }

    /// `IP_TTL` takes an int.
    pub(crate) fn socket_option(self) -> u32 {
        u32::from(self.0)
    }
}

impl From<u8> for Ttl {
    fn from(hops: u8) -> Self {
        Ttl(hops)
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
