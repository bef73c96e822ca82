use std::{error::Error, fmt};

pub type GenericError = Box<dyn Error + Send + Sync + 'static>;

pub type PingResult<T> = std::result::Result<T, GenericError>;

/// Which stage of a session failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PingErrorKind {
    /// Raw socket creation or option setup; the session cannot start.
    SocketSetup,
    /// The destination name did not resolve to an IPv4 address.
    Resolve,
    /// One echo request could not be built or sent.
    Send,
}

#[derive(Debug)]
pub struct PingError {
    pub kind: PingErrorKind,
    pub message: String,
}

impl PingError {
    pub fn new(kind: PingErrorKind, message: impl Into<String>) -> Self {
        PingError { kind, message: message.into() }
    }

    pub fn socket_setup(message: impl Into<String>) -> Self {
        Self::new(PingErrorKind::SocketSetup, message)
    }

    pub fn resolve(message: impl Into<String>) -> Self {
        Self::new(PingErrorKind::Resolve, message)
    }

    pub fn send(message: impl Into<String>) -> Self {
        Self::new(PingErrorKind::Send, message)
    }
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "PingError")?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl Error for PingError {}

// Socket calls only fail while sending once the session runs.
impl From<std::io::Error> for PingError {
    fn from(error: std::io::Error) -> PingError {
        PingError::send(error.to_string())
    }
}
