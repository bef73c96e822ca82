#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use ping_error::{GenericError, PingError, PingErrorKind, PingResult};
pub use ping_output::*;
pub use ping_session::{pacing_delay, PingSession, State};
pub use rtt_tracker::{RttSummary, RttTracker};
pub use session_config::*;
pub use session_stats::SessionStats;
pub use stop_signal::{request_stop, stop_flag, stop_requested};

pub mod icmp;
mod ping_error;
mod ping_output;
mod ping_session;
mod rtt_tracker;
mod session_config;
mod session_stats;
mod stop_signal;
