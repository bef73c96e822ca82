use crate::icmp::v4::{
    build_echo_request, classify, EchoReplyData, IcmpErrorData, Inbound, RawSocket, SequenceNumber, TSocket, Ttl,
};
use crate::{PingError, PingErrorOutput, PingOutput, PingReceive, PingResult, SessionConfig, SessionStats};
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};

// Largest possible IPv4 datagram.
const RECV_BUFFER_SIZE: usize = 65_535;
const MIN_RECV_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Idle,
    Running,
    Draining,
    Terminated,
}

enum CycleEnd {
    Answered,
    NoReply,
    Aborted,
}

/// Time left to sleep so that sends stay one interval apart.
pub fn pacing_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// A single-target echo session: one request in flight, sent once per
/// interval until the count limit is reached or a stop is requested.
pub struct PingSession<S> {
    states: Vec<State>,
    config: SessionConfig,
    socket: Option<S>,
    destination: socket2::SockAddr,
    sequence_number: SequenceNumber,
    cycles: u64,
    send_records: HashMap<SequenceNumber, Instant>,
    stats: SessionStats,
}

impl PingSession<RawSocket> {
    /// Opens the raw socket. Fails when the socket cannot be created or
    /// configured; the session never starts in that case.
    pub fn open(config: SessionConfig) -> PingResult<Self> {
        let socket = RawSocket::new(config.reply_timeout(), Ttl::requested(config.ttl)).map_err(|e| {
            tracing::error!("{e}");
            e
        })?;
        Ok(Self::with_socket(config, socket))
    }
}

impl<S> PingSession<S>
where
    S: TSocket,
{
    pub fn with_socket(config: SessionConfig, socket: S) -> Self {
        let destination = SocketAddr::new(IpAddr::V4(config.target), 0).into();
        PingSession {
            states: vec![State::Idle],
            config,
            socket: Some(socket),
            destination,
            sequence_number: SequenceNumber::start_value(),
            cycles: 0,
            send_records: HashMap::new(),
            stats: SessionStats::new(),
        }
    }

    pub fn get_states(&self) -> Vec<State> {
        self.states.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs the session to completion and returns the final totals.
    ///
    /// `stop` is polled before every send, after every receive attempt and
    /// at least once per reply timeout while pacing.
    /// Every reply, matching ICMP error, send failure and unanswered request
    /// is handed to `report` as it happens. A session runs once; later calls
    /// return the totals of the first run.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut report: F) -> SessionStats
    where
        F: FnMut(&PingReceive),
    {
        if self.states.last() != Some(&State::Idle) {
            return self.stats.clone();
        }
        self.set_state(State::Running);
        self.stats.start = Instant::now();

        while !self.should_drain(stop) {
            let cycle_start = Instant::now();
            let cycle_end = self.cycle(stop, &mut report);
            self.sequence_number = self.sequence_number.next();
            self.cycles += 1;

            if matches!(cycle_end, CycleEnd::Aborted) || self.should_drain(stop) {
                break;
            }
            let delay = pacing_delay(self.config.interval(), cycle_start.elapsed());
            tracing::trace!("sleeping {delay:?} until next send");
            self.pause(delay, stop);
        }

        self.set_state(State::Draining);
        self.terminate();
        self.stats.clone()
    }

    fn set_state(&mut self, state: State) {
        tracing::debug!("session state {:?} -> {:?}", self.states.last(), state);
        self.states.push(state);
    }

    // A failed send still uses up one cycle of the count.
    fn should_drain(&self, stop: &AtomicBool) -> bool {
        stop.load(Ordering::SeqCst) || self.config.count_reached(self.cycles)
    }

    // Sleeps in slices of at most one reply timeout so a stop request is
    // noticed as quickly while pacing as while waiting for a reply.
    fn pause(&self, delay: Duration, stop: &AtomicBool) {
        let wake_up = Instant::now() + delay;
        let slice = self.config.reply_timeout();
        loop {
            let now = Instant::now();
            if now >= wake_up || stop.load(Ordering::SeqCst) {
                return;
            }
            std::thread::sleep((wake_up - now).min(slice));
        }
    }

    fn terminate(&mut self) {
        self.socket = None;
        self.stats.elapsed = self.stats.start.elapsed();
        self.set_state(State::Terminated);
    }

    fn cycle<F>(&mut self, stop: &AtomicBool, report: &mut F) -> CycleEnd
    where
        F: FnMut(&PingReceive),
    {
        let sequence_number = self.sequence_number;
        if let Err(e) = self.send(sequence_number) {
            tracing::warn!("error sending icmp_seq={sequence_number}: {e}");
            report(&PingReceive::SendFailed { sequence_number: sequence_number.into(), message: e.to_string() });
            return CycleEnd::NoReply;
        }
        self.stats.transmitted += 1;
        self.wait_for_reply(sequence_number, stop, report)
    }

    fn send(&mut self, sequence_number: SequenceNumber) -> PingResult<()> {
        let socket = self.socket.as_ref().ok_or_else(|| PingError::send("socket already closed"))?;
        let package = build_echo_request(&self.config, sequence_number)
            .ok_or_else(|| PingError::send("could not create ICMP package"))?;
        let send_time = Instant::now();
        socket.send_to(&package, &self.destination)?;
        tracing::trace!("icmp_seq={sequence_number} sent to {}", self.config.target);
        self.send_records.insert(sequence_number, send_time);
        Ok(())
    }

    fn wait_for_reply<F>(&mut self, sequence_number: SequenceNumber, stop: &AtomicBool, report: &mut F) -> CycleEnd
    where
        F: FnMut(&PingReceive),
    {
        let deadline = Instant::now() + self.config.reply_timeout();
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        loop {
            if stop.load(Ordering::SeqCst) {
                return CycleEnd::Aborted;
            }
            if Instant::now() >= deadline {
                report(&PingReceive::Timeout { sequence_number: sequence_number.into() });
                return CycleEnd::NoReply;
            }

            let Some(socket) = self.socket.as_ref() else {
                return CycleEnd::Aborted;
            };
            // Noise must not push the wait past this cycle's deadline.
            let remaining = deadline.saturating_duration_since(Instant::now()).max(MIN_RECV_TIMEOUT);
            if let Err(e) = socket.set_read_timeout(remaining) {
                tracing::warn!("could not set receive timeout: {e}");
            }
            let (n, ip_addr) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if is_timeout(&e) => {
                    if stop.load(Ordering::SeqCst) {
                        return CycleEnd::Aborted;
                    }
                    report(&PingReceive::Timeout { sequence_number: sequence_number.into() });
                    return CycleEnd::NoReply;
                }
                Err(e) => {
                    tracing::warn!("error receiving icmp: {e}");
                    return CycleEnd::NoReply;
                }
            };
            let receive_time = Instant::now();

            match classify(&self.config, &buf[..n], ip_addr, SystemTime::now()) {
                Inbound::EchoReply(data) => {
                    let output = self.accept_reply(data, receive_time);
                    let duplicate = output.duplicate;
                    report(&PingReceive::Data(output));
                    if !duplicate {
                        return CycleEnd::Answered;
                    }
                }
                Inbound::IcmpError(data) => {
                    report(&PingReceive::IcmpError(self.accept_icmp_error(data)));
                    return CycleEnd::Answered;
                }
                Inbound::ForeignEcho => tracing::trace!("discarding echo request from {ip_addr}"),
                Inbound::Unrelated => tracing::trace!("discarding unrelated icmp from {ip_addr}"),
                Inbound::Malformed => tracing::trace!("discarding malformed datagram ({n} bytes) from {ip_addr}"),
            }
        }
    }

    fn accept_reply(&mut self, data: EchoReplyData, receive_time: Instant) -> PingOutput {
        let EchoReplyData { ip_addr, ttl, sequence_number, package_size, rtt } = data;
        let send_time = self.send_records.remove(&sequence_number);
        let duplicate = send_time.is_none();
        let ping_duration = rtt
            .or_else(|| send_time.map(|sent| receive_time.saturating_duration_since(sent)))
            .unwrap_or_default();

        if duplicate {
            self.stats.duplicates += 1;
            tracing::debug!("duplicate reply for icmp_seq={sequence_number}");
        } else {
            self.stats.received += 1;
            self.stats.rtt.record(ping_duration);
            tracing::trace!("icmp_seq={sequence_number} answered in {ping_duration:?}");
        }

        PingOutput { package_size, ip_addr, ttl, sequence_number: sequence_number.into(), ping_duration, duplicate }
    }

    fn accept_icmp_error(&mut self, data: IcmpErrorData) -> PingErrorOutput {
        self.stats.errors += 1;
        tracing::debug!("icmp_seq={} {} from {}", data.sequence_number, data.cause, data.ip_addr);
        PingErrorOutput { ip_addr: data.ip_addr, sequence_number: data.sequence_number.into(), cause: data.cause }
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted)
}
