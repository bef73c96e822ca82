use raw_ping::icmp::v4::{ICMP_HEADER_SIZE, IPV4_MIN_HEADER_SIZE};
use raw_ping::{PingErrorOutput, PingOutput, PingReceive, SessionStats};
use std::net::Ipv4Addr;
use std::time::Duration;

pub(crate) fn header(host: &str, ip: Ipv4Addr, payload_size: usize) -> String {
    let total = payload_size + ICMP_HEADER_SIZE + IPV4_MIN_HEADER_SIZE;
    format!("PING {host} ({ip}) {payload_size}({total}) bytes of data.")
}

pub(crate) fn reply(output: &PingOutput) -> String {
    let PingOutput { package_size, ip_addr, ttl, sequence_number, ping_duration, duplicate } = output;
    let mut line = format!(
        "{package_size} bytes from {ip_addr}: icmp_seq={sequence_number} ttl={ttl} time={} ms",
        millis(*ping_duration)
    );
    if *duplicate {
        line.push_str(" (DUP!)");
    }
    line
}

pub(crate) fn icmp_error(output: &PingErrorOutput) -> String {
    format!("From {} icmp_seq={} {}", output.ip_addr, output.sequence_number, output.cause)
}

/// The line for one session event, if it should be shown at all.
pub(crate) fn event(receive: &PingReceive, verbose: bool, quiet: bool) -> Option<String> {
    if quiet {
        return None;
    }
    match receive {
        PingReceive::Data(output) => Some(reply(output)),
        PingReceive::IcmpError(output) => Some(icmp_error(output)),
        PingReceive::SendFailed { sequence_number, message } => {
            Some(format!("send failed: icmp_seq={sequence_number}: {message}"))
        }
        PingReceive::Timeout { sequence_number } if verbose => {
            Some(format!("no answer yet for icmp_seq={sequence_number}"))
        }
        PingReceive::Timeout { .. } => None,
    }
}

pub(crate) fn summary(host: &str, stats: &SessionStats) -> Vec<String> {
    let mut lines = vec![format!("--- {host} ping statistics ---")];

    let mut totals = format!("{} packets transmitted, {} received, ", stats.transmitted, stats.received);
    if stats.duplicates > 0 {
        totals.push_str(&format!("+{} duplicates, ", stats.duplicates));
    }
    if stats.errors > 0 {
        totals.push_str(&format!("+{} errors, ", stats.errors));
    }
    totals.push_str(&format!(
        "{}% packet loss, time {}ms",
        format_percent(stats.packet_loss_percent()),
        stats.elapsed.as_millis()
    ));
    lines.push(totals);

    if let Some(rtt) = stats.rtt_summary() {
        lines.push(format!("rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms", rtt.min, rtt.avg, rtt.max, rtt.mdev));
    }
    lines
}

fn millis(duration: Duration) -> String {
    format!("{}.{:03}", duration.as_millis(), duration.subsec_micros() % 1000)
}

// Whole numbers print without decimals, like "20%".
fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{percent:.0}")
    } else {
        format!("{percent:.1}")
    }
}
