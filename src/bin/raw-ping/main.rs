use raw_ping::{GenericError, PingError, PingErrorKind, PingReceive, PingSession};
use std::process::ExitCode;

mod args;
mod print;
mod resolve;

const EXIT_SOCKET_SETUP: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn exit_code(kind: PingErrorKind) -> ExitCode {
    match kind {
        PingErrorKind::Resolve => ExitCode::from(EXIT_USAGE),
        PingErrorKind::SocketSetup | PingErrorKind::Send => ExitCode::from(EXIT_SOCKET_SETUP),
    }
}

fn failure(error: &GenericError) -> ExitCode {
    let kind = error.downcast_ref::<PingError>().map_or(PingErrorKind::SocketSetup, |e| e.kind);
    exit_code(kind)
}

fn max_level(args: &args::Args) -> tracing::Level {
    if args.quiet {
        tracing::Level::ERROR
    } else if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    }
}

fn parse_args() -> Result<args::Args, ExitCode> {
    let strings: Vec<String> = std::env::args().collect();
    let Some((command, rest)) = strings.split_first() else {
        return Err(ExitCode::from(EXIT_USAGE));
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    <args::Args as argh::FromArgs>::from_args(&[command.as_str()], &rest).map_err(|early_exit| {
        match early_exit.status {
            // --help
            Ok(()) => {
                println!("{}", early_exit.output);
                ExitCode::SUCCESS
            }
            Err(()) => {
                eprintln!("{}", early_exit.output);
                ExitCode::from(EXIT_USAGE)
            }
        }
    })
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(exit_code) => return exit_code,
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(max_level(&args))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("raw-ping: could not install log subscriber: {e}");
    }

    let target = match resolve::lookup_host_v4(&args.destination) {
        Ok(ip) => ip,
        Err(e) => {
            eprintln!("raw-ping: {}: {}", args.destination, e.message);
            return exit_code(e.kind);
        }
    };
    tracing::debug!("{} resolved to {target}", args.destination);

    let config = args.session_config(target);
    let (verbose, quiet) = (config.verbose, config.quiet);

    if let Err(e) = ctrlc::set_handler(raw_ping::request_stop) {
        tracing::warn!("could not install interrupt handler: {e}");
    }

    let mut session = match PingSession::open(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("raw-ping: {e}");
            return failure(&e);
        }
    };

    println!("{}", print::header(&args.destination, target, session.config().payload_size));
    if verbose {
        println!("raw-ping: identifier 0x{:04x}", session.config().identifier);
    }

    let stats = session.run(raw_ping::stop_flag(), |receive: &PingReceive| {
        if let Some(line) = print::event(receive, verbose, quiet) {
            println!("{line}");
        }
    });

    println!();
    for line in print::summary(&args.destination, &stats) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}
