use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use stompws_client::Heartbeat;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod send;
pub mod session;
pub mod subscribe;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message.
    Send(SendArgs),
    /// Subscribe and print received messages.
    Subscribe(SubscribeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Subscribe(args) => subscribe::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection options shared by every networked command.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Broker address (host:port).
    pub addr: String,
    /// Login for the CONNECT frame.
    #[arg(long, env = "STOMPWS_LOGIN", requires = "passcode")]
    pub login: Option<String>,
    /// Passcode for the CONNECT frame.
    #[arg(long, env = "STOMPWS_PASSCODE", requires = "login", hide_env_values = true)]
    pub passcode: Option<String>,
    /// Virtual host sent as the `host` header.
    #[arg(long)]
    pub vhost: Option<String>,
    /// STOMP version to request.
    #[arg(long, value_name = "VERSION", default_value = "1.2", value_parser = ["1.0", "1.1", "1.2"])]
    pub stomp_version: String,
    /// Heartbeat as OUTGOING,INCOMING milliseconds.
    #[arg(long, value_name = "OUT,IN", default_value = "10000,10000", value_parser = parse_heartbeat)]
    pub heartbeat: Heartbeat,
    /// Send frames as binary transport messages.
    #[arg(long)]
    pub binary: bool,
    /// Connect and CONNECTED timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Destination to send to.
    #[arg(long, short = 'd')]
    pub destination: String,
    /// Message body.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the message body from a UTF-8 file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Extra header, repeatable.
    #[arg(long = "header", short = 'H', value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Ask for a RECEIPT and wait for it.
    #[arg(long)]
    pub receipt: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AckMode {
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    pub fn header_value(self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

#[derive(Args, Debug)]
pub struct SubscribeArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Destination to subscribe to.
    #[arg(long, short = 'd')]
    pub destination: String,
    /// Acknowledgement mode. Messages are acked after printing unless `auto`.
    #[arg(long, value_enum, default_value = "auto")]
    pub ack: AckMode,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

fn parse_header(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{input}`")),
    }
}

fn parse_heartbeat(input: &str) -> Result<Heartbeat, String> {
    let (outgoing, incoming) = input
        .split_once(',')
        .ok_or_else(|| format!("expected OUT,IN milliseconds, got `{input}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid heartbeat milliseconds: `{part}`"))
    };
    Ok(Heartbeat {
        outgoing: parse(outgoing)?,
        incoming: parse(incoming)?,
    })
}
