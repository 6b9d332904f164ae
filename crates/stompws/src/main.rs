mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "stompws", version, about = "STOMP client CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "stompws",
            "send",
            "127.0.0.1:61613",
            "--destination",
            "/queue/a",
            "--data",
            "hello",
            "-H",
            "priority=9",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.destination, "/queue/a");
                assert_eq!(args.headers, vec![("priority".to_string(), "9".to_string())]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_body_args() {
        let err = Cli::try_parse_from([
            "stompws",
            "send",
            "127.0.0.1:61613",
            "--destination",
            "/queue/a",
            "--file",
            "body.txt",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_header_without_equals() {
        let err = Cli::try_parse_from([
            "stompws",
            "send",
            "127.0.0.1:61613",
            "--destination",
            "/queue/a",
            "-H",
            "priority",
        ])
        .expect_err("malformed header should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_subscribe_subcommand() {
        let cli = Cli::try_parse_from([
            "stompws",
            "--format",
            "json",
            "subscribe",
            "localhost:61613",
            "--destination",
            "/topic/t",
            "--ack",
            "client-individual",
            "--count",
            "3",
        ])
        .expect("subscribe args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Subscribe(_)));
    }
}
