use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use stompws_frame::Frame;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    command: &'a str,
    destination: Option<&'a str>,
    subscription: Option<&'a str>,
    message_id: Option<&'a str>,
    headers: BTreeMap<&'a str, &'a str>,
    body_size: usize,
    body: &'a str,
    timestamp: String,
}

impl<'a> FrameOutput<'a> {
    fn new(frame: &'a Frame) -> Self {
        Self {
            command: &frame.command,
            destination: frame.headers.get("destination"),
            subscription: frame.headers.get("subscription"),
            message_id: frame.headers.get("message-id"),
            headers: frame.headers.iter().collect(),
            body_size: frame.body.len(),
            body: &frame.body,
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", render_json(frame));
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "DESTINATION", "SIZE", "BODY"])
                .add_row(vec![
                    frame.command.clone(),
                    frame.headers.get("destination").unwrap_or("-").to_string(),
                    frame.body.len().to_string(),
                    frame.body.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}", render_pretty(frame));
        }
        OutputFormat::Raw => {
            print_raw(frame.body.as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn render_json(frame: &Frame) -> String {
    serde_json::to_string(&FrameOutput::new(frame)).unwrap_or_else(|_| "{}".to_string())
}

fn render_pretty(frame: &Frame) -> String {
    let mut line = frame.command.clone();
    for (name, value) in frame.headers.iter() {
        line.push_str(&format!(" {name}={value}"));
    }
    line.push_str(&format!(" size={} body={}", frame.body.len(), frame.body));
    line
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
