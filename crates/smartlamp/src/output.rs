use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

const SCHEMA_BASE: &str = "https://schemas.devtitans.dev/smartlamp/cli/v1";

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
pub struct AttributeReading {
    pub device: String,
    pub attribute: String,
    /// Exposure text, newline included.
    pub text: String,
    /// True when the text is the sentinel shown for a failed read.
    pub sentinel: bool,
}

#[derive(Serialize)]
pub struct AttributeWrite {
    pub device: String,
    pub attribute: String,
    pub value: String,
    pub bytes: usize,
}

#[derive(Serialize)]
pub struct AttributeRow {
    pub name: &'static str,
    pub mode: String,
    pub access: String,
    pub value_type: &'static str,
    pub read_command: Option<&'static str>,
    pub write_command: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ProbeReport {
    pub device: String,
    pub session_id: String,
    pub transport: &'static str,
    pub in_endpoint: String,
    pub out_endpoint: String,
    pub mtu: usize,
    pub frame_limit: usize,
    pub priming_reading: Option<i32>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_id: String,
    #[serde(flatten)]
    body: &'a T,
}

fn print_json<T: Serialize>(schema: &str, body: &T) {
    let out = Envelope {
        schema_id: format!("{SCHEMA_BASE}/{schema}.schema.json"),
        body,
    };
    println!(
        "{}",
        serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn print_reading(reading: &AttributeReading, format: OutputFormat) {
    let value = reading.text.trim_end_matches('\n');
    match format {
        OutputFormat::Json => print_json("attribute-reading", reading),
        OutputFormat::Table => {
            let mut table = new_table(vec!["DEVICE", "ATTRIBUTE", "VALUE"]);
            table.add_row(vec![
                reading.device.clone(),
                reading.attribute.clone(),
                value.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}={}", reading.attribute, value),
        OutputFormat::Raw => print_raw(reading.text.as_bytes()),
    }
}

pub fn print_write(write: &AttributeWrite, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json("attribute-write", write),
        OutputFormat::Table => {
            let mut table = new_table(vec!["DEVICE", "ATTRIBUTE", "WRITTEN", "BYTES"]);
            table.add_row(vec![
                write.device.clone(),
                write.attribute.clone(),
                write.value.clone(),
                write.bytes.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{} <- {}", write.attribute, write.value),
        OutputFormat::Raw => {}
    }
}

pub fn print_attributes(rows: &[AttributeRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Listing<'a> {
                attributes: &'a [AttributeRow],
            }
            print_json("attribute-list", &Listing { attributes: rows });
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["NAME", "MODE", "ACCESS", "TYPE", "READ", "WRITE"]);
            for row in rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.mode.clone(),
                    row.access.clone(),
                    row.value_type.to_string(),
                    row.read_command.unwrap_or("-").to_string(),
                    row.write_command.unwrap_or("-").to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows {
                println!("{} {} {}", row.mode, row.access, row.name);
            }
        }
    }
}

pub fn print_probe(report: &ProbeReport, format: OutputFormat) {
    let priming = report
        .priming_reading
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    match format {
        OutputFormat::Json => print_json("probe-report", report),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            table
                .add_row(vec!["device".to_string(), report.device.clone()])
                .add_row(vec!["session".to_string(), report.session_id.clone()])
                .add_row(vec!["transport".to_string(), report.transport.to_string()])
                .add_row(vec!["endpoint in".to_string(), report.in_endpoint.clone()])
                .add_row(vec!["endpoint out".to_string(), report.out_endpoint.clone()])
                .add_row(vec!["mtu".to_string(), report.mtu.to_string()])
                .add_row(vec!["frame limit".to_string(), report.frame_limit.to_string()])
                .add_row(vec!["ldr (priming)".to_string(), priming]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "device={} session={} transport={} in={} out={} mtu={} ldr={}",
                report.device,
                report.session_id,
                report.transport,
                report.in_endpoint,
                report.out_endpoint,
                report.mtu,
                priming
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
