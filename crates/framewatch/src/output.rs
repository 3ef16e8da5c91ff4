use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framewatch_store::LogRecord;
use serde::Serialize;

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

/// One diagnostics record, printed as it is appended.
pub fn print_log_record(record: &LogRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json_line(record)),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "[{}] {:?}: {}",
                record.level.as_str(),
                record.source,
                record.text
            );
        }
        OutputFormat::Raw => println!("{}", record.text),
    }
}

/// Print `rows` as a two-column table, or `value` as one JSON line.
pub fn print_report<T: Serialize>(value: &T, rows: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json_line(value)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (key, val) in rows {
                table.add_row(vec![key.to_string(), val.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            let line = rows
                .iter()
                .map(|(key, val)| format!("{key}={val}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

/// Print a list of records as a table with `header`, or as JSON lines.
pub fn print_rows<T: Serialize>(
    items: &[T],
    header: &[&str],
    row: impl Fn(&T) -> Vec<String>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            for item in items {
                println!("{}", to_json_line(item));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header.to_vec());
            for item in items {
                table.add_row(row(item));
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for item in items {
                let line = header
                    .iter()
                    .zip(row(item))
                    .map(|(key, val)| format!("{}={val}", key.to_lowercase()))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
            }
        }
    }
}

pub fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn to_json_line<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
