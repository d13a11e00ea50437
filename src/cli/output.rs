//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{IngestMode, LexstatArgs, OutputFormat};
use crate::error::Result;
use crate::statistics::CorpusSummary;
use crate::tally::PassState;

/// Result of an `ingest` run.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestReport {
    pub mode: IngestMode,
    pub store: String,
    pub passes: usize,
    pub documents_read: usize,
    pub documents_counted: usize,
    pub documents_ignored: usize,
    pub corpus_length: usize,
    pub vocab_size: usize,
    pub token_count: u64,
    pub pass_state: Option<PassState>,
    pub duration_ms: u64,
}

/// Result of a `stats` run.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsReport {
    pub mode: IngestMode,
    #[serde(flatten)]
    pub summary: CorpusSummary,
    pub pass_state: Option<PassState>,
}

/// One row of `lookup` output; `count` is `None` for unseen tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupRow {
    pub token: String,
    pub count: Option<u64>,
}

/// One row of `vocab` output.
#[derive(Debug, Serialize, Deserialize)]
pub struct VocabRow {
    pub token: String,
    pub count: u64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &LexstatArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Csv => output_csv(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &LexstatArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!("{}", "═".repeat(message.chars().count()));
    }

    let value = serde_json::to_value(result)?;
    for line in render_human(&value) {
        println!("{line}");
    }
    Ok(())
}

/// Render a value as lines: arrays of objects become aligned tables,
/// objects become `key: value` lines.
fn render_human(value: &Value) -> Vec<String> {
    match value {
        Value::Array(rows) if rows.iter().all(Value::is_object) => render_table(rows),
        Value::Object(obj) => {
            let mut lines = Vec::new();
            for (key, val) in obj {
                match val {
                    Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
                        lines.push(format!("{key}:"));
                        lines.extend(render_table(rows).into_iter().map(|l| format!("  {l}")));
                    }
                    Value::Object(inner) => {
                        let parts: Vec<String> = inner
                            .iter()
                            .map(|(k, v)| format!("{k}={}", format_value(v)))
                            .collect();
                        lines.push(format!("{key}: {}", parts.join(", ")));
                    }
                    _ => lines.push(format!("{key}: {}", format_value(val))),
                }
            }
            lines
        }
        _ => vec![format_value(value)],
    }
}

fn render_table(rows: &[Value]) -> Vec<String> {
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return vec!["(empty)".to_string()];
    };
    let headers: Vec<&String> = first.keys().collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |row: Vec<&str>| -> String {
        row.iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(headers.iter().map(|h| h.as_str()).collect()));
    lines.push(
        widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &LexstatArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Output in CSV format.
fn output_csv<T: Serialize>(result: &T, _args: &LexstatArgs) -> Result<()> {
    for line in render_csv(&serde_json::to_value(result)?) {
        println!("{line}");
    }
    Ok(())
}

fn render_csv(value: &Value) -> Vec<String> {
    match value {
        Value::Array(arr) => {
            let mut lines = Vec::with_capacity(arr.len() + 1);
            if let Some(obj) = arr.first().and_then(Value::as_object) {
                lines.push(obj.keys().cloned().collect::<Vec<_>>().join(","));
            }
            for item in arr {
                if let Some(obj) = item.as_object() {
                    let values: Vec<String> = obj.values().map(format_csv_value).collect();
                    lines.push(values.join(","));
                } else {
                    lines.push(format_csv_value(item));
                }
            }
            lines
        }
        Value::Object(obj) => {
            let mut lines = vec!["key,value".to_string()];
            for (key, value) in obj {
                lines.push(format!("{key},{}", format_csv_value(value)));
            }
            lines
        }
        _ => vec!["value".to_string(), format_csv_value(value)],
    }
}

/// Format a JSON value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.6}")
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        Value::Object(obj) => {
            let parts: Vec<String> = obj
                .iter()
                .map(|(k, v)| format!("{k}={}", format_value(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Null => "-".to_string(),
    }
}

/// Format a JSON value for CSV output.
fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                let escaped = s.replace('"', "\"\"");
                format!("\"{escaped}\"")
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => {
            let escaped = format_value(value).replace('"', "\"\"");
            format!("\"{escaped}\"")
        }
        Value::Null => "".to_string(),
    }
}
