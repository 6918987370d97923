use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mapbridge_frame::Response;
use serde_json::Value;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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

pub fn print_response(response: &Response, format: OutputFormat) {
    println!("{}", render_response(response, format));
}

pub fn print_names(names: &[&str], format: OutputFormat) {
    println!("{}", render_names(names, format));
}

fn render_response(response: &Response, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(response).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Pretty => {
            serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = new_table();
            match response {
                Response::Success { result } => {
                    table.set_header(vec!["KEY", "VALUE"]);
                    match result {
                        Value::Object(map) => {
                            for (key, value) in map {
                                table.add_row(vec![key.clone(), cell(value)]);
                            }
                        }
                        other => {
                            table.add_row(vec!["result".to_string(), cell(other)]);
                        }
                    }
                }
                Response::Failure { message } => {
                    table
                        .set_header(vec!["STATUS", "MESSAGE"])
                        .add_row(vec!["error".to_string(), message.clone()]);
                }
            }
            table.to_string()
        }
    }
}

fn render_names(names: &[&str], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string()),
        OutputFormat::Pretty => names.join("\n"),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["COMMAND"]);
            for name in names {
                table.add_row(vec![name.to_string()]);
            }
            table.to_string()
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

// Strings print bare; everything else as compact JSON.
fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_output_is_the_wire_envelope() {
        let response = Response::success(json!({"pong": true}));
        let rendered = render_response(&response, OutputFormat::Json);
        assert_eq!(rendered, r#"{"status":"success","result":{"pong":true}}"#);
    }

    #[test]
    fn table_output_lists_result_fields() {
        let response = Response::success(json!({"name": "mapbridge", "layers": 3}));
        let rendered = render_response(&response, OutputFormat::Table);
        assert!(rendered.contains("KEY"));
        assert!(rendered.contains("mapbridge"));
        assert!(!rendered.contains("\"mapbridge\""));
        assert!(rendered.contains('3'));
    }

    #[test]
    fn table_output_shows_failure_message() {
        let response = Response::failure("Unknown command type: nope");
        let rendered = render_response(&response, OutputFormat::Table);
        assert!(rendered.contains("STATUS"));
        assert!(rendered.contains("Unknown command type: nope"));
    }

    #[test]
    fn names_render_in_every_format() {
        let names = ["get_info", "ping"];
        assert_eq!(
            render_names(&names, OutputFormat::Json),
            r#"["get_info","ping"]"#
        );
        assert_eq!(render_names(&names, OutputFormat::Pretty), "get_info\nping");
        assert!(render_names(&names, OutputFormat::Table).contains("COMMAND"));
    }
}
