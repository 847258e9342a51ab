//! Line-oriented I/O for the CLI
//!
//! - Input: one statement per line
//! - Output: one JSON object per line
//! - Logs never go to the output stream

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Statements from `input`, blank lines skipped
pub fn read_statements(input: impl BufRead) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

fn write_line(mut out: impl Write, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn success(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

fn failure(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response
pub fn write_response(out: impl Write, data: Value) -> CliResult<()> {
    write_line(out, &success(data))
}

/// Write an error response
pub fn write_error(out: impl Write, code: &str, message: &str) -> CliResult<()> {
    write_line(out, &failure(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let mut buf = Vec::new();
        write_response(&mut buf, json!({ "tag": "SELECT" })).unwrap();
        write_error(&mut buf, "SIMULA_INJECTED_ERROR", "boom").unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["data"]["tag"], "SELECT");
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["code"], "SIMULA_INJECTED_ERROR");
    }

    #[test]
    fn test_read_statements_skips_blank_lines() {
        let input = "SELECT 1\n\n   \nCOMMIT\n";
        let statements: Vec<String> = read_statements(input.as_bytes())
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(statements, vec!["SELECT 1", "COMMIT"]);
    }
}
