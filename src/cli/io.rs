//! File and stdout handling for the CLI
//!
//! - Input: JSON files (schema document, values)
//! - Output: single JSON object via stdout, UTF-8 only

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a UTF-8 text file; a missing file is a configuration error
pub fn read_text(path: &Path) -> CliResult<String> {
    if !path.exists() {
        return Err(CliError::config_error(format!(
            "file not found: {}",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> CliResult<Value> {
    let text = read_text(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_read_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.json");
        fs::write(&path, r#"{"number": 1}"#).unwrap();
        assert_eq!(read_json(&path).unwrap(), serde_json::json!({"number": 1}));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = read_text(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        let err = read_json(&path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
