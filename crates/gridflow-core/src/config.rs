//! Config-file loading shared by the network and thermal crates.
//!
//! Supports RON, TOML and JSON, detected from the file extension.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value parsed but is out of range.
    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `text` in the given format. `origin` names the source in
/// error messages.
pub fn from_str<T: DeserializeOwned>(
    format: Format,
    text: &str,
    origin: &Path,
) -> Result<T, ConfigError> {
    let parse_error = |detail: String| ConfigError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(text).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    log::debug!("loading {format:?} config from {}", path.display());
    from_str(format, &content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        rate: u64,
    }

    #[test]
    fn detects_known_extensions() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("a.yaml")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn parses_every_format() {
        let expected = Sample {
            name: "pipe".into(),
            rate: 250,
        };
        let origin = Path::new("inline");
        let ron: Sample = from_str(Format::Ron, r#"(name: "pipe", rate: 250)"#, origin).unwrap();
        let toml: Sample = from_str(Format::Toml, "name = \"pipe\"\nrate = 250\n", origin).unwrap();
        let json: Sample =
            from_str(Format::Json, r#"{"name": "pipe", "rate": 250}"#, origin).unwrap();
        assert_eq!(ron, expected);
        assert_eq!(toml, expected);
        assert_eq!(json, expected);
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = from_str::<Sample>(Format::Json, "{", Path::new("bad.json")).unwrap_err();
        match err {
            ConfigError::Parse { file, .. } => assert_eq!(file, PathBuf::from("bad.json")),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn load_file_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("gridflow-config-{}.ron", std::process::id()));
        std::fs::write(&path, r#"(name: "tube", rate: 750)"#).unwrap();
        let loaded: Sample = load_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.rate, 750);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_file::<Sample>(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
