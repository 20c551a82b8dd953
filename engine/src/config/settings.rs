// Engine settings, loaded from a JSON config file (every field optional) and
// overridable from the command line.
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::net::framer::HeaderFormat;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    pub tcp: TcpSettings,
    pub pipeline: PipelineSettings,
    pub model: ModelSettings,
    /// Used when RUST_LOG is not set.
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TcpSettings {
    pub host: String,
    pub port: u16,
    /// Python `struct` style length header, e.g. "!I" for 4-byte big-endian.
    pub header_format: HeaderFormat,
    pub max_frame_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineSettings {
    /// Lag depth for feature expansion; the prediction window holds one more row than this.
    pub lookback_period: usize,
    /// Half-width of the swing labelling window.
    pub swing_strength: usize,
    /// Extra numeric row fields appended to the ratio features, in this order.
    pub passthrough_features: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelSettings {
    pub dir: PathBuf,
    pub key: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            tcp: TcpSettings::default(),
            pipeline: PipelineSettings::default(),
            model: ModelSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for TcpSettings {
    fn default() -> Self {
        TcpSettings {
            host: "127.0.0.1".to_string(),
            port: 5000,
            header_format: HeaderFormat::default(),
            max_frame_len: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            lookback_period: 5,
            swing_strength: 25,
            passthrough_features: Vec::new(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            dir: PathBuf::from("models"),
            key: "swing_model".to_string(),
        }
    }
}

impl EngineSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigError(format!("Failed to read '{}': {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: EngineSettings = serde_json::from_str(raw)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tcp.host.trim().is_empty() {
            return Err(EngineError::ConfigError("tcp.host must not be empty".to_string()));
        }
        if self.tcp.max_frame_len == 0 {
            return Err(EngineError::ConfigError("tcp.max_frame_len must be greater than 0".to_string()));
        }
        if self.model.key.trim().is_empty() {
            return Err(EngineError::ConfigError("model.key must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.tcp.host, self.tcp.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::framer::{ByteOrder, HeaderWidth};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.listen_addr(), "127.0.0.1:5000");
        assert_eq!(settings.pipeline.lookback_period, 5);
        assert_eq!(settings.pipeline.swing_strength, 25);
        assert_eq!(settings.tcp.header_format.width, HeaderWidth::Four);
        assert_eq!(settings.tcp.header_format.order, ByteOrder::Big);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let settings = EngineSettings::from_json(
            r#"{ "tcp": { "port": 6000, "header_format": "<H" }, "pipeline": { "lookback_period": 50 } }"#,
        )
        .unwrap();
        assert_eq!(settings.tcp.host, "127.0.0.1");
        assert_eq!(settings.tcp.port, 6000);
        assert_eq!(settings.tcp.header_format.width, HeaderWidth::Two);
        assert_eq!(settings.tcp.header_format.order, ByteOrder::Little);
        assert_eq!(settings.pipeline.lookback_period, 50);
        assert_eq!(settings.pipeline.swing_strength, 25);
        assert_eq!(settings.model.key, "swing_model");
    }

    #[test]
    fn test_bad_header_format_rejected() {
        let result = EngineSettings::from_json(r#"{ "tcp": { "header_format": "!x" } }"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_empty_host_rejected() {
        let result = EngineSettings::from_json(r#"{ "tcp": { "host": " " } }"#);
        assert!(result.unwrap_err().to_string().contains("tcp.host"));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "model": {{ "dir": "/tmp/models", "key": "es_5m" }}, "log_level": "debug" }}"#).unwrap();
        file.flush().unwrap();
        let settings = EngineSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.model.dir, PathBuf::from("/tmp/models"));
        assert_eq!(settings.model.key, "es_5m");
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_missing_file() {
        let result = EngineSettings::from_file("does/not/exist.json");
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }
}
