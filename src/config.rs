//! Configuration management for the credit risk service

use crate::explain::ExplanationSettings;
use crate::types::assessment::RiskBucketThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "CREDIT_RISK_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub risk: RiskBucketThresholds,
    #[serde(default)]
    pub explanation: ExplanationSettings,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject carrying incoming applications
    pub application_subject: String,
    /// Subject for assessments of requests without a reply subject
    pub assessment_subject: String,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the fitted pipeline artifact (JSON)
    pub artifact_path: String,
    /// Intra-op threads for an ONNX model stage
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum assessments in flight
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `$CREDIT_RISK_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(File::from(path))
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path.display()))?;

        let app_config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        let RiskBucketThresholds { medium, high } = self.risk;
        if !(0.0 < medium && medium < high && high <= 1.0) {
            anyhow::bail!("risk thresholds must satisfy 0 < medium < high <= 1 (got {medium}, {high})");
        }
        if self.explanation.top_n == 0 {
            anyhow::bail!("explanation.top_n must be at least 1");
        }
        let floor = self.explanation.min_impact_percent;
        if !(floor.is_finite() && floor >= 0.0) {
            anyhow::bail!("explanation.min_impact_percent must be finite and non-negative (got {floor})");
        }
        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                application_subject: "credit.applications".to_string(),
                assessment_subject: "credit.assessments".to_string(),
            },
            model: ModelConfig {
                artifact_path: "models/credit_risk_model.json".to_string(),
                onnx_threads: default_onnx_threads(),
            },
            risk: RiskBucketThresholds::default(),
            explanation: ExplanationSettings::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "credit-risk-{}-{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.application_subject, "credit.applications");
        assert_eq!(config.risk.medium, 0.10);
        assert_eq!(config.risk.high, 0.25);
        assert_eq!(config.explanation.top_n, 5);
        assert_eq!(config.explanation.min_impact_percent, 0.1);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_bundled_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.nats.assessment_subject, "credit.assessments");
        assert_eq!(config.model.artifact_path, "models/credit_risk_model.json");
        assert_eq!(config.pipeline.metrics_interval_secs, 30);
    }

    #[test]
    fn test_optional_sections_fall_back_to_defaults() {
        let path = write_config(
            "minimal",
            r#"
[nats]
url = "nats://broker:4222"
application_subject = "apps"
assessment_subject = "scores"

[model]
artifact_path = "model.json"

[pipeline]
workers = 2

[logging]
level = "debug"
format = "json"
"#,
        );
        let config = AppConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.risk.high, 0.25);
        assert_eq!(config.explanation.top_n, 5);
        assert_eq!(config.pipeline.metrics_interval_secs, 30);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let path = write_config(
            "inverted",
            r#"
[nats]
url = "nats://localhost:4222"
application_subject = "apps"
assessment_subject = "scores"

[model]
artifact_path = "model.json"

[risk]
medium = 0.3
high = 0.2

[pipeline]
workers = 2

[logging]
level = "info"
format = "pretty"
"#,
        );
        let result = AppConfig::load_from_path(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_explanation_limits_validated() {
        let base = r#"
[nats]
url = "nats://localhost:4222"
application_subject = "apps"
assessment_subject = "scores"

[model]
artifact_path = "model.json"

[pipeline]
workers = 2

[logging]
level = "info"
format = "pretty"
"#;
        let cases = [
            ("zero-top-n", "top_n = 0\nmin_impact_percent = 0.1", false),
            ("negative-floor", "top_n = 5\nmin_impact_percent = -1.0", false),
            ("valid-limits", "top_n = 3\nmin_impact_percent = 0.0", true),
        ];
        for (name, explanation, ok) in cases {
            let path = write_config(name, &format!("{base}\n[explanation]\n{explanation}\n"));
            let result = AppConfig::load_from_path(&path);
            std::fs::remove_file(&path).ok();
            assert_eq!(result.is_ok(), ok, "{name}");
        }
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load_from_path("/nonexistent/credit-risk.toml").is_err());
    }
}
