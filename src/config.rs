use crate::security::{RuleSet, ScanOptions};
use crate::services::GatherOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "ARTIFACT_GUARD_CONFIG";
const CONFIG_DIR_NAME: &str = "artifact-guard";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// 扫描配置，所有字段均有默认值，YAML 中可只写需要覆盖的部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 工作线程数，0 表示使用 rayon 默认值
    pub workers: usize,
    pub max_bytes_per_file: Option<u64>,
    pub batch_timeout_secs: Option<u64>,
    /// 报告 JSON 的落盘位置（可选）
    pub report_path: Option<PathBuf>,
    pub gather: GatherOptions,
    pub rules: RuleSet,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_bytes_per_file: Some(64 * 1024 * 1024),
            batch_timeout_secs: None,
            report_path: None,
            gather: GatherOptions::default(),
            rules: RuleSet::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse scan config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml(&yaml).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// 配置文件位置：环境变量优先，其次为用户配置目录
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// 读取配置；文件不存在或解析失败时回退到内置默认配置
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config file at {:?}, using built-in defaults", path);
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded scan config from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!(
                    "Config file could not be parsed, falling back to built-in defaults: {:?}, error: {:#}",
                    path,
                    e
                );
                Self::default()
            }
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            workers: self.workers,
            batch_timeout: self.batch_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Severity};
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let yaml = r#"
workers: 4
batch_timeout_secs: 30
gather:
  max_files: 10
rules:
  backdoor_triggers: ["TRIGGER", "SLEEPER_AGENT"]
  applicability:
    code_injection: [code, other]
"#;
        let config = ScanConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.max_bytes_per_file, ScanConfig::default().max_bytes_per_file);
        assert_eq!(config.gather.max_files, 10);
        assert_eq!(config.gather.max_depth, 20);
        assert_eq!(config.rules.backdoor_triggers.len(), 2);
        assert_eq!(config.rules.risky_calls, RuleSet::default().risky_calls);
        assert_eq!(
            config.rules.applicability.get("code_injection"),
            Some(&vec![Category::Code, Category::Other])
        );

        let options = config.scan_options();
        assert_eq!(options.workers, 4);
        assert_eq!(options.batch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_severity_rules_from_yaml() {
        let yaml = r#"
rules:
  severity_rules:
    - severity: critical
      keywords: ["private key"]
    - severity: medium
      keywords: ["Emails found"]
"#;
        let config = ScanConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.rules.severity_rules.len(), 2);
        assert_eq!(config.rules.severity_rules[0].severity, Severity::Critical);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "workers: [not, a, number]\n").expect("write config");

        assert!(ScanConfig::from_file(&path).is_err());
        assert_eq!(ScanConfig::load_or_default(&path), ScanConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = ScanConfig::load_or_default(&dir.path().join("absent.yaml"));
        assert_eq!(config, ScanConfig::default());
    }
}
