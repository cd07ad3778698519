// ==========================================
// 水洗尺寸质检系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、保存
// 存储: JSON 文件 (WASHING_QA_CONFIG 或 用户配置目录/washing-qa/config.json)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::qa_config::{ImportSettings, QaConfig, ToleranceSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 配置文件路径环境变量
pub const CONFIG_ENV_VAR: &str = "WASHING_QA_CONFIG";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 [{path}]: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件写入失败 [{path}]: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败 [{path}]: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 默认配置文件路径
///
/// 优先级: 环境变量 > 用户配置目录 > 当前目录
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("washing-qa"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: Option<PathBuf>,
    config: QaConfig,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::from_config(QaConfig::default())
    }
}

impl ConfigManager {
    /// 内存配置（不关联文件）
    pub fn from_config(config: QaConfig) -> Self {
        Self { path: None, config }
    }

    /// 从指定路径加载, 文件不存在时使用默认值
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path_str.clone(),
                source,
            })?;
            let config: QaConfig =
                serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path_str.clone(),
                    source,
                })?;
            info!(path = %path_str, "配置文件加载完成");
            config
        } else {
            debug!(path = %path_str, "配置文件不存在, 使用默认配置");
            QaConfig::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            config,
        })
    }

    /// 从默认路径加载
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_path(default_config_path())
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 覆写配置并写回文件（如有关联路径）
    pub fn update(&mut self, config: QaConfig) -> Result<(), ConfigError> {
        self.config = config;
        self.save()
    }

    /// 写回配置文件
    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let path_str = path.display().to_string();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path_str.clone(),
                source,
            })?;
        }

        let json = self.snapshot().map_err(|source| ConfigError::Parse {
            path: path_str.clone(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path_str.clone(),
            source,
        })?;

        info!(path = %path_str, "配置文件已保存");
        Ok(())
    }

    /// 配置快照（JSON）
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.config)
    }
}

impl ImportConfigReader for ConfigManager {
    fn import_settings(&self) -> &ImportSettings {
        &self.config.import
    }

    fn tolerance_settings(&self) -> &ToleranceSettings {
        &self.config.tolerance
    }
}
