// ==========================================
// 水洗尺寸质检系统 - 配置层
// ==========================================
// 职责: 系统配置管理, JSON 文件 + 默认值
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod qa_config;

// 重导出核心配置管理器
pub use config_manager::{default_config_path, ConfigError, ConfigManager, CONFIG_ENV_VAR};
pub use import_config_trait::ImportConfigReader;
pub use qa_config::{ImportSettings, QaConfig, ToleranceSettings};
