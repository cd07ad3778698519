// ==========================================
// 水洗尺寸质检系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入与判定所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::qa_config::{ImportSettings, ToleranceSettings};
use crate::engine::tolerance::ToleranceEvaluator;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager
pub trait ImportConfigReader: Send + Sync {
    /// 导入配置（扩展名白名单 / 忽略工作表）
    fn import_settings(&self) -> &ImportSettings;

    /// 公差判定配置
    fn tolerance_settings(&self) -> &ToleranceSettings;

    /// 是否允许导入该扩展名
    fn allows_extension(&self, ext: &str) -> bool {
        self.import_settings().allows_extension(ext)
    }

    /// 是否忽略该工作表
    fn ignored_sheet(&self, sheet_name: &str) -> bool {
        self.import_settings().is_ignored(sheet_name)
    }

    /// 按配置构建公差判定器
    fn evaluator(&self) -> ToleranceEvaluator {
        self.tolerance_settings().evaluator()
    }
}
