// ==========================================
// 水洗尺寸质检系统 - 配置项定义
// ==========================================
// 职责: 定义配置文件结构与默认值
// 格式: JSON (camelCase), 缺失字段取默认值
// ==========================================

use crate::engine::fraction::DEFAULT_FRACTION_SNAP;
use crate::engine::tolerance::{ToleranceEvaluator, DEFAULT_TOLERANCE_EPSILON};
use serde::{Deserialize, Serialize};

// ==========================================
// ToleranceSettings - 公差判定配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToleranceSettings {
    /// 边界容差（浮点误差）
    pub epsilon: f64,
    /// 小数 → 分数 的吸附容差
    pub fraction_snap: f64,
}

impl Default for ToleranceSettings {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_TOLERANCE_EPSILON,
            fraction_snap: DEFAULT_FRACTION_SNAP,
        }
    }
}

impl ToleranceSettings {
    pub fn evaluator(&self) -> ToleranceEvaluator {
        ToleranceEvaluator::new(self.epsilon)
    }
}

// ==========================================
// ImportSettings - 导入配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportSettings {
    /// 允许导入的扩展名（小写, 不含点）
    pub allowed_extensions: Vec<String>,
    /// 跳过的工作表名（如 "说明", "封面"）
    pub ignored_sheets: Vec<String>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: ["xlsx", "xlsm", "xls", "xlsb", "ods", "csv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_sheets: Vec::new(),
        }
    }
}

impl ImportSettings {
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    pub fn is_ignored(&self, sheet_name: &str) -> bool {
        self.ignored_sheets
            .iter()
            .any(|s| s.trim() == sheet_name.trim())
    }
}

// ==========================================
// QaConfig - 配置根
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QaConfig {
    pub tolerance: ToleranceSettings,
    pub import: ImportSettings,
}
