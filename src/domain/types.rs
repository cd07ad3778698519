// ==========================================
// 水洗尺寸质检系统 - 领域类型定义
// ==========================================
// 职责: 分数值、公差区间、公差判定结果、判定枚举
// 红线: 纯数据结构, 不含解析逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分数值 (Fraction Value)
// ==========================================
// raw: 原始或规范化后的显示文本
// decimal: 保留 4 位小数的数值, 无法解析时为 None
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FractionValue {
    pub raw: String,
    pub decimal: Option<f64>,
}

impl FractionValue {
    /// 空值（raw 为空串, 无数值）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 无数值的原样保留
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            decimal: None,
        }
    }

    pub fn has_value(&self) -> bool {
        self.decimal.is_some()
    }

    /// 数值绝对值, 缺失视为 0
    pub fn magnitude(&self) -> f64 {
        self.decimal.unwrap_or(0.0).abs()
    }
}

// ==========================================
// 公差区间 (Tolerance Envelope)
// ==========================================
// 比较时 minus / plus 一律取绝对值, 符号仅用于显示
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToleranceEnvelope {
    pub minus: FractionValue,
    pub plus: FractionValue,
}

impl ToleranceEnvelope {
    pub fn new(minus: FractionValue, plus: FractionValue) -> Self {
        Self { minus, plus }
    }

    /// 下限（负数或 0）
    pub fn lower_bound(&self) -> f64 {
        -self.minus.magnitude()
    }

    /// 上限（正数或 0）
    pub fn upper_bound(&self) -> f64 {
        self.plus.magnitude()
    }
}

// ==========================================
// 公差判定结果 (Tolerance Result)
// ==========================================
// 非默认值时 is_within / is_positive_out / is_negative_out 恰有一个为 true
// is_default = true 时 is_within 必为 true
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToleranceResult {
    pub is_within: bool,
    pub is_default: bool,
    pub is_positive_out: bool,
    pub is_negative_out: bool,
    pub deviation: f64,
    pub min: f64,
    pub max: f64,
}

impl ToleranceResult {
    /// 未测量（默认值）结果: 一律合格
    pub fn default_pass(min: f64, max: f64) -> Self {
        Self {
            is_within: true,
            is_default: true,
            is_positive_out: false,
            is_negative_out: false,
            deviation: 0.0,
            min,
            max,
        }
    }

    pub fn is_fail(&self) -> bool {
        !self.is_within
    }
}

// ==========================================
// 系统判定 (System Decision)
// ==========================================
// 由测量数据推导, 不单独存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemDecision {
    Pass,
    Fail,
    Pending,
}

impl fmt::Display for SystemDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemDecision::Pass => write!(f, "pass"),
            SystemDecision::Fail => write!(f, "fail"),
            SystemDecision::Pending => write!(f, "pending"),
        }
    }
}

// ==========================================
// 单条测量流的判定
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamVerdict {
    Pass,
    Fail,
}

// ==========================================
// 检验员判定 (Inspector Decision)
// ==========================================
// 人工录入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectorDecision {
    Pass,
    Fail,
}

impl fmt::Display for InspectorDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectorDecision::Pass => write!(f, "pass"),
            InspectorDecision::Fail => write!(f, "fail"),
        }
    }
}

// ==========================================
// 水洗阶段 (Wash Stage)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WashStage {
    AfterWashing,  // 洗后
    BeforeWashing, // 洗前
}

impl WashStage {
    /// 列标签（模板固定文本）
    pub fn label(&self) -> &'static str {
        match self {
            WashStage::AfterWashing => "After Washing",
            WashStage::BeforeWashing => "Before Washing",
        }
    }
}

// ==========================================
// 测量流类型 (Stream Kind)
// ==========================================
// 全部测量点 / 关键测量点, 各自独立计件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamKind {
    AllPoints,
    CriticalPoints,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::AllPoints => write!(f, "allPoints"),
            StreamKind::CriticalPoints => write!(f, "criticalPoints"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_bounds_use_magnitudes() {
        let env = ToleranceEnvelope::new(
            FractionValue {
                raw: "-1/4".to_string(),
                decimal: Some(-0.25),
            },
            FractionValue {
                raw: "1/2".to_string(),
                decimal: Some(0.5),
            },
        );
        assert_eq!(env.lower_bound(), -0.25);
        assert_eq!(env.upper_bound(), 0.5);

        let missing = ToleranceEnvelope::default();
        assert_eq!(missing.lower_bound(), 0.0);
        assert_eq!(missing.upper_bound(), 0.0);
    }

    #[test]
    fn test_decision_serialization() {
        assert_eq!(
            serde_json::to_string(&SystemDecision::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&StreamKind::CriticalPoints).unwrap(),
            "\"criticalPoints\""
        );
    }
}
