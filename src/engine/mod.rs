// ==========================================
// 水洗尺寸质检系统 - 引擎层
// ==========================================
// 职责: 分数换算、公差解析、公差判定、结果汇总
// 红线: 纯函数, 不做 IO, 不返回错误（解析失败以 decimal=None 表达）
// ==========================================

pub mod aggregator;
pub mod fraction;
pub mod tolerance;
pub mod tolerance_parser;

// 重导出核心引擎
pub use aggregator::{
    combine_verdicts, format_rate, rollup_by_size, MeasurementAggregator, PieceStats,
    SessionSummary, SizeRollup,
};
pub use fraction::{
    format_decimal_as_fraction, format_decimal_with_snap, normalize_fraction_text,
    parse_fraction, parse_fraction_str, DEFAULT_FRACTION_SNAP,
};
pub use tolerance::{check_tolerance, ToleranceEvaluator, DEFAULT_TOLERANCE_EPSILON};
pub use tolerance_parser::{parse_tolerance, parse_tolerance_str};
