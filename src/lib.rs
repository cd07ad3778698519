// ==========================================
// 水洗尺寸质检系统 - 核心库
// ==========================================
// 系统定位: 尺寸规格表导入 + 公差判定 + 检验汇总
// 最终判定权在检验员, 系统判定仅供参考
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 分数 / 公差 / 汇总
pub mod engine;

// 导入层 - 外部规格表
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// 应用层 - 状态容器
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    FractionValue, InspectorDecision, StreamKind, SystemDecision, ToleranceEnvelope,
    ToleranceResult, WashStage,
};

// 领域实体
pub use domain::{CellValue, MeasurementSession, MeasurementSpecPoint, SpecRow, SpecSheet};

// 引擎
pub use engine::{
    format_decimal_as_fraction, parse_fraction, parse_tolerance, MeasurementAggregator,
    PieceStats, ToleranceEvaluator,
};

// 导入
pub use importer::{ImportError, SpecImporter, SpecImporterImpl, SpecSheetCleaner};

// 应用
pub use app::{QaAction, QaStore, StoreError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "水洗尺寸质检系统";
