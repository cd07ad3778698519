// ==========================================
// 水洗尺寸质检系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、测量会话
// 红线: 不含文件访问逻辑
// ==========================================

pub mod cell;
pub mod measurement;
pub mod spec_sheet;
pub mod types;

// 重导出核心类型
pub use cell::CellValue;
pub use measurement::{
    MeasurementGrid, MeasurementSession, MeasurementSpecPoint, MeasurementStream, PieceMeasurement,
    PieceSet, SessionError, K_VALUE_ALL,
};
pub use spec_sheet::{SizeHeader, SizeSpec, SpecColumn, SpecRow, SpecSheet};
pub use types::{
    FractionValue, InspectorDecision, StreamKind, StreamVerdict, SystemDecision,
    ToleranceEnvelope, ToleranceResult, WashStage,
};
