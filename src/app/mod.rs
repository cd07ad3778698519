// ==========================================
// 水洗尺寸质检系统 - 应用层
// ==========================================
// 职责: 状态容器, 连接界面与核心逻辑
// ==========================================

pub mod error;
pub mod state;

// 重导出
pub use error::{StoreError, StoreResult};
pub use state::{QaAction, QaStore};
