// ==========================================
// 水洗尺寸质检系统 - 应用层错误类型
// ==========================================
// 职责: 汇总导入层 / 会话层错误, 向调用方提供统一错误
// ==========================================

use crate::domain::measurement::SessionError;
use crate::importer::error::ImportError;
use thiserror::Error;

/// 应用状态错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("规格表不存在: {0}")]
    SheetNotFound(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_is_transparent() {
        let err: StoreError = SessionError::UnknownSession("s-1".to_string()).into();
        assert_eq!(err.to_string(), "检验会话不存在: s-1");
    }
}
