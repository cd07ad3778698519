// ==========================================
// 水洗尺寸质检系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单元格级解析失败不报错（decimal=None）, 此处仅包含工作表级 / 文件级错误
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.xlsb/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 工作表结构错误 =====
    /// 工作表结构无法识别（行数不足 / 无尺码表头）, 携带工作表名
    #[error("工作表格式错误 [{sheet}]: {message}")]
    Format { sheet: String, message: String },

    // ===== 修正错误 =====
    #[error("规格数据不存在 [{sheet}]: {message}")]
    NotFound { sheet: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn format(sheet: &str, message: impl Into<String>) -> Self {
        ImportError::Format {
            sheet: sheet.to_string(),
            message: message.into(),
        }
    }

    /// 工作表级错误对应的工作表名
    pub fn sheet_name(&self) -> Option<&str> {
        match self {
            ImportError::Format { sheet, .. } | ImportError::NotFound { sheet, .. } => {
                Some(sheet.as_str())
            }
            _ => None,
        }
    }

    /// 是否为工作表级错误（可跳过该工作表继续导入）
    pub fn is_sheet_level(&self) -> bool {
        matches!(self, ImportError::Format { .. })
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
