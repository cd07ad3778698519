// ==========================================
// 水洗尺寸质检系统 - 规格导入 Trait
// ==========================================
// 职责: 定义规格表导入接口（不包含实现）
// 流程: 文件解析 → 逐工作表清洗（工作表级失败隔离）
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::spec_sheet::SpecSheet;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// RawSheet - 原始工作表
// ==========================================
// 单元格按绝对位置排列（第 0 行第 0 列对应 A1）
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

// ==========================================
// SheetFailure - 工作表级失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetFailure {
    pub sheet_name: String,
    pub message: String,
}

// ==========================================
// WorkbookImport - 单个文件导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookImport {
    pub file_name: String,
    pub sheets: Vec<SpecSheet>,
    pub failures: Vec<SheetFailure>,
    pub skipped_sheets: Vec<String>,
    pub elapsed_ms: u64,
}

impl WorkbookImport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ==========================================
// SpecImporter Trait
// ==========================================
// 用途: 规格导入主接口
// 实现者: SpecImporterImpl
#[async_trait]
pub trait SpecImporter: Send + Sync {
    /// 导入单个工作簿（xlsx/xls/ods/csv）
    ///
    /// # 返回
    /// - Ok(WorkbookImport): 成功解析的工作表 + 工作表级失败明细
    /// - Err: 文件级错误（文件不存在、格式不支持、读取失败）
    ///
    /// # 说明
    /// - 某个工作表结构错误时记录失败并继续下一个工作表
    async fn import_workbook(&self, file_path: &Path) -> ImportResult<WorkbookImport>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，互不影响
    /// - 返回顺序与输入顺序一致
    async fn batch_import(
        &self,
        file_paths: Vec<std::path::PathBuf>,
    ) -> Vec<Result<WorkbookImport, String>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始工作表列表
    fn parse_to_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>>;
}

// ==========================================
// SheetCleaner Trait
// ==========================================
// 用途: 规格表清洗接口
// 实现者: SpecSheetCleaner
pub trait SheetCleaner: Send + Sync {
    /// 原始单元格 → 结构化规格表
    ///
    /// # 错误
    /// - 行数不足 / 无尺码表头 → ImportError::Format（携带工作表名）
    fn clean(&self, rows: &[Vec<CellValue>], sheet_name: &str) -> ImportResult<SpecSheet>;
}
