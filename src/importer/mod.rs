// ==========================================
// 水洗尺寸质检系统 - 导入层
// ==========================================
// 职责: 外部规格表导入, 生成结构化规格数据
// 支持: Excel, ODS, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod spec_importer_impl;
pub mod spec_importer_trait;
pub mod spec_sheet_cleaner;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use spec_importer_impl::SpecImporterImpl;
pub use spec_sheet_cleaner::{SheetLayout, SpecSheetCleaner};

// 重导出 Trait 接口
pub use spec_importer_trait::{
    FileParser, RawSheet, SheetCleaner, SheetFailure, SpecImporter, WorkbookImport,
};
