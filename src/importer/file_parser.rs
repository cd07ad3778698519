// ==========================================
// 水洗尺寸质检系统 - 文件解析器实现
// ==========================================
// 职责: 读取工作簿, 输出按绝对位置排列的原始单元格
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb) / ODS / CSV (.csv)
// ==========================================

use crate::domain::cell::CellValue;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::spec_importer_trait::{FileParser, RawSheet};
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

/// 工作簿扩展名
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
// CSV 仅有一个工作表, 以文件名（不含扩展名）命名
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头为模板的一部分
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<CellValue> = Vec::with_capacity(record.len());
            for (col, field) in record.iter().enumerate() {
                // Excel 导出的 UTF-8 CSV 带 BOM
                let field = if rows.is_empty() && col == 0 {
                    field.trim_start_matches(UTF8_BOM)
                } else {
                    field
                };
                row.push(CellValue::from_text(field));
            }
            rows.push(row);
        }

        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Sheet1".to_string());

        debug!(file = %file_path.display(), rows = rows.len(), "CSV 解析完成");
        Ok(vec![RawSheet { name, rows }])
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;
            let rows = absolute_rows(&range);
            debug!(sheet = %name, rows = rows.len(), "工作表读取完成");
            sheets.push(RawSheet { name, rows });
        }

        Ok(sheets)
    }
}

/// 还原绝对位置
///
/// calamine 的 Range 从第一个非空单元格开始, 需要补齐前导空行与空列
fn absolute_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for data_row in range.rows() {
        let mut row = vec![CellValue::Empty; start_col as usize];
        row.extend(data_row.iter().map(cell_from_data));
        rows.push(row);
    }
    rows
}

/// calamine 单元格 → 单元格值
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::from_text(s),
        other => CellValue::from_text(&other.to_string()),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 是否为支持的文件类型
    pub fn supports(path: &Path) -> bool {
        let ext = extension_of(path);
        ext == "csv" || WORKBOOK_EXTENSIONS.contains(&ext.as_str())
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_sheets(&self, file_path: &Path) -> ImportResult<Vec<RawSheet>> {
        let ext = extension_of(file_path);
        match ext.as_str() {
            "csv" => CsvParser.parse_to_sheets(file_path),
            e if WORKBOOK_EXTENSIONS.contains(&e) => ExcelParser.parse_to_sheets(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_keeps_positions() {
        let file = csv_file(&[
            "STYLE123 洗前尺寸表",
            ",,,S,,,",
            ",,,A/W,B/W,,",
            "1,腰围,±1/4,2,2",
        ]);

        let sheets = CsvParser.parse_to_sheets(file.path()).unwrap();
        assert_eq!(sheets.len(), 1);
        let rows = &sheets[0].rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1][3], CellValue::Text("S".to_string()));
        assert_eq!(rows[1][0], CellValue::Empty);
        assert_eq!(rows[3][2], CellValue::Text("±1/4".to_string()));
    }

    #[test]
    fn test_csv_parser_strips_utf8_bom() {
        let file = csv_file(&["\u{feff}STYLE123 洗前尺寸表,\u{feff}x", "\u{feff}1"]);

        let sheets = CsvParser.parse_to_sheets(file.path()).unwrap();
        let rows = &sheets[0].rows;
        assert_eq!(rows[0][0], CellValue::Text("STYLE123 洗前尺寸表".to_string()));
        // 仅文件开头的 BOM 被去除
        assert_eq!(rows[0][1], CellValue::Text("\u{feff}x".to_string()));
        assert_eq!(rows[1][0], CellValue::Text("\u{feff}1".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_sheets(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser.parse_to_sheets(Path::new("spec.pdf"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ref e)) if e == "pdf"));
        assert!(UniversalFileParser::supports(Path::new("a.XLSX")));
        assert!(!UniversalFileParser::supports(Path::new("a.txt")));
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_from_data(&Data::Float(0.25)), CellValue::Number(0.25));
        assert_eq!(cell_from_data(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Text("true".to_string()));
    }

    #[test]
    fn test_absolute_rows_pads_offset() {
        let mut range: Range<Data> = Range::new((1, 2), (1, 3));
        range.set_value((1, 2), Data::String("S".to_string()));
        let rows = absolute_rows(&range);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1][2], CellValue::Text("S".to_string()));
        assert_eq!(rows[1][3], CellValue::Empty);
    }
}
