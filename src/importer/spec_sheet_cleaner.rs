// ==========================================
// 水洗尺寸质检系统 - 规格表清洗器实现
// ==========================================
// 职责: 原始单元格二维表 → 结构化规格表; 预览修正时重新解析单元格
// 模板（固定布局）:
//   第 0 行 A 列: 款号标题（首个空白分隔词为款号）
//   第 1 行:      尺码表头, 自 D 列起每 4 列一个尺码块（2 数据列 + 2 间隔列）
//   第 2 行:      子表头（仅作显示标签）
//   第 3 行起:    A 序号 / B 中文测量点 / C 公差 / 各尺码块 洗后、洗前
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::spec_sheet::{SizeHeader, SizeSpec, SpecColumn, SpecRow, SpecSheet};
use crate::domain::types::{FractionValue, WashStage};
use crate::engine::fraction::{parse_fraction, parse_fraction_str};
use crate::engine::tolerance_parser::{parse_tolerance, parse_tolerance_str};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::spec_importer_trait::SheetCleaner;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// SheetLayout - 模板布局常量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub min_rows: usize,          // 最少行数（3 行表头 + 1 行数据）
    pub size_header_row: usize,   // 尺码表头行
    pub sub_header_row: usize,    // 子表头行
    pub first_data_row: usize,    // 数据起始行
    pub seq_col: usize,           // 序号列 A
    pub name_col: usize,          // 测量点列 B
    pub tolerance_col: usize,     // 公差列 C
    pub first_size_col: usize,    // 尺码块起始列 D
    pub size_block_width: usize,  // 尺码块宽度
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            min_rows: 4,
            size_header_row: 1,
            sub_header_row: 2,
            first_data_row: 3,
            seq_col: 0,
            name_col: 1,
            tolerance_col: 2,
            first_size_col: 3,
            size_block_width: 4,
        }
    }
}

/// 尺码块（表头扫描结果）
#[derive(Debug, Clone, PartialEq)]
struct SizeBlock {
    size: String,
    start_col: usize,
}

const SIZE_BLOCK_STAGES: [WashStage; 2] = [WashStage::AfterWashing, WashStage::BeforeWashing];

// ==========================================
// SpecSheetCleaner - 规格表清洗器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SpecSheetCleaner {
    layout: SheetLayout,
}

impl SheetCleaner for SpecSheetCleaner {
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    fn clean(&self, rows: &[Vec<CellValue>], sheet_name: &str) -> ImportResult<SpecSheet> {
        let layout = &self.layout;
        if rows.len() < layout.min_rows {
            return Err(ImportError::format(
                sheet_name,
                format!(
                    "行数不足: 需要至少 {} 行, 实际 {} 行",
                    layout.min_rows,
                    rows.len()
                ),
            ));
        }

        let style_no = cell(&rows[0], 0)
            .as_text()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();

        let blocks = self.scan_size_blocks(&rows[layout.size_header_row]);
        if blocks.is_empty() {
            return Err(ImportError::format(sheet_name, "No size headers found"));
        }

        let sub_header = &rows[layout.sub_header_row];
        let headers = blocks
            .iter()
            .map(|block| SizeHeader {
                size: block.size.clone(),
                columns: SIZE_BLOCK_STAGES
                    .iter()
                    .enumerate()
                    .map(|(offset, stage)| {
                        let label = cell(sub_header, block.start_col + offset).as_text();
                        let label = label.trim();
                        SpecColumn {
                            name: stage.label().to_string(),
                            original: if label.is_empty() {
                                stage.label().to_string()
                            } else {
                                label.to_string()
                            },
                        }
                    })
                    .collect(),
            })
            .collect();

        let mut spec_rows = Vec::new();
        for (row_idx, row) in rows.iter().enumerate().skip(layout.first_data_row) {
            match self.clean_row(row, &blocks) {
                Some(spec_row) => spec_rows.push(spec_row),
                None => debug!(sheet = sheet_name, row = row_idx, "跳过无序号行"),
            }
        }

        debug!(
            sheet = sheet_name,
            style_no = %style_no,
            sizes = blocks.len(),
            points = spec_rows.len(),
            "规格表清洗完成"
        );

        Ok(SpecSheet {
            sheet_name: sheet_name.to_string(),
            style_no,
            headers,
            rows: spec_rows,
        })
    }
}

impl SpecSheetCleaner {
    pub fn new(layout: SheetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// 扫描尺码表头
    ///
    /// 自起始列逐列扫描, 非空单元格开启一个尺码块并跳过整个块宽
    fn scan_size_blocks(&self, header_row: &[CellValue]) -> Vec<SizeBlock> {
        let mut blocks = Vec::new();
        let mut col = self.layout.first_size_col;
        while col < header_row.len() {
            let value = &header_row[col];
            if value.is_blank() {
                col += 1;
                continue;
            }
            blocks.push(SizeBlock {
                size: value.as_text().trim().to_string(),
                start_col: col,
            });
            col += self.layout.size_block_width;
        }
        blocks
    }

    /// 清洗单个数据行; 序号缺失或非整数时返回 None
    fn clean_row(&self, row: &[CellValue], blocks: &[SizeBlock]) -> Option<SpecRow> {
        let layout = &self.layout;
        let seq = cell(row, layout.seq_col).as_integer()?;
        let tolerance = parse_tolerance(cell(row, layout.tolerance_col));

        let specs: BTreeMap<String, SizeSpec> = blocks
            .iter()
            .map(|block| {
                (
                    block.size.clone(),
                    SizeSpec {
                        after_washing: parse_fraction(cell(row, block.start_col)),
                        before_washing: parse_fraction(cell(row, block.start_col + 1)),
                    },
                )
            })
            .collect();

        Some(SpecRow {
            seq,
            measurement_point_chi: cell(row, layout.name_col).as_text().trim().to_string(),
            tol_minus: tolerance.minus,
            tol_plus: tolerance.plus,
            specs,
        })
    }

    // ==========================================
    // 预览修正
    // ==========================================

    /// 修正单个尺码规格值（重新解析文本）
    pub fn correct_spec_value<'a>(
        &self,
        sheet: &'a mut SpecSheet,
        seq: i64,
        size: &str,
        stage: WashStage,
        text: &str,
    ) -> ImportResult<&'a FractionValue> {
        let sheet_name = sheet.sheet_name.clone();
        let row = sheet.row_mut(seq).ok_or_else(|| ImportError::NotFound {
            sheet: sheet_name.clone(),
            message: format!("序号 {} 不存在", seq),
        })?;
        let spec = row.specs.get_mut(size).ok_or_else(|| ImportError::NotFound {
            sheet: sheet_name,
            message: format!("尺码 {} 不存在", size),
        })?;

        let slot = spec.stage_mut(stage);
        *slot = parse_fraction_str(text);
        Ok(slot)
    }

    /// 修正公差（重新解析公差文本）
    pub fn correct_tolerance<'a>(
        &self,
        sheet: &'a mut SpecSheet,
        seq: i64,
        text: &str,
    ) -> ImportResult<&'a SpecRow> {
        let sheet_name = sheet.sheet_name.clone();
        let row = sheet.row_mut(seq).ok_or_else(|| ImportError::NotFound {
            sheet: sheet_name,
            message: format!("序号 {} 不存在", seq),
        })?;

        let envelope = parse_tolerance_str(text);
        row.tol_minus = envelope.minus;
        row.tol_plus = envelope.plus;
        Ok(row)
    }
}

/// 取单元格, 越界视为空
fn cell(row: &[CellValue], col: usize) -> &CellValue {
    const EMPTY: &CellValue = &CellValue::Empty;
    row.get(col).unwrap_or(EMPTY)
}
