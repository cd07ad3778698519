// ==========================================
// 水洗尺寸质检系统 - 尺寸规格表
// ==========================================
// 职责: 单个工作表解析后的结构化规格（尺码表头、测量点、洗前/洗后规格）
// 生命周期: 导入时生成, 之后仅整体替换或按单元格修正
// ==========================================

use crate::domain::measurement::MeasurementSpecPoint;
use crate::domain::types::{FractionValue, ToleranceEnvelope, WashStage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 尺码块下的数据列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecColumn {
    pub name: String,     // 固定标签
    pub original: String, // 子表头原文（为空时同 name）
}

/// 尺码表头
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeHeader {
    pub size: String,
    pub columns: Vec<SpecColumn>,
}

/// 单个尺码的洗后 / 洗前规格
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeSpec {
    pub after_washing: FractionValue,
    pub before_washing: FractionValue,
}

impl SizeSpec {
    pub fn stage(&self, stage: WashStage) -> &FractionValue {
        match stage {
            WashStage::AfterWashing => &self.after_washing,
            WashStage::BeforeWashing => &self.before_washing,
        }
    }

    pub fn stage_mut(&mut self, stage: WashStage) -> &mut FractionValue {
        match stage {
            WashStage::AfterWashing => &mut self.after_washing,
            WashStage::BeforeWashing => &mut self.before_washing,
        }
    }
}

/// 测量点（规格表中的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRow {
    pub seq: i64,
    pub measurement_point_chi: String,
    pub tol_minus: FractionValue,
    pub tol_plus: FractionValue,
    pub specs: BTreeMap<String, SizeSpec>,
}

impl SpecRow {
    pub fn envelope(&self) -> ToleranceEnvelope {
        ToleranceEnvelope::new(self.tol_minus.clone(), self.tol_plus.clone())
    }
}

/// 规格表（一个工作表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecSheet {
    pub sheet_name: String,
    pub style_no: String,
    pub headers: Vec<SizeHeader>,
    pub rows: Vec<SpecRow>,
}

impl SpecSheet {
    /// 尺码（按表头顺序）
    pub fn sizes(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|h| h.size.as_str())
    }

    pub fn has_size(&self, size: &str) -> bool {
        self.headers.iter().any(|h| h.size == size)
    }

    pub fn row(&self, seq: i64) -> Option<&SpecRow> {
        self.rows.iter().find(|r| r.seq == seq)
    }

    pub fn row_mut(&mut self, seq: i64) -> Option<&mut SpecRow> {
        self.rows.iter_mut().find(|r| r.seq == seq)
    }

    /// 转换为检验用测量点
    ///
    /// - id: "{工作表名}#{序号}"
    /// - K 值为空（适用于所有 K 值）
    pub fn to_spec_points(&self, stage: WashStage) -> Vec<MeasurementSpecPoint> {
        self.rows
            .iter()
            .map(|row| MeasurementSpecPoint {
                id: format!("{}#{}", self.sheet_name, row.seq),
                measurement_point_name: row.measurement_point_chi.clone(),
                k_value: None,
                specs_by_size: row
                    .specs
                    .iter()
                    .map(|(size, spec)| (size.clone(), spec.stage(stage).clone()))
                    .collect(),
                tol_minus: row.tol_minus.clone(),
                tol_plus: row.tol_plus.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(raw: &str, decimal: f64) -> FractionValue {
        FractionValue {
            raw: raw.to_string(),
            decimal: Some(decimal),
        }
    }

    fn sample_sheet() -> SpecSheet {
        let mut specs = BTreeMap::new();
        specs.insert(
            "M".to_string(),
            SizeSpec {
                after_washing: value("30", 30.0),
                before_washing: value("31 1/2", 31.5),
            },
        );
        SpecSheet {
            sheet_name: "Sheet1".to_string(),
            style_no: "STYLE123".to_string(),
            headers: vec![SizeHeader {
                size: "M".to_string(),
                columns: vec![],
            }],
            rows: vec![SpecRow {
                seq: 3,
                measurement_point_chi: "胸围".to_string(),
                tol_minus: value("-1/2", -0.5),
                tol_plus: value("1/2", 0.5),
                specs,
            }],
        }
    }

    #[test]
    fn test_to_spec_points_selects_stage() {
        let sheet = sample_sheet();
        let points = sheet.to_spec_points(WashStage::BeforeWashing);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "Sheet1#3");
        assert_eq!(points[0].measurement_point_name, "胸围");
        assert_eq!(points[0].specs_by_size["M"].decimal, Some(31.5));
        assert_eq!(points[0].k_value, None);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(sample_sheet()).unwrap();
        assert_eq!(json["styleNo"], "STYLE123");
        assert_eq!(json["rows"][0]["measurementPointChi"], "胸围");
        assert_eq!(json["rows"][0]["specs"]["M"]["afterWashing"]["decimal"], 30.0);
        assert_eq!(json["rows"][0]["tolMinus"]["raw"], "-1/2");
    }
}
