// ==========================================
// 水洗尺寸质检系统 - 检验测量
// ==========================================
// 职责: 检验测量点定义、逐件测量值、检验会话
// 会话: 全部测量点 / 关键测量点 两条独立测量流
// 红线: 系统判定由测量数据实时推导, 不在会话中存储
// ==========================================

use crate::domain::types::{FractionValue, InspectorDecision, StreamKind, ToleranceEnvelope};
use crate::engine::fraction::{format_decimal_with_snap, parse_fraction_str, DEFAULT_FRACTION_SNAP};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use uuid::Uuid;

/// "适用于所有 K 值" 标记
pub const K_VALUE_ALL: &str = "NA";

/// 启用件号集合（有序）
pub type PieceSet = BTreeSet<usize>;

/// 测量值: 测量点 id → 件号 → 测量值
pub type MeasurementGrid = BTreeMap<String, BTreeMap<usize, PieceMeasurement>>;

// ==========================================
// 会话错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("件号超出范围: stream={stream}, piece={piece}, piece_count={piece_count}")]
    PieceOutOfRange {
        stream: StreamKind,
        piece: usize,
        piece_count: usize,
    },

    #[error("检验会话不存在: {0}")]
    UnknownSession(String),
}

// ==========================================
// 检验测量点定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSpecPoint {
    pub id: String,
    pub measurement_point_name: String,
    /// None 或 "NA" 表示适用于所有 K 值
    pub k_value: Option<String>,
    pub specs_by_size: BTreeMap<String, FractionValue>,
    pub tol_minus: FractionValue,
    pub tol_plus: FractionValue,
}

impl MeasurementSpecPoint {
    pub fn envelope(&self) -> ToleranceEnvelope {
        ToleranceEnvelope::new(self.tol_minus.clone(), self.tol_plus.clone())
    }

    /// 是否适用于指定 K 值
    ///
    /// - 测量点 K 值为空或 "NA" → 适用于所有
    /// - 会话未指定 K 值 → 全部适用
    /// - 否则去空白后忽略大小写比较
    pub fn applies_to(&self, k_value: Option<&str>) -> bool {
        let own = match self.k_value.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(k) if k.eq_ignore_ascii_case(K_VALUE_ALL) => return true,
            Some(k) => k,
        };
        match k_value.map(str::trim) {
            None | Some("") => true,
            Some(k) => own.eq_ignore_ascii_case(k),
        }
    }

    pub fn spec_for_size(&self, size: &str) -> Option<&FractionValue> {
        self.specs_by_size.get(size)
    }
}

// ==========================================
// 单件测量值
// ==========================================
// decimal 为偏差值; 恰为 0 表示未测量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceMeasurement {
    pub decimal: f64,
    pub fraction: String,
}

impl PieceMeasurement {
    /// 由分数值构造; 无数值或为 0 时返回 None（视为未测量）
    pub fn from_fraction(value: &FractionValue) -> Option<Self> {
        Self::from_fraction_with_snap(value, DEFAULT_FRACTION_SNAP)
    }

    /// 同上, 分数文本按指定吸附容差生成
    pub fn from_fraction_with_snap(value: &FractionValue, snap: f64) -> Option<Self> {
        match value.decimal {
            Some(d) if d != 0.0 => Some(Self {
                decimal: d,
                fraction: format_decimal_with_snap(Some(d), snap),
            }),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.decimal == 0.0
    }
}

// ==========================================
// 测量流
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementStream {
    pub piece_count: usize,
    pub enabled_pieces: PieceSet,
    #[serde(default)]
    pub values: MeasurementGrid,
}

impl Default for MeasurementStream {
    /// 默认 1 件, 第 0 件启用
    fn default() -> Self {
        Self {
            piece_count: 1,
            enabled_pieces: PieceSet::from([0]),
            values: MeasurementGrid::new(),
        }
    }
}

impl MeasurementStream {
    pub fn value(&self, spec_id: &str, piece: usize) -> Option<&PieceMeasurement> {
        self.values.get(spec_id).and_then(|pieces| pieces.get(&piece))
    }

    /// 偏差值（未测量为 None）
    pub fn deviation(&self, spec_id: &str, piece: usize) -> Option<f64> {
        self.value(spec_id, piece).map(|m| m.decimal)
    }

    pub fn has_enabled_pieces(&self) -> bool {
        !self.enabled_pieces.is_empty()
    }

    pub fn is_enabled(&self, piece: usize) -> bool {
        self.enabled_pieces.contains(&piece)
    }

    fn check_range(&self, kind: StreamKind, piece: usize) -> Result<(), SessionError> {
        if piece >= self.piece_count {
            return Err(SessionError::PieceOutOfRange {
                stream: kind,
                piece,
                piece_count: self.piece_count,
            });
        }
        Ok(())
    }
}

// ==========================================
// 检验会话
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSession {
    pub id: String,
    pub inspector_id: String,
    pub size: String,
    pub k_value: Option<String>,
    pub group: Option<String>,
    pub all_points: MeasurementStream,
    pub critical_points: MeasurementStream,
    pub inspector_decision: Option<InspectorDecision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeasurementSession {
    pub fn new(
        inspector_id: impl Into<String>,
        size: impl Into<String>,
        k_value: Option<String>,
        group: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            inspector_id: inspector_id.into(),
            size: size.into(),
            k_value,
            group,
            all_points: MeasurementStream::default(),
            critical_points: MeasurementStream::default(),
            inspector_decision: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn stream(&self, kind: StreamKind) -> &MeasurementStream {
        match kind {
            StreamKind::AllPoints => &self.all_points,
            StreamKind::CriticalPoints => &self.critical_points,
        }
    }

    fn stream_mut(&mut self, kind: StreamKind) -> &mut MeasurementStream {
        match kind {
            StreamKind::AllPoints => &mut self.all_points,
            StreamKind::CriticalPoints => &mut self.critical_points,
        }
    }

    /// 录入测量值（分数文本）
    ///
    /// 文本无法解析或为 0 时清除该值, 返回 Ok(None)
    pub fn record(
        &mut self,
        kind: StreamKind,
        spec_id: &str,
        piece: usize,
        text: &str,
    ) -> Result<Option<&PieceMeasurement>, SessionError> {
        self.record_with_snap(kind, spec_id, piece, text, DEFAULT_FRACTION_SNAP)
    }

    /// 录入测量值, 分数文本按指定吸附容差生成
    pub fn record_with_snap(
        &mut self,
        kind: StreamKind,
        spec_id: &str,
        piece: usize,
        text: &str,
        snap: f64,
    ) -> Result<Option<&PieceMeasurement>, SessionError> {
        self.stream(kind).check_range(kind, piece)?;

        let measurement =
            PieceMeasurement::from_fraction_with_snap(&parse_fraction_str(text), snap);
        self.touch();

        let stream = self.stream_mut(kind);
        match measurement {
            Some(m) => {
                let pieces = stream.values.entry(spec_id.to_string()).or_default();
                pieces.insert(piece, m);
                Ok(pieces.get(&piece))
            }
            None => {
                remove_value(stream, spec_id, piece);
                Ok(None)
            }
        }
    }

    /// 清除测量值, 返回是否存在
    pub fn clear(&mut self, kind: StreamKind, spec_id: &str, piece: usize) -> bool {
        let removed = remove_value(self.stream_mut(kind), spec_id, piece);
        if removed {
            self.touch();
        }
        removed
    }

    /// 设置件数
    ///
    /// - 缩减: 丢弃超出范围的启用件号与测量值
    /// - 增加: 新增件号默认启用
    pub fn set_piece_count(&mut self, kind: StreamKind, count: usize) {
        let stream = self.stream_mut(kind);
        let previous = stream.piece_count;

        if count < previous {
            stream.enabled_pieces.retain(|p| *p < count);
            for pieces in stream.values.values_mut() {
                pieces.retain(|p, _| *p < count);
            }
            stream.values.retain(|_, pieces| !pieces.is_empty());
        } else {
            stream.enabled_pieces.extend(previous..count);
        }
        stream.piece_count = count;
        self.touch();
    }

    /// 启用件号, 返回是否发生变化
    pub fn enable_piece(&mut self, kind: StreamKind, piece: usize) -> Result<bool, SessionError> {
        self.stream(kind).check_range(kind, piece)?;
        let changed = self.stream_mut(kind).enabled_pieces.insert(piece);
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    /// 停用件号, 返回是否发生变化（测量值保留）
    pub fn disable_piece(&mut self, kind: StreamKind, piece: usize) -> Result<bool, SessionError> {
        self.stream(kind).check_range(kind, piece)?;
        let changed = self.stream_mut(kind).enabled_pieces.remove(&piece);
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    pub fn set_inspector_decision(&mut self, decision: Option<InspectorDecision>) {
        self.inspector_decision = decision;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn remove_value(stream: &mut MeasurementStream, spec_id: &str, piece: usize) -> bool {
    let Some(pieces) = stream.values.get_mut(spec_id) else {
        return false;
    };
    let removed = pieces.remove(&piece).is_some();
    if pieces.is_empty() {
        stream.values.remove(spec_id);
    }
    removed
}
