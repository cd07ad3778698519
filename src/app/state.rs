// ==========================================
// 水洗尺寸质检系统 - 应用状态
// ==========================================
// 职责: 持有规格表与检验会话, 通过 Action 统一修改
// 红线: 所有写操作经 dispatch, 返回状态是否发生变化
// ==========================================

use crate::app::error::{StoreError, StoreResult};
use crate::config::ImportConfigReader;
use crate::domain::measurement::{MeasurementSession, MeasurementSpecPoint, SessionError};
use crate::domain::spec_sheet::SpecSheet;
use crate::domain::types::{InspectorDecision, StreamKind, WashStage};
use crate::engine::aggregator::{
    rollup_by_size, MeasurementAggregator, SessionSummary, SizeRollup,
};
use crate::engine::fraction::DEFAULT_FRACTION_SNAP;
use crate::importer::spec_sheet_cleaner::SpecSheetCleaner;
use tracing::{debug, info};

// ==========================================
// QaAction - 状态修改动作
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum QaAction {
    /// 载入规格表（内容相同则不变）
    LoadSheets(Vec<SpecSheet>),

    /// 预览修正: 单个尺码规格值
    CorrectSpecValue {
        sheet_name: String,
        seq: i64,
        size: String,
        stage: WashStage,
        text: String,
    },

    /// 预览修正: 公差
    CorrectTolerance {
        sheet_name: String,
        seq: i64,
        text: String,
    },

    /// 开始检验会话（id 已存在则不变）
    StartSession(MeasurementSession),

    Record {
        session_id: String,
        stream: StreamKind,
        spec_id: String,
        piece: usize,
        text: String,
    },

    ClearValue {
        session_id: String,
        stream: StreamKind,
        spec_id: String,
        piece: usize,
    },

    SetPieceCount {
        session_id: String,
        stream: StreamKind,
        count: usize,
    },

    TogglePiece {
        session_id: String,
        stream: StreamKind,
        piece: usize,
        enabled: bool,
    },

    SetInspectorDecision {
        session_id: String,
        decision: Option<InspectorDecision>,
    },

    RemoveSession(String),
}

// ==========================================
// QaStore - 应用状态容器
// ==========================================
#[derive(Debug)]
pub struct QaStore {
    sheets: Vec<SpecSheet>,
    sessions: Vec<MeasurementSession>,
    cleaner: SpecSheetCleaner,
    aggregator: MeasurementAggregator,
    // 录入值 → 分数文本 的吸附容差
    fraction_snap: f64,
    revision: u64,
}

impl Default for QaStore {
    fn default() -> Self {
        Self::new(MeasurementAggregator::default())
    }
}

impl QaStore {
    pub fn new(aggregator: MeasurementAggregator) -> Self {
        Self {
            sheets: Vec::new(),
            sessions: Vec::new(),
            cleaner: SpecSheetCleaner::default(),
            aggregator,
            fraction_snap: DEFAULT_FRACTION_SNAP,
            revision: 0,
        }
    }

    /// 按配置构建（判定容差与分数吸附容差取自配置）
    pub fn with_config<C: ImportConfigReader>(config: &C) -> Self {
        let mut store = Self::new(MeasurementAggregator::new(config.evaluator()));
        store.fraction_snap = config.tolerance_settings().fraction_snap;
        store
    }

    pub fn fraction_snap(&self) -> f64 {
        self.fraction_snap
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 执行动作, 返回状态是否发生变化
    pub fn dispatch(&mut self, action: QaAction) -> StoreResult<bool> {
        let changed = match action {
            QaAction::LoadSheets(sheets) => {
                if self.sheets == sheets {
                    debug!("规格表内容未变化, 忽略");
                    false
                } else {
                    info!(sheet_count = sheets.len(), "载入规格表");
                    self.sheets = sheets;
                    true
                }
            }

            QaAction::CorrectSpecValue {
                sheet_name,
                seq,
                size,
                stage,
                text,
            } => {
                let sheet = find_sheet(&mut self.sheets, &sheet_name)?;
                let before = sheet
                    .row(seq)
                    .and_then(|r| r.specs.get(&size))
                    .map(|s| s.stage(stage).clone());
                let after = self
                    .cleaner
                    .correct_spec_value(sheet, seq, &size, stage, &text)?;
                debug!(sheet = %sheet_name, seq, size = %size, raw = %after.raw, "修正规格值");
                before.as_ref() != Some(after)
            }

            QaAction::CorrectTolerance {
                sheet_name,
                seq,
                text,
            } => {
                let sheet = find_sheet(&mut self.sheets, &sheet_name)?;
                let before = sheet.row(seq).map(|r| r.envelope());
                let row = self.cleaner.correct_tolerance(sheet, seq, &text)?;
                debug!(sheet = %sheet_name, seq, tolerance = %text, "修正公差");
                before != Some(row.envelope())
            }

            QaAction::StartSession(session) => {
                if self.session(&session.id).is_some() {
                    false
                } else {
                    info!(
                        session_id = %session.id,
                        inspector = %session.inspector_id,
                        size = %session.size,
                        "开始检验会话"
                    );
                    self.sessions.push(session);
                    true
                }
            }

            QaAction::Record {
                session_id,
                stream,
                spec_id,
                piece,
                text,
            } => {
                let snap = self.fraction_snap;
                let session = self.session_mut(&session_id)?;
                let before = session.stream(stream).value(&spec_id, piece).cloned();
                let after = session
                    .record_with_snap(stream, &spec_id, piece, &text, snap)?
                    .cloned();
                before != after
            }

            QaAction::ClearValue {
                session_id,
                stream,
                spec_id,
                piece,
            } => self
                .session_mut(&session_id)?
                .clear(stream, &spec_id, piece),

            QaAction::SetPieceCount {
                session_id,
                stream,
                count,
            } => {
                let session = self.session_mut(&session_id)?;
                let before = session.stream(stream).clone();
                session.set_piece_count(stream, count);
                &before != session.stream(stream)
            }

            QaAction::TogglePiece {
                session_id,
                stream,
                piece,
                enabled,
            } => {
                let session = self.session_mut(&session_id)?;
                if enabled {
                    session.enable_piece(stream, piece)?
                } else {
                    session.disable_piece(stream, piece)?
                }
            }

            QaAction::SetInspectorDecision {
                session_id,
                decision,
            } => {
                let session = self.session_mut(&session_id)?;
                if session.inspector_decision == decision {
                    false
                } else {
                    session.set_inspector_decision(decision);
                    true
                }
            }

            QaAction::RemoveSession(session_id) => {
                let before = self.sessions.len();
                self.sessions.retain(|s| s.id != session_id);
                before != self.sessions.len()
            }
        };

        if changed {
            self.revision += 1;
        }
        Ok(changed)
    }

    fn session_mut(&mut self, session_id: &str) -> Result<&mut MeasurementSession, SessionError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 状态版本号（每次变化 +1）
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn sheets(&self) -> &[SpecSheet] {
        &self.sheets
    }

    pub fn sheet(&self, sheet_name: &str) -> Option<&SpecSheet> {
        self.sheets.iter().find(|s| s.sheet_name == sheet_name)
    }

    pub fn sessions(&self) -> &[MeasurementSession] {
        &self.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<&MeasurementSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// 全部规格表的检验测量点
    pub fn spec_points(&self, stage: WashStage) -> Vec<MeasurementSpecPoint> {
        self.sheets
            .iter()
            .flat_map(|s| s.to_spec_points(stage))
            .collect()
    }

    /// 各会话汇总
    pub fn summaries(
        &self,
        all_specs: &[MeasurementSpecPoint],
        critical_specs: &[MeasurementSpecPoint],
    ) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|s| self.aggregator.summarize(s, all_specs, critical_specs))
            .collect()
    }

    /// 按 (分组, 尺码) 汇总
    pub fn rollup(
        &self,
        all_specs: &[MeasurementSpecPoint],
        critical_specs: &[MeasurementSpecPoint],
    ) -> Vec<SizeRollup> {
        rollup_by_size(&self.summaries(all_specs, critical_specs))
    }
}

// 按名称取规格表（与 cleaner 字段借用分离）
fn find_sheet<'a>(sheets: &'a mut [SpecSheet], sheet_name: &str) -> StoreResult<&'a mut SpecSheet> {
    sheets
        .iter_mut()
        .find(|s| s.sheet_name == sheet_name)
        .ok_or_else(|| StoreError::SheetNotFound(sheet_name.to_string()))
}
