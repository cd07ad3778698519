// ==========================================
// 水洗尺寸质检系统 - 测量汇总引擎
// ==========================================
// 职责: 点级 / 件级合格统计、合格率、系统判定、按尺码汇总
// 系统判定: 两次机会复检规则
//   - 全部测量点: 第 0 件不合格时, 第 1 件（若启用）全部合格可挽回
//   - 关键测量点: 逐件检查, 以最后一件的结果为准
// 红线: 不得简化为"任一不合格即不合格"
// ==========================================

use crate::domain::measurement::{
    MeasurementGrid, MeasurementSession, MeasurementSpecPoint, MeasurementStream, PieceSet,
};
use crate::domain::types::{
    InspectorDecision, StreamVerdict, SystemDecision, ToleranceEnvelope, ToleranceResult,
};
use crate::engine::tolerance::ToleranceEvaluator;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

// ==========================================
// PieceStats - 点级 / 件级统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceStats {
    pub total_points: usize,
    pub pass_points: usize,
    pub fail_points: usize,
    pub total_pcs: usize,
    pub pass_pcs: usize,
    pub fail_pcs: usize,
    pub point_pass_rate: String,
    pub pcs_pass_rate: String,
}

impl Default for PieceStats {
    fn default() -> Self {
        Self::from_counts(0, 0, 0, 0)
    }
}

impl PieceStats {
    /// 由计数构造, 合格率自动计算
    pub fn from_counts(
        total_points: usize,
        fail_points: usize,
        total_pcs: usize,
        fail_pcs: usize,
    ) -> Self {
        let pass_points = total_points.saturating_sub(fail_points);
        let pass_pcs = total_pcs.saturating_sub(fail_pcs);
        Self {
            total_points,
            pass_points,
            fail_points,
            total_pcs,
            pass_pcs,
            fail_pcs,
            point_pass_rate: format_rate(pass_points, total_points),
            pcs_pass_rate: format_rate(pass_pcs, total_pcs),
        }
    }

    /// 累加另一组统计（合格率重新计算）
    pub fn merge(&self, other: &PieceStats) -> PieceStats {
        PieceStats::from_counts(
            self.total_points + other.total_points,
            self.fail_points + other.fail_points,
            self.total_pcs + other.total_pcs,
            self.fail_pcs + other.fail_pcs,
        )
    }
}

/// 合格率（百分比, 2 位小数; 分母为 0 时 "0.00"）
pub fn format_rate(pass: usize, total: usize) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", pass as f64 / total as f64 * 100.0)
}

// ==========================================
// SessionSummary - 单个检验会话汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub inspector_id: String,
    pub size: String,
    pub k_value: Option<String>,
    pub group: Option<String>,
    pub all_points: PieceStats,
    pub critical_points: PieceStats,
    pub system_decision: SystemDecision,
    pub inspector_decision: Option<InspectorDecision>,
}

// ==========================================
// SizeRollup - 按 (分组, 尺码) 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRollup {
    pub group: Option<String>,
    pub size: String,
    pub sessions: usize,
    pub all_points: PieceStats,
    pub critical_points: PieceStats,
    pub system_pass: usize,
    pub system_fail: usize,
    pub system_pending: usize,
    pub inspector_pass: usize,
    pub inspector_fail: usize,
}

// ==========================================
// MeasurementAggregator - 测量汇总引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasurementAggregator {
    evaluator: ToleranceEvaluator,
}

impl MeasurementAggregator {
    pub fn new(evaluator: ToleranceEvaluator) -> Self {
        Self { evaluator }
    }

    /// 单点判定
    pub fn point_result(
        &self,
        values: &MeasurementGrid,
        spec_id: &str,
        piece: usize,
        envelope: &ToleranceEnvelope,
    ) -> ToleranceResult {
        let deviation = values
            .get(spec_id)
            .and_then(|pieces| pieces.get(&piece))
            .map(|m| m.decimal);
        self.evaluator.check(envelope, deviation)
    }

    /// 该件是否存在不合格测量点
    fn piece_has_fail<S, F>(
        &self,
        values: &MeasurementGrid,
        piece: usize,
        specs: &[S],
        lookup: &F,
    ) -> bool
    where
        S: Borrow<MeasurementSpecPoint>,
        F: Fn(&MeasurementSpecPoint) -> ToleranceEnvelope,
    {
        specs.iter().any(|spec| {
            let spec: &MeasurementSpecPoint = spec.borrow();
            self.point_result(values, &spec.id, piece, &lookup(spec))
                .is_fail()
        })
    }

    /// 件级统计
    ///
    /// # 规则
    /// - total_points = 测量点数 × 启用件数（未测量视为合格）
    /// - 任一测量点不合格 → 该件不合格
    pub fn aggregate_piece_stats<S, F>(
        &self,
        values: &MeasurementGrid,
        enabled: &PieceSet,
        specs: &[S],
        lookup: F,
    ) -> PieceStats
    where
        S: Borrow<MeasurementSpecPoint>,
        F: Fn(&MeasurementSpecPoint) -> ToleranceEnvelope,
    {
        let mut fail_points = 0;
        let mut fail_pcs = 0;

        for piece in enabled {
            let failed_here = specs
                .iter()
                .filter(|spec| {
                    let spec: &MeasurementSpecPoint = (*spec).borrow();
                    self.point_result(values, &spec.id, *piece, &lookup(spec))
                        .is_fail()
                })
                .count();

            fail_points += failed_here;
            if failed_here > 0 {
                fail_pcs += 1;
            }
        }

        PieceStats::from_counts(specs.len() * enabled.len(), fail_points, enabled.len(), fail_pcs)
    }

    /// 测量流统计（公差取测量点自身定义）
    pub fn stream_stats<S>(&self, stream: &MeasurementStream, specs: &[S]) -> PieceStats
    where
        S: Borrow<MeasurementSpecPoint>,
    {
        self.aggregate_piece_stats(
            &stream.values,
            &stream.enabled_pieces,
            specs,
            MeasurementSpecPoint::envelope,
        )
    }

    /// 全部测量点判定
    ///
    /// - 无启用件 → None
    /// - 第 0 件合格 → Pass（不检查第 1 件）
    /// - 第 0 件不合格: 第 1 件启用且全部合格 → Pass, 否则 Fail
    pub fn all_points_verdict<S, F>(
        &self,
        stream: &MeasurementStream,
        specs: &[S],
        lookup: F,
    ) -> Option<StreamVerdict>
    where
        S: Borrow<MeasurementSpecPoint>,
        F: Fn(&MeasurementSpecPoint) -> ToleranceEnvelope,
    {
        if !stream.has_enabled_pieces() {
            return None;
        }

        if !self.piece_has_fail(&stream.values, 0, specs, &lookup) {
            return Some(StreamVerdict::Pass);
        }

        if stream.is_enabled(1) && !self.piece_has_fail(&stream.values, 1, specs, &lookup) {
            Some(StreamVerdict::Pass)
        } else {
            Some(StreamVerdict::Fail)
        }
    }

    /// 关键测量点判定
    ///
    /// - 无启用件 → None
    /// - 按件号升序逐件检查, 以最后一件为准: 最后一件合格 → Pass（即使之前有不合格）
    pub fn critical_points_verdict<S, F>(
        &self,
        stream: &MeasurementStream,
        specs: &[S],
        lookup: F,
    ) -> Option<StreamVerdict>
    where
        S: Borrow<MeasurementSpecPoint>,
        F: Fn(&MeasurementSpecPoint) -> ToleranceEnvelope,
    {
        if !stream.has_enabled_pieces() {
            return None;
        }

        let mut any_failed = false;
        let mut last_failed = false;
        for piece in &stream.enabled_pieces {
            last_failed = self.piece_has_fail(&stream.values, *piece, specs, &lookup);
            any_failed |= last_failed;
        }

        if any_failed && last_failed {
            Some(StreamVerdict::Fail)
        } else {
            Some(StreamVerdict::Pass)
        }
    }

    /// 系统判定
    pub fn calculate_system_decision<S, T>(
        &self,
        all_points: &MeasurementStream,
        all_specs: &[S],
        critical_points: &MeasurementStream,
        critical_specs: &[T],
    ) -> SystemDecision
    where
        S: Borrow<MeasurementSpecPoint>,
        T: Borrow<MeasurementSpecPoint>,
    {
        combine_verdicts(
            self.all_points_verdict(all_points, all_specs, MeasurementSpecPoint::envelope),
            self.critical_points_verdict(
                critical_points,
                critical_specs,
                MeasurementSpecPoint::envelope,
            ),
        )
    }

    /// 会话汇总（仅统计适用于会话 K 值的测量点）
    pub fn summarize(
        &self,
        session: &MeasurementSession,
        all_specs: &[MeasurementSpecPoint],
        critical_specs: &[MeasurementSpecPoint],
    ) -> SessionSummary {
        let k_value = session.k_value.as_deref();
        let all: Vec<&MeasurementSpecPoint> =
            all_specs.iter().filter(|s| s.applies_to(k_value)).collect();
        let critical: Vec<&MeasurementSpecPoint> = critical_specs
            .iter()
            .filter(|s| s.applies_to(k_value))
            .collect();

        SessionSummary {
            session_id: session.id.clone(),
            inspector_id: session.inspector_id.clone(),
            size: session.size.clone(),
            k_value: session.k_value.clone(),
            group: session.group.clone(),
            all_points: self.stream_stats(&session.all_points, &all),
            critical_points: self.stream_stats(&session.critical_points, &critical),
            system_decision: self.calculate_system_decision(
                &session.all_points,
                &all,
                &session.critical_points,
                &critical,
            ),
            inspector_decision: session.inspector_decision,
        }
    }
}

// 会话便捷入口（默认容差）
impl MeasurementSession {
    /// 系统判定（仅考虑适用于会话 K 值的测量点）
    pub fn system_decision(
        &self,
        all_specs: &[MeasurementSpecPoint],
        critical_specs: &[MeasurementSpecPoint],
    ) -> SystemDecision {
        self.summarize(all_specs, critical_specs).system_decision
    }

    pub fn summarize(
        &self,
        all_specs: &[MeasurementSpecPoint],
        critical_specs: &[MeasurementSpecPoint],
    ) -> SessionSummary {
        MeasurementAggregator::default().summarize(self, all_specs, critical_specs)
    }
}

/// 合并两条测量流的判定
///
/// 任一 Fail → Fail; 任一 Pass → Pass; 均无 → Pending
pub fn combine_verdicts(
    all_points: Option<StreamVerdict>,
    critical_points: Option<StreamVerdict>,
) -> SystemDecision {
    let verdicts = [all_points, critical_points];
    if verdicts.contains(&Some(StreamVerdict::Fail)) {
        SystemDecision::Fail
    } else if verdicts.contains(&Some(StreamVerdict::Pass)) {
        SystemDecision::Pass
    } else {
        SystemDecision::Pending
    }
}

/// 按 (分组, 尺码) 汇总会话
///
/// 输出按分组、尺码排序
pub fn rollup_by_size(summaries: &[SessionSummary]) -> Vec<SizeRollup> {
    let mut groups: BTreeMap<(Option<String>, String), SizeRollup> = BTreeMap::new();

    for summary in summaries {
        let key = (summary.group.clone(), summary.size.clone());
        let entry = groups.entry(key).or_insert_with(|| SizeRollup {
            group: summary.group.clone(),
            size: summary.size.clone(),
            sessions: 0,
            all_points: PieceStats::default(),
            critical_points: PieceStats::default(),
            system_pass: 0,
            system_fail: 0,
            system_pending: 0,
            inspector_pass: 0,
            inspector_fail: 0,
        });

        entry.sessions += 1;
        entry.all_points = entry.all_points.merge(&summary.all_points);
        entry.critical_points = entry.critical_points.merge(&summary.critical_points);
        match summary.system_decision {
            SystemDecision::Pass => entry.system_pass += 1,
            SystemDecision::Fail => entry.system_fail += 1,
            SystemDecision::Pending => entry.system_pending += 1,
        }
        match summary.inspector_decision {
            Some(InspectorDecision::Pass) => entry.inspector_pass += 1,
            Some(InspectorDecision::Fail) => entry.inspector_fail += 1,
            None => {}
        }
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StreamKind;
    use crate::engine::tolerance_parser::parse_tolerance_str;

    fn spec(id: &str, tolerance: &str) -> MeasurementSpecPoint {
        let env = parse_tolerance_str(tolerance);
        MeasurementSpecPoint {
            id: id.to_string(),
            measurement_point_name: id.to_string(),
            k_value: None,
            specs_by_size: BTreeMap::new(),
            tol_minus: env.minus,
            tol_plus: env.plus,
        }
    }

    fn specs(count: usize) -> Vec<MeasurementSpecPoint> {
        (0..count).map(|i| spec(&format!("P{}", i), "±1/4")).collect()
    }

    fn session_with_pieces(pieces: usize) -> MeasurementSession {
        let mut session = MeasurementSession::new("E001", "M", None, None);
        session.set_piece_count(StreamKind::AllPoints, pieces);
        session.set_piece_count(StreamKind::CriticalPoints, pieces);
        session
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0, 0), "0.00");
        assert_eq!(format_rate(1, 3), "33.33");
        assert_eq!(format_rate(2, 2), "100.00");
    }

    #[test]
    fn test_untouched_points_count_as_pass() {
        let aggregator = MeasurementAggregator::default();
        let session = session_with_pieces(2);
        let stats = aggregator.stream_stats(&session.all_points, &specs(5));
        assert_eq!(stats.total_points, 10);
        assert_eq!(stats.pass_points, 10);
        assert_eq!(stats.total_pcs, 2);
        assert_eq!(stats.pass_pcs, 2);
        assert_eq!(stats.point_pass_rate, "100.00");
    }

    #[test]
    fn test_single_failing_point_fails_piece() {
        let aggregator = MeasurementAggregator::default();
        let specs = specs(10);
        let mut session = session_with_pieces(1);
        for spec in specs.iter().take(9) {
            session
                .record(StreamKind::AllPoints, &spec.id, 0, "1/8")
                .unwrap();
        }
        session.record(StreamKind::AllPoints, "P9", 0, "1/2").unwrap();

        let stats = aggregator.stream_stats(&session.all_points, &specs);
        assert_eq!(stats.pass_points, 9);
        assert_eq!(stats.fail_points, 1);
        assert_eq!(stats.pass_pcs, 0);
        assert_eq!(stats.fail_pcs, 1);
        assert_eq!(stats.point_pass_rate, "90.00");
        assert_eq!(stats.pcs_pass_rate, "0.00");
    }

    #[test]
    fn test_disabled_pieces_are_not_charged() {
        let aggregator = MeasurementAggregator::default();
        let mut session = session_with_pieces(3);
        session.record(StreamKind::AllPoints, "P0", 2, "1").unwrap();
        session.disable_piece(StreamKind::AllPoints, 2).unwrap();

        let stats = aggregator.stream_stats(&session.all_points, &specs(2));
        assert_eq!(stats.total_points, 4);
        assert_eq!(stats.fail_pcs, 0);
    }

    #[test]
    fn test_custom_envelope_lookup() {
        let aggregator = MeasurementAggregator::default();
        let mut session = session_with_pieces(1);
        session.record(StreamKind::AllPoints, "P0", 0, "1/2").unwrap();
        let points = specs(1);

        let wide = parse_tolerance_str("±1");
        let stats = aggregator.aggregate_piece_stats(
            &session.all_points.values,
            &session.all_points.enabled_pieces,
            &points,
            |_| wide.clone(),
        );
        assert_eq!(stats.fail_points, 0);
    }

    #[test]
    fn test_all_points_two_strike_recovery() {
        let aggregator = MeasurementAggregator::default();
        let specs = specs(2);
        let mut session = session_with_pieces(2);
        session.record(StreamKind::AllPoints, "P0", 0, "1/2").unwrap();

        // 第 1 件启用且全部合格 → 挽回
        let verdict =
            aggregator.all_points_verdict(&session.all_points, &specs, MeasurementSpecPoint::envelope);
        assert_eq!(verdict, Some(StreamVerdict::Pass));

        // 第 1 件未启用 → 不合格
        session.disable_piece(StreamKind::AllPoints, 1).unwrap();
        let verdict =
            aggregator.all_points_verdict(&session.all_points, &specs, MeasurementSpecPoint::envelope);
        assert_eq!(verdict, Some(StreamVerdict::Fail));

        // 第 1 件启用但也不合格 → 不合格
        session.enable_piece(StreamKind::AllPoints, 1).unwrap();
        session.record(StreamKind::AllPoints, "P1", 1, "-1/2").unwrap();
        let verdict =
            aggregator.all_points_verdict(&session.all_points, &specs, MeasurementSpecPoint::envelope);
        assert_eq!(verdict, Some(StreamVerdict::Fail));
    }

    #[test]
    fn test_all_points_ignores_piece_one_when_piece_zero_passes() {
        let aggregator = MeasurementAggregator::default();
        let specs = specs(1);
        let mut session = session_with_pieces(3);
        session.record(StreamKind::AllPoints, "P0", 1, "1").unwrap();
        session.record(StreamKind::AllPoints, "P0", 2, "1").unwrap();

        let verdict =
            aggregator.all_points_verdict(&session.all_points, &specs, MeasurementSpecPoint::envelope);
        assert_eq!(verdict, Some(StreamVerdict::Pass));
    }

    #[test]
    fn test_critical_points_last_piece_decides() {
        let aggregator = MeasurementAggregator::default();
        let specs = specs(1);
        let mut session = session_with_pieces(3);
        session.record(StreamKind::CriticalPoints, "P0", 0, "1").unwrap();
        session.record(StreamKind::CriticalPoints, "P0", 1, "1").unwrap();

        let verdict = aggregator.critical_points_verdict(
            &session.critical_points,
            &specs,
            MeasurementSpecPoint::envelope,
        );
        assert_eq!(verdict, Some(StreamVerdict::Pass));

        session.record(StreamKind::CriticalPoints, "P0", 2, "-1").unwrap();
        let verdict = aggregator.critical_points_verdict(
            &session.critical_points,
            &specs,
            MeasurementSpecPoint::envelope,
        );
        assert_eq!(verdict, Some(StreamVerdict::Fail));

        // 停用最后一件后, 以第 1 件为准
        session.disable_piece(StreamKind::CriticalPoints, 2).unwrap();
        let verdict = aggregator.critical_points_verdict(
            &session.critical_points,
            &specs,
            MeasurementSpecPoint::envelope,
        );
        assert_eq!(verdict, Some(StreamVerdict::Fail));
    }

    #[test]
    fn test_combine_verdicts() {
        use StreamVerdict::{Fail, Pass};
        assert_eq!(combine_verdicts(None, None), SystemDecision::Pending);
        assert_eq!(combine_verdicts(Some(Pass), None), SystemDecision::Pass);
        assert_eq!(combine_verdicts(None, Some(Fail)), SystemDecision::Fail);
        assert_eq!(combine_verdicts(Some(Pass), Some(Fail)), SystemDecision::Fail);
        assert_eq!(combine_verdicts(Some(Pass), Some(Pass)), SystemDecision::Pass);
    }

    #[test]
    fn test_system_decision_pending_without_pieces() {
        let aggregator = MeasurementAggregator::default();
        let specs = specs(1);
        let session = session_with_pieces(0);
        let decision = aggregator.calculate_system_decision(
            &session.all_points,
            &specs,
            &session.critical_points,
            &specs,
        );
        assert_eq!(decision, SystemDecision::Pending);
    }

    #[test]
    fn test_summarize_filters_k_value() {
        let aggregator = MeasurementAggregator::default();
        let mut k2_only = spec("K2P", "±1/4");
        k2_only.k_value = Some("K2".to_string());
        let all_specs = vec![spec("P0", "±1/4"), k2_only];

        let mut session = MeasurementSession::new("E001", "M", Some("K1".to_string()), None);
        session.record(StreamKind::AllPoints, "K2P", 0, "1").unwrap();

        let summary = aggregator.summarize(&session, &all_specs, &[]);
        assert_eq!(summary.all_points.total_points, 1);
        assert_eq!(summary.all_points.fail_points, 0);
        assert_eq!(summary.critical_points.total_points, 0);
        assert_eq!(summary.system_decision, SystemDecision::Pass);
    }

    #[test]
    fn test_rollup_by_size() {
        let aggregator = MeasurementAggregator::default();
        let specs = specs(2);

        let mut failing = MeasurementSession::new("E001", "M", None, Some("A".to_string()));
        failing.record(StreamKind::AllPoints, "P0", 0, "1").unwrap();
        failing.set_inspector_decision(Some(InspectorDecision::Fail));
        let passing = MeasurementSession::new("E002", "M", None, Some("A".to_string()));
        let other_size = MeasurementSession::new("E002", "L", None, Some("A".to_string()));

        let summaries: Vec<SessionSummary> = [failing, passing, other_size]
            .iter()
            .map(|s| aggregator.summarize(s, &specs, &specs))
            .collect();
        let rollups = rollup_by_size(&summaries);

        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].size, "L");
        let m = &rollups[1];
        assert_eq!(m.sessions, 2);
        assert_eq!(m.all_points.total_points, 4);
        assert_eq!(m.all_points.fail_points, 1);
        assert_eq!(m.all_points.pcs_pass_rate, "50.00");
        assert_eq!(m.system_fail, 1);
        assert_eq!(m.system_pass, 1);
        assert_eq!(m.inspector_fail, 1);
    }

    #[test]
    fn test_session_system_decision_shortcut() {
        let specs = specs(1);
        let mut session = MeasurementSession::new("E001", "M", None, None);
        assert_eq!(session.system_decision(&specs, &specs), SystemDecision::Pass);

        session.record(StreamKind::CriticalPoints, "P0", 0, "1/2").unwrap();
        assert_eq!(session.system_decision(&specs, &specs), SystemDecision::Fail);
        assert_eq!(session.summarize(&specs, &specs).critical_points.fail_pcs, 1);
    }
}
