// ==========================================
// 水洗尺寸质检系统 - 公差判定引擎
// ==========================================
// 职责: 判定测量偏差是否在公差范围内, 区分超上限 / 超下限
// 红线: 偏差为 0 / 缺失 视为未测量, 一律合格
// ==========================================

use crate::domain::types::{ToleranceEnvelope, ToleranceResult};

/// 浮点比较容差（吸收 4 位小数舍入误差）
pub const DEFAULT_TOLERANCE_EPSILON: f64 = 0.0001;

// ==========================================
// ToleranceEvaluator - 公差判定引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ToleranceEvaluator {
    epsilon: f64,
}

impl Default for ToleranceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_EPSILON)
    }
}

impl ToleranceEvaluator {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// 判定偏差
    ///
    /// # 规则
    /// - 偏差 None / 0 / NaN → 默认合格 (is_default=true)
    /// - min = -|minus|, max = |plus|（缺失视为 0）
    /// - min - ε ≤ d ≤ max + ε → 合格
    /// - 否则 d > max → 超上限, d < min → 超下限
    pub fn check(&self, envelope: &ToleranceEnvelope, deviation: Option<f64>) -> ToleranceResult {
        let min = envelope.lower_bound();
        let max = envelope.upper_bound();

        let deviation = match deviation {
            Some(d) if d != 0.0 && !d.is_nan() => d,
            _ => return ToleranceResult::default_pass(min, max),
        };

        let is_within = deviation >= min - self.epsilon && deviation <= max + self.epsilon;

        ToleranceResult {
            is_within,
            is_default: false,
            is_positive_out: !is_within && deviation > max,
            is_negative_out: !is_within && deviation < min,
            deviation,
            min,
            max,
        }
    }
}

/// 使用默认容差判定
pub fn check_tolerance(envelope: &ToleranceEnvelope, deviation: Option<f64>) -> ToleranceResult {
    ToleranceEvaluator::default().check(envelope, deviation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tolerance_parser::parse_tolerance_str;

    fn exactly_one_flag(result: &ToleranceResult) -> bool {
        [result.is_within, result.is_positive_out, result.is_negative_out]
            .iter()
            .filter(|f| **f)
            .count()
            == 1
    }

    #[test]
    fn test_default_is_pass() {
        let zero = ToleranceEnvelope::default();
        let result = check_tolerance(&zero, Some(0.0));
        assert!(result.is_within);
        assert!(result.is_default);
        assert_eq!(result.deviation, 0.0);

        let result = check_tolerance(&zero, None);
        assert!(result.is_within && result.is_default);

        let result = check_tolerance(&zero, Some(f64::NAN));
        assert!(result.is_default);
    }

    #[test]
    fn test_within_and_out() {
        let env = parse_tolerance_str("-1/4~+1/2");

        let within = check_tolerance(&env, Some(0.5));
        assert!(within.is_within && !within.is_default);
        assert_eq!(within.min, -0.25);
        assert_eq!(within.max, 0.5);

        let over = check_tolerance(&env, Some(0.5625));
        assert!(over.is_positive_out && !over.is_within);

        let under = check_tolerance(&env, Some(-0.3125));
        assert!(under.is_negative_out && !under.is_within);
    }

    #[test]
    fn test_epsilon_absorbs_rounding_noise() {
        let env = parse_tolerance_str("±1/3");
        // 1/3 → 0.3333
        assert!(check_tolerance(&env, Some(0.33335)).is_within);
        assert!(!check_tolerance(&env, Some(0.3336)).is_within);
    }

    #[test]
    fn test_sign_of_plus_is_ignored() {
        // 两段均为负号时, 比较仍取绝对值
        let env = parse_tolerance_str("-1/4 -1/2");
        let result = check_tolerance(&env, Some(0.5));
        assert!(result.is_within);
        assert_eq!(result.max, 0.5);
    }

    #[test]
    fn test_exactly_one_flag_invariant() {
        let envelopes = ["±1/4", "-1/8~+1/2", "0 1/4", "-1/4", "+1/2", ""];
        for text in envelopes {
            let env = parse_tolerance_str(text);
            for step in -24..=24 {
                let deviation = step as f64 / 16.0;
                let result = check_tolerance(&env, Some(deviation));
                if result.is_default {
                    assert!(result.is_within);
                } else {
                    assert!(exactly_one_flag(&result), "{} @ {}", text, deviation);
                }
            }
        }
    }
}
