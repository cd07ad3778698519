// ==========================================
// 水洗尺寸质检系统 - 公差字符串解析
// ==========================================
// 职责: 将公差单元格拆分为 负公差 / 正公差, 各自转换为分数值
// 形态（按优先级）:
//   1. "±1/4"                 对称公差
//   2. 两段式: 换行 / "~" / 空白分词判定表
//   3. "-1/4"                 仅负公差
//   4. "+1/2"                 仅正公差
//   5. "1/4"                  无符号单值, 视为对称公差
// 红线: 判定表按字面实现, 不做泛化
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::types::{FractionValue, ToleranceEnvelope};
use crate::engine::fraction::parse_fraction_str;

/// 对称公差前缀
const PLUS_MINUS_PREFIXES: [&str; 3] = ["±", "+/-", "+-"];

/// 两段式分隔符
const RANGE_SEPARATORS: [char; 2] = ['~', '～'];

/// 解析公差单元格
pub fn parse_tolerance(cell: &CellValue) -> ToleranceEnvelope {
    parse_tolerance_str(&cell.as_text())
}

/// 解析公差文本
pub fn parse_tolerance_str(value: &str) -> ToleranceEnvelope {
    let text = value.trim().replace('⁄', "/").replace("\r\n", "\n");
    if text.is_empty() {
        return ToleranceEnvelope::default();
    }

    // 1. 对称公差
    if let Some(rest) = strip_plus_minus(&text) {
        let magnitude = rest.trim().trim_start_matches(['+', '-']).trim();
        if magnitude.is_empty() {
            return ToleranceEnvelope::default();
        }
        return ToleranceEnvelope::new(negated(magnitude), parse_fraction_str(magnitude));
    }

    // 2. 两段式
    if let Some((minus, plus)) = split_two_values(&text) {
        return from_pair(&minus, &plus);
    }

    // 3-5. 单值
    if text.starts_with('-') {
        ToleranceEnvelope::new(parse_fraction_str(&text), FractionValue::empty())
    } else if let Some(rest) = text.strip_prefix('+') {
        ToleranceEnvelope::new(FractionValue::empty(), parse_fraction_str(rest))
    } else {
        ToleranceEnvelope::new(negated(&text), parse_fraction_str(&text))
    }
}

fn strip_plus_minus(text: &str) -> Option<&str> {
    PLUS_MINUS_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
}

/// 拆分两段式公差
///
/// # 判定顺序
/// 1. 换行（至少两行非空）
/// 2. "~" 分隔
/// 3. 空白分词:
///    - 2 段: 非零整数 + 无符号分数 → 带分数单值; 否则两段
///    - 3 段: 中间为分数 → ["a b", c]; 否则 [a, "b c"]
///    - 4 段: ["a b", "c d"]
fn split_two_values(text: &str) -> Option<(String, String)> {
    if text.contains('\n') {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() >= 2 {
            return Some((lines[0].to_string(), lines[1].to_string()));
        }
    }

    if let Some((minus, plus)) = text.split_once(RANGE_SEPARATORS) {
        return Some((minus.trim().to_string(), plus.trim().to_string()));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [a, b] => {
            if is_mixed_continuation(a, b) {
                None
            } else {
                Some((a.to_string(), b.to_string()))
            }
        }
        [a, b, c] => {
            if is_unsigned_fraction(b) {
                Some((format!("{} {}", a, b), c.to_string()))
            } else {
                Some((a.to_string(), format!("{} {}", b, c)))
            }
        }
        [a, b, c, d] => Some((format!("{} {}", a, b), format!("{} {}", c, d))),
        _ => None,
    }
}

/// 组装两段式结果
///
/// - 正公差以 '-' 开头而负公差不是 → 交换
/// - 负公差无符号 → 补 '-'
/// - 正公差去掉前导 '+'
fn from_pair(minus: &str, plus: &str) -> ToleranceEnvelope {
    let (minus, plus) = if plus.starts_with('-') && !minus.starts_with('-') {
        (plus, minus)
    } else {
        (minus, plus)
    };

    let minus = if minus.is_empty() {
        FractionValue::empty()
    } else if minus.starts_with('-') || minus.starts_with('+') {
        parse_fraction_str(minus)
    } else {
        negated(minus)
    };

    let plus = plus.strip_prefix('+').unwrap_or(plus).trim();
    let plus = if plus.is_empty() {
        FractionValue::empty()
    } else {
        parse_fraction_str(plus)
    };

    ToleranceEnvelope::new(minus, plus)
}

/// 补负号解析; 无法解析时保留原文
fn negated(text: &str) -> FractionValue {
    let parsed = parse_fraction_str(&format!("-{}", text));
    if parsed.has_value() {
        parsed
    } else {
        FractionValue::unparsed(text)
    }
}

fn is_mixed_continuation(first: &str, second: &str) -> bool {
    is_integer_token(first) && !is_zero_token(first) && is_unsigned_fraction(second)
}

fn is_integer_token(token: &str) -> bool {
    let digits = token.trim_start_matches(['+', '-']);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_zero_token(token: &str) -> bool {
    token.trim_start_matches(['+', '-']).chars().all(|c| c == '0')
}

fn is_unsigned_fraction(token: &str) -> bool {
    match token.split_once('/') {
        Some((n, d)) => {
            !n.is_empty()
                && !d.is_empty()
                && n.chars().all(|c| c.is_ascii_digit())
                && d.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
