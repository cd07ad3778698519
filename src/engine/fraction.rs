// ==========================================
// 水洗尺寸质检系统 - 分数/小数转换
// ==========================================
// 职责: 表格分数文本 ⇄ 规范化小数
// 支持: 整数 / 小数 / 简单分数 "N/D" / 带分数 "W N/D"
// 红线: 无状态、无副作用; 无法解析时降级为 decimal=None, 不报错
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::types::FractionValue;

/// 分数匹配默认容差（十六分之一吸附）
pub const DEFAULT_FRACTION_SNAP: f64 = 0.01;

/// 小数保留位数
const DECIMAL_SCALE: f64 = 10_000.0;

/// 十六分之一分母
const SIXTEENTHS: u64 = 16;

// ==========================================
// 文本 → 小数
// ==========================================

/// 解析单元格为分数值
///
/// # 规则
/// 1. 空单元格 → raw="", decimal=None
/// 2. 数值单元格按其十进制文本处理
/// 3. 其余见 [`parse_fraction_str`]
pub fn parse_fraction(value: &CellValue) -> FractionValue {
    match value {
        CellValue::Empty => FractionValue::empty(),
        CellValue::Number(n) if !n.is_finite() => FractionValue::unparsed(n.to_string()),
        other => parse_fraction_str(&other.as_text()),
    }
}

/// 解析分数文本
///
/// # 规则
/// 1. 规范化: trim, '⁄' → '/', 连续空白折叠为单个空格
/// 2. 含空格且含 '/': 带分数, 整数部分符号传递给分数部分
///    ("-1 1/2" = -1.5; 整数为 0 时按正号处理, "0 1/2" = 0.5)
/// 3. 仅含 '/': 简单分数
/// 4. 其他: 取前导数字部分解析
/// 5. 任一部分无法解析 / 分母为 0 → decimal=None, raw 保留原文
/// 6. 成功时 decimal 四舍五入到 4 位, raw 为规范化文本
pub fn parse_fraction_str(value: &str) -> FractionValue {
    let normalized = normalize_fraction_text(value);
    if normalized.is_empty() {
        return FractionValue::unparsed(value);
    }

    let total = if normalized.contains(' ') && normalized.contains('/') {
        parse_mixed(&normalized)
    } else if normalized.contains('/') {
        parse_simple(&normalized)
    } else {
        parse_float_prefix(&normalized)
    };

    match total {
        Some(t) if t.is_finite() => FractionValue {
            raw: normalized,
            decimal: Some(round_decimal(t)),
        },
        _ => FractionValue::unparsed(value),
    }
}

/// 规范化分数文本
pub fn normalize_fraction_text(value: &str) -> String {
    value
        .trim()
        .replace('⁄', "/")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_mixed(text: &str) -> Option<f64> {
    let mut parts = text.split(' ');
    let whole = parse_float_prefix(parts.next()?)?;
    let fraction = parse_simple(parts.next()?)?;

    // -0 也按正号处理
    let sign = if whole < 0.0 { -1.0 } else { 1.0 };
    Some(whole + sign * fraction)
}

fn parse_simple(text: &str) -> Option<f64> {
    let (numerator, denominator) = text.split_once('/')?;
    let numerator = parse_float_prefix(numerator)?;
    let denominator = parse_float_prefix(denominator)?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// 前导数字解析（与表格的 parseFloat 行为一致: "2cm" → 2）
pub(crate) fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }

    // 指数部分必须带数字才计入
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// 四舍五入到 4 位小数, 负零归一为 0
pub(crate) fn round_decimal(value: f64) -> f64 {
    let rounded = (value * DECIMAL_SCALE).round() / DECIMAL_SCALE;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// ==========================================
// 小数 → 分数文本
// ==========================================

/// 小数转为最接近的十六分之一分数文本（默认容差 0.01）
pub fn format_decimal_as_fraction(decimal: Option<f64>) -> String {
    format_decimal_with_snap(decimal, DEFAULT_FRACTION_SNAP)
}

/// 小数转为最接近的十六分之一分数文本
///
/// # 规则
/// - None / 0 / NaN → "0"
/// - 余数在容差内接近 0 → 仅整数; 接近 1 → 整数 + 1
/// - 否则匹配 1/16 … 15/16 中最接近者（约分后输出）
/// - 无匹配 → 保留 2~3 位小数
pub fn format_decimal_with_snap(decimal: Option<f64>, snap: f64) -> String {
    let value = match decimal {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => return "0".to_string(),
    };

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    // 整数部分保持 f64（可超出 u64 范围）
    let mut whole = magnitude.floor();
    let remainder = magnitude - whole;

    let fraction = if remainder < snap {
        None
    } else if 1.0 - remainder < snap {
        whole += 1.0;
        None
    } else {
        match nearest_sixteenth(remainder) {
            Some((numerator, diff)) if diff < snap => Some(reduce(numerator, SIXTEENTHS)),
            _ => return format_fallback(sign, magnitude),
        }
    };

    match fraction {
        None if whole == 0.0 => "0".to_string(),
        None => format!("{}{}", sign, whole),
        Some((n, d)) if whole == 0.0 => format!("{}{}/{}", sign, n, d),
        Some((n, d)) => format!("{}{} {}/{}", sign, whole, n, d),
    }
}

/// 最接近的 n/16 (n ∈ 1..=15) 及其偏差
fn nearest_sixteenth(remainder: f64) -> Option<(u64, f64)> {
    (1..SIXTEENTHS)
        .map(|n| (n, (remainder - n as f64 / SIXTEENTHS as f64).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn reduce(numerator: u64, denominator: u64) -> (u64, u64) {
    let divisor = gcd(numerator, denominator);
    (numerator / divisor, denominator / divisor)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn format_fallback(sign: &str, magnitude: f64) -> String {
    let mut text = format!("{:.3}", magnitude);
    // 至少保留 2 位小数
    if text.ends_with('0') {
        text.pop();
    }
    format!("{}{}", sign, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal_of(text: &str) -> Option<f64> {
        parse_fraction_str(text).decimal
    }

    #[test]
    fn test_parse_whole_and_decimal() {
        assert_eq!(decimal_of("2"), Some(2.0));
        assert_eq!(decimal_of(" 12.5 "), Some(12.5));
        assert_eq!(decimal_of("0"), Some(0.0));
        assert_eq!(parse_fraction_str("0").raw, "0");
        assert_eq!(decimal_of("2cm"), Some(2.0));
    }

    #[test]
    fn test_parse_simple_fraction() {
        assert_eq!(decimal_of("1/4"), Some(0.25));
        assert_eq!(decimal_of("-1/2"), Some(-0.5));
        assert_eq!(decimal_of("1⁄8"), Some(0.125));
        assert_eq!(decimal_of("1/3"), Some(0.3333));
    }

    #[test]
    fn test_parse_mixed_fraction_sign_propagation() {
        assert_eq!(decimal_of("-1 1/2"), Some(-1.5));
        assert_eq!(decimal_of("1 1/2"), Some(1.5));
        assert_eq!(decimal_of("0 1/2"), Some(0.5));
        assert_eq!(decimal_of("-0 1/2"), Some(0.5));
        assert_eq!(decimal_of("2   3/4"), Some(2.75));
    }

    #[test]
    fn test_parse_normalizes_raw() {
        let value = parse_fraction_str("  1   1⁄4 ");
        assert_eq!(value.raw, "1 1/4");
        assert_eq!(value.decimal, Some(1.25));
    }

    #[test]
    fn test_parse_fallback_keeps_original() {
        let value = parse_fraction_str(" - ");
        assert_eq!(value.raw, " - ");
        assert_eq!(value.decimal, None);

        let zero_den = parse_fraction_str("1/0");
        assert_eq!(zero_den.raw, "1/0");
        assert_eq!(zero_den.decimal, None);

        assert_eq!(decimal_of("NA"), None);
        assert_eq!(decimal_of("1 abc/4"), None);
    }

    #[test]
    fn test_parse_cell_values() {
        assert_eq!(parse_fraction(&CellValue::Empty), FractionValue::empty());
        let number = parse_fraction(&CellValue::Number(2.0));
        assert_eq!(number.raw, "2");
        assert_eq!(number.decimal, Some(2.0));
        assert_eq!(parse_fraction(&CellValue::Number(0.0)).decimal, Some(0.0));
    }

    #[test]
    fn test_format_basic() {
        assert_eq!(format_decimal_as_fraction(None), "0");
        assert_eq!(format_decimal_as_fraction(Some(0.0)), "0");
        assert_eq!(format_decimal_as_fraction(Some(f64::NAN)), "0");
        assert_eq!(format_decimal_as_fraction(Some(0.25)), "1/4");
        assert_eq!(format_decimal_as_fraction(Some(-1.5)), "-1 1/2");
        assert_eq!(format_decimal_as_fraction(Some(2.0)), "2");
        assert_eq!(format_decimal_as_fraction(Some(0.3125)), "5/16");
    }

    #[test]
    fn test_format_snaps_noise() {
        assert_eq!(format_decimal_as_fraction(Some(0.2501)), "1/4");
        assert_eq!(format_decimal_as_fraction(Some(1.998)), "2");
        assert_eq!(format_decimal_as_fraction(Some(-0.001)), "0");
    }

    #[test]
    fn test_format_fallback_decimals() {
        assert_eq!(format_decimal_as_fraction(Some(1.3)), "1.30");
        assert_eq!(format_decimal_as_fraction(Some(-0.333)), "-0.333");
    }

    #[test]
    fn test_round_trip_sixteenths() {
        for step in -160..=160 {
            let d = step as f64 / 16.0;
            let text = format_decimal_as_fraction(Some(d));
            let back = parse_fraction_str(&text).decimal.unwrap();
            assert!((back - d).abs() <= 0.02, "{} -> {} -> {}", d, text, back);
        }
    }

    #[test]
    fn test_format_keeps_large_whole_part() {
        assert_eq!(format_decimal_as_fraction(Some(1e20)), "100000000000000000000");
        assert_eq!(format_decimal_as_fraction(Some(-3e19)), "-30000000000000000000");
        assert_eq!(format_decimal_as_fraction(Some(4.5)), "4 1/2");
        assert_eq!(format_decimal_as_fraction(Some(0.999)), "1");
    }
}
