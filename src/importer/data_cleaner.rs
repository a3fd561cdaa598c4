// ==========================================
// 采收计件结算系统 - 单元格清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 宽松数值解析 / 日期解析
// 红线: 数值字段解析失败返回 0,不报错；只有日期是必填
// ==========================================

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Excel 1900 日期系统的最大序列号（9999-12-31 之后）
pub const MAX_EXCEL_SERIAL: f64 = 2_958_466.0;

/// 字符串日期格式（按优先级尝试，首个成功者生效）
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const ISO_T_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.3fZ", "%Y-%m-%dT%H:%M:%S"];
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

const SECONDS_PER_DAY: f64 = 86_400.0;

pub struct DataCleaner;

impl DataCleaner {
    /// TRIM
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 空白 → None，否则保留 TRIM 后文本
    pub fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// 宽松整数解析
    ///
    /// 规则:
    /// - 去除所有空白
    /// - 恰好一个 ',' 且没有 '.' → ',' 为小数点,截断小数部分
    /// - 否则 '.' 与 ',' 均视为千分位并删除
    /// - 失败或负数 → 0
    pub fn parse_int(&self, value: &str) -> i64 {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let integer_part: String = if is_decimal_comma(&compact) {
            compact.split(',').next().unwrap_or("").to_string()
        } else {
            compact.chars().filter(|c| *c != '.' && *c != ',').collect()
        };
        integer_part.parse::<i64>().map(|v| v.max(0)).unwrap_or(0)
    }

    /// 宽松浮点解析
    ///
    /// 规则:
    /// - 去除所有空白
    /// - 恰好一个 ',' 且没有 '.' → ',' 为小数点
    /// - 否则 ',' 视为千分位并删除
    /// - 失败 / NaN / 无穷 / 负数 → 0
    pub fn parse_float(&self, value: &str) -> f64 {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let normalized = if is_decimal_comma(&compact) {
            compact.replace(',', ".")
        } else {
            compact.replace(',', "")
        };

        match normalized.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            _ => 0.0,
        }
    }

    /// 日期解析
    ///
    /// 顺序:
    /// 1. 可解析为数字 → 按 Excel 日期序列号处理
    /// 2. 依次尝试字符串格式
    ///
    /// # 返回
    /// - None: 两条路径都失败
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(serial) = trimmed.parse::<f64>() {
            if let Some(date) = excel_serial_to_date(serial) {
                return Some(date);
            }
        }

        parse_date_string(trimmed)
    }

    /// 时刻解析（可选字段,失败为 None）
    ///
    /// 接受 `HH:MM:SS` / `HH:MM`（小时可不补零）,以及 Excel 时间序列号（取小数部分）
    pub fn parse_time(&self, value: &str) -> Option<NaiveTime> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(time) = TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        {
            return Some(time);
        }

        trimmed.parse::<f64>().ok().and_then(excel_fraction_to_time)
    }
}

/// Excel 1900 日期系统序列号 → 日期（小数部分为时刻，丢弃）
///
/// 1900 系统把 1900 年当作闰年（不存在的 1900-02-29 = 60）：
/// - serial >= 61 以 1899-12-30 为纪元（相对 1900-01-01 偏移 2 天）
/// - serial < 60 以 1899-12-31 为纪元
/// - serial == 60 视为 1900-02-28
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial >= MAX_EXCEL_SERIAL {
        return None;
    }

    let days = serial.trunc() as i64;
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else if days == 60 {
        return NaiveDate::from_ymd_opt(1900, 2, 28);
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::days(days))
}

fn parse_date_string(value: &str) -> Option<NaiveDate> {
    // 与导入源保持一致的优先级: ISO 日期时间、ISO 日期、日/月/年（带/不带时间）、RFC 3339
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, DATETIME_FORMATS[0]) {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, DATE_FORMATS[0]) {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, DATETIME_FORMATS[1]) {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, DATE_FORMATS[1]) {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    ISO_T_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

/// Excel 序列号小数部分 → 时刻（四舍五入到秒）
pub fn excel_fraction_to_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= MAX_EXCEL_SERIAL {
        return None;
    }
    let seconds = (serial.fract() * SECONDS_PER_DAY).round() as u32;
    // 23:59:59.5 之后四舍五入会到 86400
    NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
}

/// 恰好一个 ',' 且没有 '.'
fn is_decimal_comma(value: &str) -> bool {
    value.matches(',').count() == 1 && !value.contains('.')
}
