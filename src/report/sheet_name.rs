// ==========================================
// 工作表名称清洗
// ==========================================
// Excel 限制: 不含 / \ : * ? [ ],不超过 31 个字符,
// 不以单引号开头或结尾,同一工作簿内不区分大小写唯一
// ==========================================

use std::collections::HashSet;

/// 工作表名称最大长度（字符数）
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN: [char; 7] = ['/', '\\', ':', '*', '?', '[', ']'];

/// 清洗工作表名称
///
/// 非法字符替换为 `_`,截断到 31 个字符；
/// 清洗后为空时返回 `fallback`
pub fn sanitize_sheet_name(raw: &str, fallback: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if name.starts_with('\'') {
        name.replace_range(..1, "_");
    }
    if name.ends_with('\'') {
        name.pop();
        name.push('_');
    }

    if name.is_empty() {
        fallback.chars().take(MAX_SHEET_NAME_LEN).collect()
    } else {
        name
    }
}

// ==========================================
// SheetNamer - 同一工作簿内去重
// ==========================================
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记已占用的名称（如固定的汇总表）
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_lowercase());
    }

    /// 返回唯一名称,冲突时追加 " (n)" 并保证总长不超过 31
    pub fn unique(&mut self, raw: &str, fallback: &str) -> String {
        let base = sanitize_sheet_name(raw, fallback);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut n = 2;
        loop {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            let candidate: String = base.chars().take(keep).collect::<String>() + &suffix;
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}
