// ==========================================
// 采收计件结算系统 - 领域类型定义
// ==========================================
// 职责: 枚举类型（入库模式 / 报表布局）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 入库模式 (Ingest Mode)
// ==========================================
// STANDARD: 逐块事务写入主表
// STAGED:   批量复制到暂存区，再整体合并
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestMode {
    Standard,
    Staged,
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestMode::Standard => write!(f, "STANDARD"),
            IngestMode::Staged => write!(f, "STAGED"),
        }
    }
}

impl IngestMode {
    /// 从配置字符串解析（大小写不敏感，未知值返回 None）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "STANDARD" => Some(IngestMode::Standard),
            "STAGED" => Some(IngestMode::Staged),
            _ => None,
        }
    }
}

// ==========================================
// 报表布局 (Report Layout)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportLayout {
    SingleSheet, // 所有结算记录写入同一个工作表
    PerWorker,   // 每个工人一个工作表
}

impl fmt::Display for ReportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLayout::SingleSheet => write!(f, "SINGLE_SHEET"),
            ReportLayout::PerWorker => write!(f, "PER_WORKER"),
        }
    }
}

impl ReportLayout {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "SINGLE_SHEET" => Some(ReportLayout::SingleSheet),
            "PER_WORKER" => Some(ReportLayout::PerWorker),
            _ => None,
        }
    }
}
