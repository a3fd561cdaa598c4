// ==========================================
// 采收计件结算系统 - 配置读取 Trait
// ==========================================
// 职责: 定义导入/结算管线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::{IngestMode, ReportLayout};
use std::error::Error;

// ==========================================
// SettlementConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait SettlementConfigReader: Send + Sync {
    // ===== 导入配置 =====

    /// 每块提交的记录数
    ///
    /// # 默认值
    /// - 5000（非法值或 < 1 时回退默认值）
    fn get_chunk_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 行解析失败时写日志的最大条数
    ///
    /// # 默认值
    /// - 5
    fn get_error_log_limit(&self) -> Result<usize, Box<dyn Error>>;

    /// 进度日志间隔（行）
    ///
    /// # 默认值
    /// - 10000
    fn get_progress_interval(&self) -> Result<usize, Box<dyn Error>>;

    /// 入库模式
    ///
    /// # 默认值
    /// - STANDARD
    fn get_ingest_mode(&self) -> Result<IngestMode, Box<dyn Error>>;

    // ===== 报表配置 =====

    /// 报表布局
    ///
    /// # 默认值
    /// - SINGLE_SHEET
    fn get_report_layout(&self) -> Result<ReportLayout, Box<dyn Error>>;

    /// 报表语言
    ///
    /// # 默认值
    /// - es
    fn get_report_locale(&self) -> Result<String, Box<dyn Error>>;
}
