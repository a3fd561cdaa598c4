// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use harvest_settlement::config::SettlementConfigReader;
use harvest_settlement::domain::{IngestMode, ReportLayout};
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub chunk_size: usize,
    pub error_log_limit: usize,
    pub progress_interval: usize,
    pub ingest_mode: IngestMode,
    pub report_layout: ReportLayout,
    pub report_locale: String,
    /// 为 true 时所有读取返回错误
    pub broken: bool,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            chunk_size: 5000,
            error_log_limit: 5,
            progress_interval: 10_000,
            ingest_mode: IngestMode::Standard,
            report_layout: ReportLayout::SingleSheet,
            report_locale: "es".to_string(),
            broken: false,
        }
    }

    /// 指定分块大小
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        let mut config = Self::default();
        config.chunk_size = chunk_size;
        config
    }

    /// 所有读取都失败的配置
    pub fn broken() -> Self {
        let mut config = Self::default();
        config.broken = true;
        config
    }

    fn read<T: Clone>(&self, value: &T) -> Result<T, Box<dyn Error>> {
        if self.broken {
            return Err("配置表不可读".into());
        }
        Ok(value.clone())
    }
}

impl SettlementConfigReader for MockConfig {
    fn get_chunk_size(&self) -> Result<usize, Box<dyn Error>> {
        self.read(&self.chunk_size)
    }

    fn get_error_log_limit(&self) -> Result<usize, Box<dyn Error>> {
        self.read(&self.error_log_limit)
    }

    fn get_progress_interval(&self) -> Result<usize, Box<dyn Error>> {
        self.read(&self.progress_interval)
    }

    fn get_ingest_mode(&self) -> Result<IngestMode, Box<dyn Error>> {
        self.read(&self.ingest_mode)
    }

    fn get_report_layout(&self) -> Result<ReportLayout, Box<dyn Error>> {
        self.read(&self.report_layout)
    }

    fn get_report_locale(&self) -> Result<String, Box<dyn Error>> {
        self.read(&self.report_locale)
    }
}
