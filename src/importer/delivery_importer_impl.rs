// ==========================================
// 采收计件结算系统 - 交付导入器实现
// ==========================================
// 职责: 整合导入流程，从上传字节到存储
// 流程: 解析 → 行标准化 → 分块加载（标准）/ 全量暂存（暂存）
// ==========================================

use crate::config::SettlementConfigReader;
use crate::importer::bulk_loader::{load_staged, BulkLoader, LoadOutcome, LoaderSettings};
use crate::importer::delivery_importer_trait::DeliveryImporter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::row_normalizer::RowNormalizer;
use crate::repository::DeliveryStore;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn config_error(key: &str, err: Box<dyn Error>) -> ImportError {
    ImportError::ConfigReadError {
        key: key.to_string(),
        message: err.to_string(),
    }
}

// ==========================================
// DeliveryImporterImpl
// ==========================================
pub struct DeliveryImporterImpl {
    // 存储端口（标准或暂存实现）
    store: Arc<dyn DeliveryStore>,

    // 配置读取器
    config: Arc<dyn SettlementConfigReader>,

    normalizer: RowNormalizer,
}

impl DeliveryImporterImpl {
    pub fn new(store: Arc<dyn DeliveryStore>, config: Arc<dyn SettlementConfigReader>) -> Self {
        Self {
            store,
            config,
            normalizer: RowNormalizer::new(),
        }
    }

    fn loader_settings(&self) -> ImportResult<LoaderSettings> {
        use crate::config::config_keys as keys;
        Ok(LoaderSettings {
            chunk_size: self
                .config
                .get_chunk_size()
                .map_err(|e| config_error(keys::INGEST_CHUNK_SIZE, e))?,
            error_log_limit: self
                .config
                .get_error_log_limit()
                .map_err(|e| config_error(keys::INGEST_ERROR_LOG_LIMIT, e))?,
            progress_interval: self
                .config
                .get_progress_interval()
                .map_err(|e| config_error(keys::INGEST_PROGRESS_INTERVAL, e))?,
        })
    }
}

impl DeliveryImporter for DeliveryImporterImpl {
    /// 标准通道导入
    ///
    /// # 返回
    /// - Ok(LoadOutcome): 插入数 / 错误数
    /// - Err: 无法读取文件、无法删除旧数据、或没有任何有效行
    ///   （旧数据删除后的读取失败不返回 Err,计入错误行）
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    fn process_upload(&self, data: &[u8], filename: &str) -> ImportResult<LoadOutcome> {
        let parser = UniversalFileParser::for_filename(filename)?;
        let settings = self.loader_settings()?;
        info!(
            filename = filename,
            mode = %self.store.mode(),
            chunk_size = settings.chunk_size,
            "开始导入交付数据"
        );

        let mut loader = BulkLoader::new(self.store.as_ref(), settings);
        let visited = parser.for_each_row(data, &mut |row_index, cells| {
            match self.normalizer.parse(&cells, row_index) {
                Ok(Some(record)) => loader.push(record),
                Ok(None) => Ok(()),
                Err(failure) => {
                    loader.push_failure(&failure);
                    Ok(())
                }
            }
        });

        match visited {
            Ok(rows) => {
                debug!(rows = rows, "文件遍历完成");
                loader.finish()
            }
            // 旧数据一旦删除,不再向调用方返回错误
            Err(e) => loader.abort(e),
        }
    }

    /// 暂存通道导入
    ///
    /// 全量解析后一次性复制到暂存区,再由合并步骤整体替换主表
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    fn process_upload_staged(&self, data: &[u8], filename: &str) -> ImportResult<LoadOutcome> {
        let staging = self.store.staging().ok_or(ImportError::StagingUnavailable)?;
        let parser = UniversalFileParser::for_filename(filename)?;
        let settings = self.loader_settings()?;
        info!(filename = filename, "开始暂存通道导入");

        let mut records = Vec::new();
        let mut failures = 0usize;
        parser.for_each_row(data, &mut |row_index, cells| {
            match self.normalizer.parse(&cells, row_index) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(failure) => {
                    if failures < settings.error_log_limit {
                        warn!(row = failure.row, value = %failure.value, "行解析失败，已跳过");
                    }
                    failures += 1;
                }
            }
            Ok(())
        })?;
        info!(parsed = records.len(), failures = failures, "文件解析完成，开始批量复制");

        load_staged(staging, records, failures)
    }
}
