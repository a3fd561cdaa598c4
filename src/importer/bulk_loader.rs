// ==========================================
// 采收计件结算系统 - 批量加载器
// ==========================================
// 标准通道:
// - 按固定块大小缓冲、逐块事务提交
// - 在第一块真正写入前删除旧数据（仅一次,惰性）
// - 块提交失败: 该块行数计入错误,继续下一块（不重试）
// 暂存通道:
// - 全量缓冲 → 清空暂存区 → 批量复制 → 合并（整体成败）
// ==========================================

use crate::config::defaults;
use crate::domain::DeliveryRecord;
use crate::importer::error::{ImportError, ImportResult, RowParseError};
use crate::repository::{DeliveryStore, StagingStore};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// 加载结果（部分成功时同样返回,便于调用方感知）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub inserted: usize,
    pub errors: usize,
}

/// 加载参数（块大小只影响性能,不影响正确性）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    pub chunk_size: usize,
    pub error_log_limit: usize,
    pub progress_interval: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            chunk_size: defaults::CHUNK_SIZE,
            error_log_limit: defaults::ERROR_LOG_LIMIT,
            progress_interval: defaults::PROGRESS_INTERVAL,
        }
    }
}

// ==========================================
// BulkLoader - 标准通道
// ==========================================
pub struct BulkLoader<'a> {
    store: &'a dyn DeliveryStore,
    settings: LoaderSettings,

    // ===== 运行状态 =====
    buffer: Vec<DeliveryRecord>,
    inserted: usize,
    errors: usize,
    processed: usize,
    logged_failures: usize,
    replaced: bool, // 旧数据是否已删除
}

impl<'a> BulkLoader<'a> {
    pub fn new(store: &'a dyn DeliveryStore, settings: LoaderSettings) -> Self {
        let settings = LoaderSettings {
            chunk_size: settings.chunk_size.max(1),
            progress_interval: settings.progress_interval.max(1),
            ..settings
        };
        Self {
            store,
            settings,
            buffer: Vec::with_capacity(settings.chunk_size),
            inserted: 0,
            errors: 0,
            processed: 0,
            logged_failures: 0,
            replaced: false,
        }
    }

    /// 一次性加载记录流
    ///
    /// # 返回
    /// - Ok(LoadOutcome): 至少插入一行
    /// - Err(NoValidRows): 一行都没有插入
    /// - Err(Storage): 删除旧数据失败（无法继续）
    pub fn load<I>(
        store: &'a dyn DeliveryStore,
        settings: LoaderSettings,
        records: I,
    ) -> ImportResult<LoadOutcome>
    where
        I: IntoIterator<Item = Result<DeliveryRecord, RowParseError>>,
    {
        let mut loader = Self::new(store, settings);
        for item in records {
            match item {
                Ok(record) => loader.push(record)?,
                Err(failure) => loader.push_failure(&failure),
            }
        }
        loader.finish()
    }

    /// 追加一条有效记录,缓冲满时提交
    pub fn push(&mut self, record: DeliveryRecord) -> ImportResult<()> {
        self.buffer.push(record);
        self.tick();
        if self.buffer.len() >= self.settings.chunk_size {
            self.flush()?;
        }
        Ok(())
    }

    /// 记录一条解析失败（只计数,前 N 条写日志）
    pub fn push_failure(&mut self, failure: &RowParseError) {
        self.errors += 1;
        if self.logged_failures < self.settings.error_log_limit {
            warn!(row = failure.row, value = %failure.value, "行解析失败，已跳过");
            self.logged_failures += 1;
        }
        self.tick();
    }

    /// 提交剩余缓冲并给出结果
    pub fn finish(mut self) -> ImportResult<LoadOutcome> {
        self.flush()?;

        let outcome = LoadOutcome {
            inserted: self.inserted,
            errors: self.errors,
        };
        info!(
            inserted = outcome.inserted,
            errors = outcome.errors,
            processed = self.processed,
            "批量加载完成"
        );

        if outcome.inserted == 0 {
            return Err(ImportError::NoValidRows {
                error_rows: outcome.errors,
            });
        }
        Ok(outcome)
    }

    /// 文件读取中途失败时收尾
    ///
    /// # 返回
    /// - 旧数据尚未删除: 原样返回错误,存储不变
    /// - 旧数据已删除: 已提交的块保留,失败计 1 行错误,按 finish 给出结果
    pub fn abort(mut self, cause: ImportError) -> ImportResult<LoadOutcome> {
        if !self.replaced {
            return Err(cause);
        }
        error!(error = %cause, inserted = self.inserted, "文件读取中断，保留已提交数据");
        self.errors += 1;
        self.finish()
    }

    fn tick(&mut self) {
        self.processed += 1;
        if self.processed % self.settings.progress_interval == 0 {
            info!(
                processed = self.processed,
                inserted = self.inserted,
                errors = self.errors,
                "导入进度"
            );
        }
    }

    fn flush(&mut self) -> ImportResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        if !self.replaced {
            let deleted = self.store.delete_all()?;
            self.replaced = true;
            info!(deleted = deleted, "已删除旧交付数据");
        }

        let chunk = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.settings.chunk_size),
        );
        match self.store.insert_batch(&chunk) {
            Ok(written) => {
                self.inserted += written;
                self.errors += chunk.len().saturating_sub(written);
            }
            Err(e) => {
                self.errors += chunk.len();
                error!(chunk_rows = chunk.len(), error = %e, "块提交失败，继续处理下一块");
            }
        }
        Ok(())
    }
}

// ==========================================
// 暂存通道
// ==========================================

/// 暂存通道加载
///
/// # 参数
/// - staging: 暂存区能力
/// - records: 已解析的全部记录（调用方需按最大文件规划内存）
/// - parse_errors: 复制前被拒绝的行数
///
/// # 返回
/// - Err(NoValidRows): 没有可复制的记录（存储保持不变）
/// - Err(Storage): 暂存/合并失败（合并整体回滚）
pub fn load_staged(
    staging: &dyn StagingStore,
    records: Vec<DeliveryRecord>,
    parse_errors: usize,
) -> ImportResult<LoadOutcome> {
    if records.is_empty() {
        return Err(ImportError::NoValidRows {
            error_rows: parse_errors,
        });
    }

    staging.clear_staging()?;
    let copied = staging.copy_into_staging(&records)?;
    let consolidated = staging.consolidate_staging()?;

    let outcome = LoadOutcome {
        inserted: consolidated,
        errors: parse_errors + records.len().saturating_sub(consolidated),
    };
    info!(
        copied = copied,
        consolidated = outcome.inserted,
        errors = outcome.errors,
        "暂存通道加载完成"
    );

    if outcome.inserted == 0 {
        return Err(ImportError::NoValidRows {
            error_rows: outcome.errors,
        });
    }
    Ok(outcome)
}
