// ==========================================
// 采收计件结算系统 - 应用状态
// ==========================================
// 职责: 组装仓储、导入器、API,管理共享资源
// 红线: 上传必须串行（破坏式替换不可交错）
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, ApiResult, SettlementApi};
use crate::config::{ConfigManager, SettlementConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::IngestMode;
use crate::importer::{DeliveryImporterImpl, LoadOutcome};
use crate::repository::{
    DeliveryRepository, DeliveryStore, PriceRuleRepository, SettlementRepository,
    StagedDeliveryRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "HARVEST_SETTLEMENT_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 当前入库模式
    pub ingest_mode: IngestMode,

    /// 结算 API
    pub api: Arc<SettlementApi>,

    /// 配置管理
    pub config: Arc<ConfigManager>,

    /// 上传串行锁
    upload_lock: Mutex<()>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接并建表（幂等）
    /// 2. 按 ingest_mode 选择交付存储实现
    /// 3. 创建导入器与 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = Arc::new(ConfigManager::from_connection(conn.clone()));
        let ingest_mode = config
            .get_ingest_mode()
            .map_err(|e| format!("读取入库模式失败: {}", e))?;
        let locale = config
            .get_report_locale()
            .map_err(|e| format!("读取报表语言失败: {}", e))?;
        crate::i18n::set_locale(&locale);

        // ==========================================
        // 存储端口（按配置选择实现）
        // ==========================================
        let deliveries: Arc<dyn DeliveryStore> = match ingest_mode {
            IngestMode::Standard => Arc::new(DeliveryRepository::from_connection(conn.clone())),
            IngestMode::Staged => Arc::new(StagedDeliveryRepository::from_connection(conn.clone())),
        };
        let prices = Arc::new(PriceRuleRepository::from_connection(conn.clone()));
        let settlements = Arc::new(SettlementRepository::from_connection(conn));

        let importer = Arc::new(DeliveryImporterImpl::new(deliveries.clone(), config.clone()));
        let api = Arc::new(SettlementApi::new(
            importer,
            deliveries,
            prices,
            settlements,
            config.clone(),
        ));

        tracing::info!(mode = %ingest_mode, locale = %locale, "AppState初始化完成");

        Ok(Self {
            db_path,
            ingest_mode,
            api,
            config,
            upload_lock: Mutex::new(()),
        })
    }

    /// 串行化上传
    ///
    /// # 参数
    /// - staged: true 走暂存批量通道
    pub fn upload(&self, data: &[u8], filename: &str, staged: bool) -> ApiResult<LoadOutcome> {
        let _guard = self
            .upload_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("上传锁获取失败: {}", e)))?;

        if staged {
            self.api.process_upload_staged(data, filename)
        } else {
            self.api.process_upload(data, filename)
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./harvest_settlement.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("harvest-settlement");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("harvest_settlement.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_state_wires_standard_mode_by_default() {
        let file = NamedTempFile::new().unwrap();
        let state = AppState::new(file.path().to_string_lossy().to_string()).unwrap();
        assert_eq!(state.ingest_mode, IngestMode::Standard);
        assert!(state.api.get_workers().unwrap().is_empty());
    }

    #[test]
    fn test_app_state_reads_staged_mode() {
        let file = NamedTempFile::new().unwrap();
        let db_path = file.path().to_string_lossy().to_string();
        {
            let first = AppState::new(db_path.clone()).unwrap();
            first
                .config
                .set_global_config_value(config_keys::INGEST_MODE, "STAGED")
                .unwrap();
        }

        let state = AppState::new(db_path).unwrap();
        assert_eq!(state.ingest_mode, IngestMode::Staged);
        assert!(state.api.get_worker_summary(None, None).unwrap().is_empty());
    }

    fn csv_row(worker: &str, count: i64) -> String {
        let mut cells = vec![String::new(); 26];
        cells[0] = "H1".to_string();
        cells[10] = "2024-03-01".to_string();
        cells[12] = worker.to_string();
        cells[17] = "Bin".to_string();
        cells[18] = count.to_string();
        cells.join(",")
    }

    #[test]
    fn test_concurrent_uploads_are_serialized() {
        let file = NamedTempFile::new().unwrap();
        let state = AppState::new(file.path().to_string_lossy().to_string()).unwrap();

        let header = vec!["col"; 26].join(",");
        let small = format!("{}\n{}\n", header, csv_row("Ana", 1));
        let large = format!(
            "{}\n{}\n{}\n{}\n",
            header,
            csv_row("Luis", 1),
            csv_row("Eva", 2),
            csv_row("Juan", 3)
        );

        let outcomes: Vec<LoadOutcome> = std::thread::scope(|s| {
            let a = s.spawn(|| state.upload(small.as_bytes(), "a.csv", false).unwrap());
            let b = s.spawn(|| state.upload(large.as_bytes(), "b.csv", false).unwrap());
            vec![a.join().unwrap(), b.join().unwrap()]
        });
        assert_eq!(outcomes[0].inserted, 1);
        assert_eq!(outcomes[1].inserted, 3);

        // 串行化后最终数据集等于某一次上传的完整结果
        let workers = state.api.get_workers().unwrap();
        assert!(
            workers == vec!["Ana".to_string()]
                || workers == vec!["Eva".to_string(), "Juan".to_string(), "Luis".to_string()],
            "unexpected worker set: {:?}",
            workers
        );
    }
}
