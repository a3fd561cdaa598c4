// ==========================================
// 采收计件结算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::settlement_config_trait::SettlementConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::{IngestMode, ReportLayout};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置；非法值记录告警并回退默认值
    fn get_positive_usize(&self, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<usize>() {
            Ok(v) if v >= 1 => Ok(v),
            _ => {
                warn!(key = key, value = %raw, default = default, "配置值非法，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

impl SettlementConfigReader for ConfigManager {
    fn get_chunk_size(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(config_keys::INGEST_CHUNK_SIZE, defaults::CHUNK_SIZE)
    }

    fn get_error_log_limit(&self) -> Result<usize, Box<dyn Error>> {
        let raw = self.get_config_or_default(
            config_keys::INGEST_ERROR_LOG_LIMIT,
            &defaults::ERROR_LOG_LIMIT.to_string(),
        )?;
        // 0 合法: 表示不记录行级错误
        Ok(raw.trim().parse::<usize>().unwrap_or(defaults::ERROR_LOG_LIMIT))
    }

    fn get_progress_interval(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(config_keys::INGEST_PROGRESS_INTERVAL, defaults::PROGRESS_INTERVAL)
    }

    fn get_ingest_mode(&self) -> Result<IngestMode, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::INGEST_MODE, "STANDARD")?;
        Ok(IngestMode::parse(&raw).unwrap_or_else(|| {
            warn!(value = %raw, "未知入库模式，使用 STANDARD");
            IngestMode::Standard
        }))
    }

    fn get_report_layout(&self) -> Result<ReportLayout, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::REPORT_LAYOUT, "SINGLE_SHEET")?;
        Ok(ReportLayout::parse(&raw).unwrap_or(ReportLayout::SingleSheet))
    }

    fn get_report_locale(&self) -> Result<String, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::REPORT_LOCALE, defaults::REPORT_LOCALE)?;
        let trimmed = raw.trim();
        Ok(if trimmed.is_empty() {
            defaults::REPORT_LOCALE.to_string()
        } else {
            trimmed.to_string()
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const INGEST_CHUNK_SIZE: &str = "ingest_chunk_size";
    pub const INGEST_ERROR_LOG_LIMIT: &str = "ingest_error_log_limit";
    pub const INGEST_PROGRESS_INTERVAL: &str = "ingest_progress_interval";
    pub const INGEST_MODE: &str = "ingest_mode";

    // 报表
    pub const REPORT_LAYOUT: &str = "report_layout";
    pub const REPORT_LOCALE: &str = "report_locale";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const CHUNK_SIZE: usize = 5_000;
    pub const ERROR_LOG_LIMIT: usize = 5;
    pub const PROGRESS_INTERVAL: usize = 10_000;
    pub const REPORT_LOCALE: &str = "es";
}
