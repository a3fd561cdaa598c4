// ==========================================
// 采收计件结算系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建表脚本（主表 / 暂存表 / 价格 / 结算 / 配置）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 交付表列清单（主表与暂存表共用，顺序即插入顺序）
pub const DELIVERY_COLUMNS: &str = "harvest_id, harvest_name, field_name, field_code, field_tags, \
     crop_block, crop_block_code, crop_block_tags, species, variety, \
     registered_on, registered_time, worker_name, worker_id, \
     contractor, contractor_id, contractor_tags, \
     container_type, container_count, actual_weight, theoretical_weight, \
     recorded_by, recorded_by_id, crew, credential_code, container_code";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS deliveries (
    id TEXT PRIMARY KEY,
    harvest_id TEXT NOT NULL,
    harvest_name TEXT NOT NULL,
    field_name TEXT NOT NULL,
    field_code TEXT NOT NULL,
    field_tags TEXT,
    crop_block TEXT NOT NULL,
    crop_block_code TEXT,
    crop_block_tags TEXT,
    species TEXT NOT NULL,
    variety TEXT NOT NULL,
    registered_on TEXT NOT NULL,
    registered_time TEXT,
    worker_name TEXT NOT NULL,
    worker_id TEXT NOT NULL,
    contractor TEXT,
    contractor_id TEXT,
    contractor_tags TEXT,
    container_type TEXT NOT NULL,
    container_count INTEGER NOT NULL DEFAULT 0 CHECK (container_count >= 0),
    actual_weight REAL NOT NULL DEFAULT 0,
    theoretical_weight REAL NOT NULL DEFAULT 0,
    recorded_by TEXT NOT NULL,
    recorded_by_id TEXT NOT NULL,
    crew TEXT,
    credential_code TEXT,
    container_code TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_deliveries_worker_date ON deliveries (worker_name, registered_on);
CREATE INDEX IF NOT EXISTS idx_deliveries_container ON deliveries (container_type);

CREATE TABLE IF NOT EXISTS delivery_staging (
    id TEXT,
    harvest_id TEXT,
    harvest_name TEXT,
    field_name TEXT,
    field_code TEXT,
    field_tags TEXT,
    crop_block TEXT,
    crop_block_code TEXT,
    crop_block_tags TEXT,
    species TEXT,
    variety TEXT,
    registered_on TEXT,
    registered_time TEXT,
    worker_name TEXT,
    worker_id TEXT,
    contractor TEXT,
    contractor_id TEXT,
    contractor_tags TEXT,
    container_type TEXT,
    container_count INTEGER,
    actual_weight REAL,
    theoretical_weight REAL,
    recorded_by TEXT,
    recorded_by_id TEXT,
    crew TEXT,
    credential_code TEXT,
    container_code TEXT
);

CREATE TABLE IF NOT EXISTS price_rules (
    price_rule_id TEXT PRIMARY KEY,
    container_type TEXT NOT NULL,
    price REAL NOT NULL CHECK (price >= 0),
    crop_block TEXT,
    species TEXT,
    variety TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_price_rules_container ON price_rules (container_type, active);

CREATE TABLE IF NOT EXISTS settlements (
    settlement_id TEXT PRIMARY KEY,
    worker_name TEXT NOT NULL,
    settle_date TEXT NOT NULL,
    label TEXT NOT NULL,
    unit_price REAL NOT NULL,
    piece_count INTEGER NOT NULL,
    piece_cost REAL NOT NULL,
    hourly_rate REAL,
    hour_count REAL,
    hourly_cost REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_settlements_worker ON settlements (worker_name, settle_date);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    if read_schema_version(conn)?.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_delivery_columns_exist_in_both_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        for table in ["deliveries", "delivery_staging"] {
            let sql = format!("SELECT {} FROM {} LIMIT 0", DELIVERY_COLUMNS, table);
            assert!(conn.prepare(&sql).is_ok(), "{} 缺少列", table);
        }
    }
}
