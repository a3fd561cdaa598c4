// ==========================================
// 采收计件结算系统 - 结算仓储
// ==========================================
// 对齐: settlements 表
// 红线: 结算集合只做整体删除 + 重建,不做局部更新
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{PriceRule, SettlementRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::price_rule_repo::{insert_rule, validate_rule};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "worker_name, settle_date, label, unit_price, piece_count, piece_cost, \
     hourly_rate, hour_count, hourly_cost";

fn map_settlement_row(row: &Row<'_>) -> rusqlite::Result<SettlementRecord> {
    Ok(SettlementRecord {
        worker_name: row.get(0)?,
        settle_date: row.get::<_, NaiveDate>(1)?,
        label: row.get(2)?,
        unit_price: row.get(3)?,
        piece_count: row.get(4)?,
        piece_cost: row.get(5)?,
        hourly_rate: row.get(6)?,
        hour_count: row.get(7)?,
        hourly_cost: row.get(8)?,
    })
}

fn insert_records(tx: &Transaction<'_>, records: &[SettlementRecord]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO settlements (settlement_id, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        SELECT_COLUMNS
    ))?;
    let mut count = 0;
    for record in records {
        count += stmt.execute(params![
            Uuid::new_v4().to_string(),
            record.worker_name,
            record.settle_date.format("%Y-%m-%d").to_string(),
            record.label,
            record.unit_price,
            record.piece_count,
            record.piece_cost,
            record.hourly_rate,
            record.hour_count,
            record.hourly_cost,
        ])?;
    }
    Ok(count)
}

/// 整体重建的写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub inserted: usize,
    pub rules_persisted: usize,
}

pub struct SettlementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettlementRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 删除全部结算记录
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM settlements", [])?)
    }

    /// 批量写入（单事务）
    pub fn insert_batch(&self, records: &[SettlementRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let count = insert_records(&tx, records)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 整体重建: 删除全部结算后写入新集合（单事务）
    ///
    /// # 参数
    /// - records: 新的结算集合
    /// - bootstrapped: 本次由默认价引导出的通用规则,与结算同事务写入
    ///
    /// # 返回
    /// - Ok(ReplaceOutcome)
    /// - Err: 任一写入失败,事务回滚（旧结算保留,规则不落库）
    pub fn replace_all(
        &self,
        records: &[SettlementRecord],
        bootstrapped: &[PriceRule],
    ) -> RepositoryResult<ReplaceOutcome> {
        for rule in bootstrapped {
            validate_rule(rule)?;
            if !rule.is_general() {
                return Err(RepositoryError::ValidationError(format!(
                    "仅允许引导通用规则: {}",
                    rule.container_type
                )));
            }
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute("DELETE FROM settlements", [])?;
        for rule in bootstrapped {
            insert_rule(&tx, rule)?;
        }
        let inserted = insert_records(&tx, records)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(ReplaceOutcome {
            deleted,
            inserted,
            rules_persisted: bootstrapped.len(),
        })
    }

    /// 按工人查询（日期升序）
    pub fn find_by_worker(&self, worker_name: &str) -> RepositoryResult<Vec<SettlementRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM settlements WHERE worker_name = ?1 ORDER BY settle_date, label",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![worker_name], map_settlement_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 全部结算（工人、日期升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<SettlementRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM settlements ORDER BY worker_name, settle_date, label",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([], map_settlement_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
