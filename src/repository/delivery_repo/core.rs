use crate::db::{open_sqlite_connection, DELIVERY_COLUMNS};
use crate::domain::{ContainerSummary, DeliveryRecord, DeliveryRollup, IngestMode};
use crate::repository::delivery_store::DeliveryStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row, Statement};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 时刻按补零的 HH:MM:SS 存储,字符串比较即时间比较
const TIME_FORMAT: &str = "%H:%M:%S";

/// 写入一条交付记录（主表与暂存表共用同一列序）
pub(super) fn execute_insert(
    stmt: &mut Statement<'_>,
    record: &DeliveryRecord,
) -> rusqlite::Result<usize> {
    stmt.execute(params![
        Uuid::new_v4().to_string(),
        record.harvest_id,
        record.harvest_name,
        record.field_name,
        record.field_code,
        record.field_tags,
        record.crop_block,
        record.crop_block_code,
        record.crop_block_tags,
        record.species,
        record.variety,
        record.registered_on.format("%Y-%m-%d").to_string(),
        record.registered_time.map(|t| t.format(TIME_FORMAT).to_string()),
        record.worker_name,
        record.worker_id,
        record.contractor,
        record.contractor_id,
        record.contractor_tags,
        record.container_type,
        record.container_count.max(0),
        record.actual_weight,
        record.theoretical_weight,
        record.recorded_by,
        record.recorded_by_id,
        record.crew,
        record.credential_code,
        record.container_code,
    ])
}

/// 生成 INSERT 语句（27 个占位符: id + 26 个业务列）
pub(super) fn insert_sql(table: &str) -> String {
    let placeholders = vec!["?"; 27].join(", ");
    format!("INSERT INTO {} (id, {}) VALUES ({})", table, DELIVERY_COLUMNS, placeholders)
}

fn map_rollup_row(row: &Row<'_>) -> rusqlite::Result<DeliveryRollup> {
    let field_name: String = row.get(7)?;
    Ok(DeliveryRollup {
        date: row.get::<_, NaiveDate>(0)?,
        worker_name: row.get(1)?,
        worker_id: row.get(2)?,
        container_type: row.get(3)?,
        crop_block: row.get(4)?,
        species: row.get(5)?,
        variety: row.get(6)?,
        field_names: if field_name.is_empty() {
            Vec::new()
        } else {
            vec![field_name]
        },
        record_count: row.get(8)?,
        total_count: row.get(9)?,
        first_time: row.get::<_, Option<NaiveTime>>(10)?,
        last_time: row.get::<_, Option<NaiveTime>>(11)?,
    })
}

// ==========================================
// DeliveryRepository - 标准事务写入实现
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct DeliveryRepository {
    pub(super) conn: Arc<Mutex<Connection>>,
}

impl DeliveryRepository {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl DeliveryStore for DeliveryRepository {
    fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM deliveries", [])?;
        Ok(rows)
    }

    fn insert_batch(&self, records: &[DeliveryRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(&insert_sql("deliveries"))?;
            for record in records {
                count += execute_insert(&mut stmt, record)?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM deliveries", [], |row| row.get(0))?;
        Ok(n)
    }

    fn container_summary(&self) -> RepositoryResult<Vec<ContainerSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT container_type, COUNT(*) FROM deliveries GROUP BY container_type ORDER BY container_type",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ContainerSummary {
                container_type: row.get(0)?,
                occurrences: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn worker_names(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT worker_name FROM deliveries WHERE worker_name <> '' ORDER BY worker_name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn rollup(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<DeliveryRollup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT registered_on, worker_name, MIN(worker_id),
                   container_type, crop_block, species, variety, field_name,
                   COUNT(*), COALESCE(SUM(container_count), 0),
                   MIN(registered_time), MAX(registered_time)
            FROM deliveries
            WHERE (?1 IS NULL OR registered_on >= ?1)
              AND (?2 IS NULL OR registered_on <= ?2)
            GROUP BY registered_on, worker_name, container_type,
                     crop_block, species, variety, field_name
            ORDER BY worker_name, registered_on, container_type
            "#,
        )?;

        let start = start.map(|d| d.format("%Y-%m-%d").to_string());
        let end = end.map(|d| d.format("%Y-%m-%d").to_string());
        let rows = stmt.query_map(params![start, end], map_rollup_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn mode(&self) -> IngestMode {
        IngestMode::Standard
    }
}
