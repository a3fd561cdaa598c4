use super::core::{execute_insert, insert_sql, DeliveryRepository};
use crate::db::DELIVERY_COLUMNS;
use crate::domain::{ContainerSummary, DeliveryRecord, DeliveryRollup, IngestMode};
use crate::repository::delivery_store::{DeliveryStore, StagingStore};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

fn staging_error(step: &str, err: rusqlite::Error) -> RepositoryError {
    RepositoryError::StagingError {
        step: step.to_string(),
        message: err.to_string(),
    }
}

// ==========================================
// StagedDeliveryRepository - 批量复制实现
// ==========================================
// 读路径与标准实现一致,写路径额外提供暂存区能力
pub struct StagedDeliveryRepository {
    inner: DeliveryRepository,
}

impl StagedDeliveryRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        Ok(Self {
            inner: DeliveryRepository::new(db_path)?,
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            inner: DeliveryRepository::from_connection(conn),
        }
    }

    /// 暂存区当前行数
    pub fn staged_count(&self) -> RepositoryResult<i64> {
        let conn = self.inner.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM delivery_staging", [], |row| row.get(0))?;
        Ok(n)
    }
}

impl DeliveryStore for StagedDeliveryRepository {
    fn delete_all(&self) -> RepositoryResult<usize> {
        self.inner.delete_all()
    }

    fn insert_batch(&self, records: &[DeliveryRecord]) -> RepositoryResult<usize> {
        self.inner.insert_batch(records)
    }

    fn count(&self) -> RepositoryResult<i64> {
        self.inner.count()
    }

    fn container_summary(&self) -> RepositoryResult<Vec<ContainerSummary>> {
        self.inner.container_summary()
    }

    fn worker_names(&self) -> RepositoryResult<Vec<String>> {
        self.inner.worker_names()
    }

    fn rollup(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<DeliveryRollup>> {
        self.inner.rollup(start, end)
    }

    fn mode(&self) -> IngestMode {
        IngestMode::Staged
    }

    fn staging(&self) -> Option<&dyn StagingStore> {
        Some(self)
    }
}

impl StagingStore for StagedDeliveryRepository {
    fn clear_staging(&self) -> RepositoryResult<usize> {
        let conn = self.inner.get_conn()?;
        let rows = conn
            .execute("DELETE FROM delivery_staging", [])
            .map_err(|e| staging_error("clear", e))?;
        debug!(rows = rows, "暂存区已清空");
        Ok(rows)
    }

    fn copy_into_staging(&self, records: &[DeliveryRecord]) -> RepositoryResult<usize> {
        let mut conn = self.inner.get_conn()?;
        let tx = conn.transaction().map_err(|e| staging_error("copy", e))?;

        let mut copied = 0;
        {
            let mut stmt = tx
                .prepare(&insert_sql("delivery_staging"))
                .map_err(|e| staging_error("copy", e))?;
            for record in records {
                copied += execute_insert(&mut stmt, record).map_err(|e| staging_error("copy", e))?;
            }
        }

        tx.commit().map_err(|e| staging_error("copy", e))?;
        debug!(rows = copied, "批量复制到暂存区完成");
        Ok(copied)
    }

    fn consolidate_staging(&self) -> RepositoryResult<usize> {
        let mut conn = self.inner.get_conn()?;
        let tx = conn.transaction().map_err(|e| staging_error("consolidate", e))?;

        tx.execute("DELETE FROM deliveries", [])
            .map_err(|e| staging_error("consolidate", e))?;
        let moved = tx
            .execute(
                &format!(
                    "INSERT INTO deliveries (id, {cols}) SELECT id, {cols} FROM delivery_staging",
                    cols = DELIVERY_COLUMNS
                ),
                [],
            )
            .map_err(|e| staging_error("consolidate", e))?;
        tx.execute("DELETE FROM delivery_staging", [])
            .map_err(|e| staging_error("consolidate", e))?;

        tx.commit().map_err(|e| staging_error("consolidate", e))?;
        info!(rows = moved, "暂存区合并完成");
        Ok(moved)
    }
}
