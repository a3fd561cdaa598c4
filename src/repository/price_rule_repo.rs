// ==========================================
// 采收计件结算系统 - 价格规则仓储
// ==========================================
// 对齐: price_rules 表
// 排序: created_at DESC（同一时刻按插入顺序倒序）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::PriceRule;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PriceCatalog Trait - 价格查询能力
// ==========================================
// 结算引擎只依赖此能力,不依赖具体仓储
// 引导规则的写入随结算一起提交,见 SettlementRepository::replace_all
pub trait PriceCatalog: Send + Sync {
    /// 读取所有启用规则（created_at 降序）
    fn active_rules(&self) -> RepositoryResult<Vec<PriceRule>>;
}

const SELECT_COLUMNS: &str =
    "price_rule_id, container_type, price, crop_block, species, variety, active, created_at";

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_rule_row(row: &Row<'_>) -> rusqlite::Result<PriceRule> {
    let created_raw: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(PriceRule {
        price_rule_id: row.get(0)?,
        container_type: row.get(1)?,
        price: row.get(2)?,
        crop_block: row.get(3)?,
        species: row.get(4)?,
        variety: row.get(5)?,
        active: row.get::<_, i64>(6)? != 0,
        created_at,
    })
}

/// 规则写入前校验
pub(crate) fn validate_rule(rule: &PriceRule) -> RepositoryResult<()> {
    if !rule.price.is_finite() || rule.price < 0.0 {
        return Err(RepositoryError::FieldValueError {
            field: "price".to_string(),
            message: format!("价格必须为非负数: {}", rule.price),
        });
    }
    if rule.container_type.trim().is_empty() {
        return Err(RepositoryError::ValidationError("容器类型不能为空".to_string()));
    }
    Ok(())
}

/// 在给定连接（或事务）上写入一条规则
pub(crate) fn insert_rule(conn: &Connection, rule: &PriceRule) -> RepositoryResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO price_rules ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            SELECT_COLUMNS
        ),
        params![
            rule.price_rule_id,
            rule.container_type,
            rule.price,
            rule.crop_block,
            rule.species,
            rule.variety,
            rule.active as i64,
            format_ts(&rule.created_at),
        ],
    )?;
    Ok(())
}

// ==========================================
// PriceRuleRepository
// ==========================================
pub struct PriceRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PriceRuleRepository {
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

    /// 新建规则
    ///
    /// # 返回
    /// - Ok(price_rule_id)
    /// - Err(ValidationError): 价格为负或非有限值,或容器类型为空
    pub fn create(&self, rule: &PriceRule) -> RepositoryResult<String> {
        validate_rule(rule)?;
        let conn = self.get_conn()?;
        insert_rule(&conn, rule)?;
        Ok(rule.price_rule_id.clone())
    }

    pub fn find_by_id(&self, price_rule_id: &str) -> RepositoryResult<Option<PriceRule>> {
        let conn = self.get_conn()?;
        let rule = conn
            .query_row(
                &format!("SELECT {} FROM price_rules WHERE price_rule_id = ?1", SELECT_COLUMNS),
                params![price_rule_id],
                map_rule_row,
            )
            .optional()?;
        Ok(rule)
    }

    /// 启用规则（可按容器类型过滤）
    pub fn list_active(&self, container_type: Option<&str>) -> RepositoryResult<Vec<PriceRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM price_rules
             WHERE active = 1 AND (?1 IS NULL OR container_type = ?1)
             ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![container_type], map_rule_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 停用规则
    pub fn deactivate(&self, price_rule_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE price_rules SET active = 0 WHERE price_rule_id = ?1",
            params![price_rule_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PriceRule".to_string(),
                id: price_rule_id.to_string(),
            });
        }
        Ok(())
    }
}

impl PriceCatalog for PriceRuleRepository {
    fn active_rules(&self) -> RepositoryResult<Vec<PriceRule>> {
        self.list_active(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn base_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_create_and_find_by_id() {
        let repo = PriceRuleRepository::from_connection(setup_test_db());
        let mut rule = PriceRule::general("Bin", 2.5, base_ts());
        rule.crop_block = Some("C7".to_string());

        let id = repo.create(&rule).unwrap();
        let found = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(found, rule);
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_active_orders_newest_first_and_filters() {
        let repo = PriceRuleRepository::from_connection(setup_test_db());
        let older = PriceRule::general("Bin", 1.0, base_ts());
        let newer = PriceRule::general("Bin", 1.2, base_ts() + Duration::hours(1));
        let other = PriceRule::general("Capacho", 0.5, base_ts());
        repo.create(&older).unwrap();
        repo.create(&newer).unwrap();
        repo.create(&other).unwrap();
        repo.deactivate(&other.price_rule_id).unwrap();

        let bins = repo.list_active(Some("Bin")).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].price_rule_id, newer.price_rule_id);

        let all = repo.active_rules().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.container_type == "Bin"));
    }

    #[test]
    fn test_create_rejects_negative_price() {
        let repo = PriceRuleRepository::from_connection(setup_test_db());
        let rule = PriceRule::general("Bin", -1.0, base_ts());
        assert!(matches!(
            repo.create(&rule),
            Err(RepositoryError::FieldValueError { .. })
        ));
    }

    #[test]
    fn test_create_rejects_blank_container_type() {
        let repo = PriceRuleRepository::from_connection(setup_test_db());
        let rule = PriceRule::general("  ", 1.0, base_ts());
        assert!(matches!(
            repo.create(&rule),
            Err(RepositoryError::ValidationError(_))
        ));
    }

    #[test]
    fn test_deactivate_missing_rule() {
        let repo = PriceRuleRepository::from_connection(setup_test_db());
        assert!(matches!(
            repo.deactivate("nope"),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
