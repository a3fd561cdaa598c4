// ==========================================
// 采收计件结算系统 - 交付存储端口
// ==========================================
// 两种实现,由配置 ingest_mode 选择:
// - DeliveryRepository:        标准事务写入（逐块提交）
// - StagedDeliveryRepository:  批量复制到暂存区 + 整体合并
// 业务逻辑（分块、解析、结算）不随实现重复
// ==========================================

use crate::domain::{ContainerSummary, DeliveryRecord, DeliveryRollup, IngestMode};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;

// ==========================================
// DeliveryStore Trait - 交付数据存取
// ==========================================
pub trait DeliveryStore: Send + Sync {
    /// 删除全部交付记录（破坏式替换的第一步）
    ///
    /// # 返回
    /// - Ok(rows): 删除的行数
    fn delete_all(&self) -> RepositoryResult<usize>;

    /// 以单个事务写入一块记录（全成功或全失败）
    fn insert_batch(&self, records: &[DeliveryRecord]) -> RepositoryResult<usize>;

    /// 当前记录数
    fn count(&self) -> RepositoryResult<i64>;

    /// 各容器类型出现次数（按容器类型排序）
    fn container_summary(&self) -> RepositoryResult<Vec<ContainerSummary>>;

    /// 去重后的工人姓名（升序）
    fn worker_names(&self) -> RepositoryResult<Vec<String>>;

    /// 原始 SQL 预聚合
    ///
    /// # 参数
    /// - start / end: 闭区间日期边界,None 表示不限
    fn rollup(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<DeliveryRollup>>;

    /// 当前实现对应的入库模式
    fn mode(&self) -> IngestMode;

    /// 批量复制能力（仅暂存实现提供）
    fn staging(&self) -> Option<&dyn StagingStore> {
        None
    }
}

// ==========================================
// StagingStore Trait - 暂存区能力
// ==========================================
// 对应服务端过程: clear-staging / consolidate-staging
pub trait StagingStore: Send + Sync {
    /// 清空暂存区
    fn clear_staging(&self) -> RepositoryResult<usize>;

    /// 批量复制（单事务 + 单条预编译语句,无逐行事务开销）
    fn copy_into_staging(&self, records: &[DeliveryRecord]) -> RepositoryResult<usize>;

    /// 合并暂存区到主表（整体成功或整体回滚）
    ///
    /// # 返回
    /// - Ok(rows): 实际合并的行数
    fn consolidate_staging(&self) -> RepositoryResult<usize>;
}
