// ==========================================
// 采收计件结算系统 - 结算 API
// ==========================================
// 职责: 对外暴露导入、结算生成、查询视图
// 红线: API 层不拼 SQL,不做价格解析,只做编排与错误转换
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::SettlementConfigReader;
use crate::domain::{
    AggregatedSettlement, ContainerSummary, PriceRule, SettlementRecord, WorkerDaySummary,
};
use crate::engine::SettlementAggregator;
use crate::importer::{DeliveryImporter, LoadOutcome};
use crate::report::{suggested_filename, ReportWriter};
use crate::repository::{DeliveryStore, PriceRuleRepository, SettlementRepository};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// 结算生成响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRun {
    /// xlsx 字节（不参与 JSON 序列化）
    #[serde(skip)]
    pub report_bytes: Vec<u8>,
    /// 建议文件名: liquidaciones_<时间>.xlsx
    pub filename: String,
    pub settlement_count: usize,
    /// 价格不可解析而被排除的交付数
    pub skipped_deliveries: i64,
    /// 由默认价表引导出的新通用规则数
    pub bootstrapped_rules: usize,
    pub total_cost: f64,
}

/// 结算 API
pub struct SettlementApi {
    importer: Arc<dyn DeliveryImporter>,
    deliveries: Arc<dyn DeliveryStore>,
    prices: Arc<PriceRuleRepository>,
    settlements: Arc<SettlementRepository>,
    aggregator: SettlementAggregator,
    config: Arc<dyn SettlementConfigReader>,
}

impl SettlementApi {
    pub fn new(
        importer: Arc<dyn DeliveryImporter>,
        deliveries: Arc<dyn DeliveryStore>,
        prices: Arc<PriceRuleRepository>,
        settlements: Arc<SettlementRepository>,
        config: Arc<dyn SettlementConfigReader>,
    ) -> Self {
        let aggregator = SettlementAggregator::new(
            deliveries.clone(),
            prices.clone(),
            settlements.clone(),
        );
        Self {
            importer,
            deliveries,
            prices,
            settlements,
            aggregator,
            config,
        }
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 标准通道上传（破坏式替换）
    ///
    /// # 返回
    /// - Ok(LoadOutcome): 插入数 / 错误数
    /// - Err(EmptyResult): 没有任何有效行
    pub fn process_upload(&self, data: &[u8], filename: &str) -> ApiResult<LoadOutcome> {
        check_filename(filename)?;
        Ok(self.importer.process_upload(data, filename)?)
    }

    /// 暂存通道上传（整体合并）
    ///
    /// # 返回
    /// - Err(Unavailable): 当前存储未启用暂存通道
    pub fn process_upload_staged(&self, data: &[u8], filename: &str) -> ApiResult<LoadOutcome> {
        check_filename(filename)?;
        Ok(self.importer.process_upload_staged(data, filename)?)
    }

    // ==========================================
    // 结算生成
    // ==========================================

    /// 全量重建结算并生成报表
    ///
    /// # 参数
    /// - price_overrides: 容器类型 → 默认单价
    #[instrument(skip(self, price_overrides))]
    pub fn generate_settlements(
        &self,
        price_overrides: HashMap<String, f64>,
    ) -> ApiResult<SettlementRun> {
        if let Some((container, price)) = price_overrides
            .iter()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(ApiError::InvalidInput(format!(
                "容器 {} 的默认单价无效: {}",
                container, price
            )));
        }

        let layout = self
            .config
            .get_report_layout()
            .map_err(|e| ApiError::InternalError(format!("读取报表布局失败: {}", e)))?;
        let locale = self
            .config
            .get_report_locale()
            .map_err(|e| ApiError::InternalError(format!("读取报表语言失败: {}", e)))?;

        let summary = self.aggregator.generate(price_overrides)?;
        let report_bytes = ReportWriter::new(&locale, layout)
            .render(&summary.settlements, Some(&summary.details))?;
        let filename = suggested_filename(&Local::now());

        info!(
            filename = %filename,
            settlements = summary.settlement_count,
            skipped = summary.skipped_deliveries,
            "结算报表已生成"
        );

        Ok(SettlementRun {
            report_bytes,
            filename,
            settlement_count: summary.settlement_count,
            skipped_deliveries: summary.skipped_deliveries,
            bootstrapped_rules: summary.bootstrapped_rules,
            total_cost: summary.total_cost,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 各容器类型出现次数（两种存储实现均可用）
    pub fn get_container_summary(&self) -> ApiResult<Vec<ContainerSummary>> {
        Ok(self.deliveries.container_summary()?)
    }

    pub fn get_settlements_for_worker(
        &self,
        worker_name: &str,
    ) -> ApiResult<Vec<SettlementRecord>> {
        let worker_name = worker_name.trim();
        if worker_name.is_empty() {
            return Err(ApiError::InvalidInput("工人姓名不能为空".to_string()));
        }
        Ok(self.settlements.find_by_worker(worker_name)?)
    }

    /// 去重后的工人姓名（升序）
    pub fn get_workers(&self) -> ApiResult<Vec<String>> {
        Ok(self.deliveries.worker_names()?)
    }

    /// 按日/工人/容器的结算视图（仅暂存通道可用）
    pub fn get_aggregated_settlements(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Vec<AggregatedSettlement>> {
        self.require_views(start, end)?;
        Ok(self.aggregator.aggregated_view(start, end)?)
    }

    /// 按日/工人的汇总视图（仅暂存通道可用）
    pub fn get_worker_summary(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Vec<WorkerDaySummary>> {
        self.require_views(start, end)?;
        Ok(self.aggregator.worker_summary(start, end)?)
    }

    fn require_views(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
        if self.deliveries.staging().is_none() {
            return Err(ApiError::Unavailable(
                "聚合视图需要暂存批量通道（ingest_mode=STAGED）".to_string(),
            ));
        }
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ApiError::InvalidInput(format!(
                    "起始日期 {} 晚于结束日期 {}",
                    s, e
                )));
            }
        }
        Ok(())
    }

    // ==========================================
    // 价格目录
    // ==========================================

    /// 启用的价格规则（created_at 降序）
    pub fn list_price_rules(&self, container_type: Option<&str>) -> ApiResult<Vec<PriceRule>> {
        Ok(self.prices.list_active(container_type)?)
    }

    /// 新增价格规则
    ///
    /// # 返回
    /// - Ok(price_rule_id)
    pub fn create_price_rule(&self, rule: &PriceRule) -> ApiResult<String> {
        Ok(self.prices.create(rule)?)
    }

    /// 停用价格规则
    pub fn deactivate_price_rule(&self, price_rule_id: &str) -> ApiResult<()> {
        Ok(self.prices.deactivate(price_rule_id)?)
    }
}

fn check_filename(filename: &str) -> ApiResult<()> {
    if filename.trim().is_empty() {
        return Err(ApiError::InvalidInput("文件名不能为空".to_string()));
    }
    Ok(())
}
