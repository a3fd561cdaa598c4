// ==========================================
// 采收计件结算系统 - 结算聚合引擎
// ==========================================
// 职责: 交付预聚合行 → 价格解析 → 工人单日结算
// 输入: DeliveryRollup 列表 + 价格规则快照 + 默认价表
// 输出: SettlementRecord（按工人、日期排序）+ 按容器明细
// ==========================================
// 红线: 不可解析价格的交付被跳过并计数,不中断整体
// 红线: 结算集合整体重建（无条件删除后写入）
// ==========================================

use crate::domain::{
    AggregatedSettlement, DeliveryRollup, PriceContext, PriceRule, SettlementRecord,
    WorkerDayContainerKey, WorkerDayKey, WorkerDaySummary, TOTAL_LABEL,
};
use crate::engine::price_resolver::PriceResolver;
use crate::repository::{DeliveryStore, PriceCatalog, RepositoryResult, SettlementRepository};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// 累加器
// ==========================================

#[derive(Debug, Default)]
struct CostAccumulator {
    pieces: i64,
    cost: f64,
    last_price: f64,
}

impl CostAccumulator {
    fn add(&mut self, pieces: i64, price: f64) {
        self.pieces += pieces;
        self.cost += pieces as f64 * price;
        self.last_price = price;
    }

    /// 聚合粒度上的单价: cost / pieces（pieces 为 0 时取解析单价）
    fn unit_price(&self) -> f64 {
        if self.pieces > 0 {
            self.cost / self.pieces as f64
        } else {
            self.last_price
        }
    }

    fn into_record(self, key: &WorkerDayKey, label: &str) -> SettlementRecord {
        SettlementRecord {
            worker_name: key.worker_name.clone(),
            settle_date: key.date,
            label: label.to_string(),
            unit_price: self.unit_price(),
            piece_count: self.pieces,
            piece_cost: self.cost,
            hourly_rate: None,
            hour_count: None,
            hourly_cost: None,
        }
    }
}

#[derive(Debug, Default)]
struct ViewAccumulator {
    worker_id: Option<String>,
    records: i64,
    totals: CostAccumulator,
    first_time: Option<NaiveTime>,
    last_time: Option<NaiveTime>,
    field_names: BTreeSet<String>,
    crop_blocks: BTreeSet<String>,
    container_types: BTreeSet<String>,
}

impl ViewAccumulator {
    fn add(&mut self, row: &DeliveryRollup, price: f64) {
        if self.worker_id.as_deref().map_or(true, |id| row.worker_id.as_str() < id) {
            self.worker_id = Some(row.worker_id.clone());
        }
        self.records += row.record_count;
        self.totals.add(row.total_count, price);
        self.first_time = earliest(self.first_time, row.first_time);
        self.last_time = self.last_time.max(row.last_time);
        self.field_names.extend(row.field_names.iter().cloned());
        if !row.crop_block.is_empty() {
            self.crop_blocks.insert(row.crop_block.clone());
        }
        self.container_types.insert(row.container_type.clone());
    }
}

fn earliest(current: Option<NaiveTime>, candidate: Option<NaiveTime>) -> Option<NaiveTime> {
    match (current, candidate) {
        (Some(c), Some(n)) => Some(c.min(n)),
        (c, n) => c.or(n),
    }
}

fn context_of(row: &DeliveryRollup) -> PriceContext<'_> {
    PriceContext::new(&row.container_type, &row.crop_block, &row.species, &row.variety)
}

// ==========================================
// AggregationOutcome - 纯聚合结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    /// 每个 (worker, date) 一条,标签为 "Total"
    pub settlements: Vec<SettlementRecord>,
    /// 每个 (worker, date, container) 一条,标签为容器类型
    pub details: Vec<SettlementRecord>,
    /// 因价格不可解析而跳过的交付数
    pub skipped_deliveries: i64,
    /// 本次由默认价引导出的通用规则
    pub bootstrapped: Vec<PriceRule>,
    pub total_cost: f64,
}

/// 将预聚合行折叠为结算记录
///
/// # 参数
/// - rollups: 交付预聚合行（任意顺序）
/// - resolver: 本次请求的价格解析器
///
/// # 返回
/// 结算与明细均按 (worker, date[, container]) 升序
pub fn fold_settlements(
    rollups: &[DeliveryRollup],
    resolver: &mut PriceResolver,
) -> AggregationOutcome {
    let mut totals: BTreeMap<WorkerDayKey, CostAccumulator> = BTreeMap::new();
    let mut details: BTreeMap<WorkerDayContainerKey, CostAccumulator> = BTreeMap::new();
    let mut skipped_deliveries = 0;

    for row in rollups {
        let Some(price) = resolver.resolve(&context_of(row)).price() else {
            debug!(
                worker = %row.worker_name,
                container_type = %row.container_type,
                crop_block = %row.crop_block,
                deliveries = row.record_count,
                "价格不可解析,跳过交付"
            );
            skipped_deliveries += row.record_count;
            continue;
        };

        let detail_key =
            WorkerDayContainerKey::new(&row.worker_name, row.date, &row.container_type);
        totals
            .entry(detail_key.worker_day())
            .or_default()
            .add(row.total_count, price);
        details.entry(detail_key).or_default().add(row.total_count, price);
    }

    let settlements: Vec<SettlementRecord> = totals
        .into_iter()
        .map(|(key, acc)| acc.into_record(&key, TOTAL_LABEL))
        .collect();
    let details = details
        .into_iter()
        .map(|(key, acc)| {
            let label = key.container_type.clone();
            acc.into_record(&key.worker_day(), &label)
        })
        .collect();
    let total_cost = settlements.iter().map(|s| s.piece_cost).sum();

    AggregationOutcome {
        settlements,
        details,
        skipped_deliveries,
        bootstrapped: resolver.bootstrapped().to_vec(),
        total_cost,
    }
}

/// 按 (day, worker, container) 聚合的只读视图
pub fn fold_aggregated_view(
    rollups: &[DeliveryRollup],
    resolver: &mut PriceResolver,
) -> Vec<AggregatedSettlement> {
    let mut groups: BTreeMap<(NaiveDate, String, String), ViewAccumulator> = BTreeMap::new();

    for row in rollups {
        if let Some(price) = resolver.resolve(&context_of(row)).price() {
            groups
                .entry((row.date, row.worker_name.clone(), row.container_type.clone()))
                .or_default()
                .add(row, price);
        }
    }

    groups
        .into_iter()
        .map(|((day, worker_name, container_type), acc)| AggregatedSettlement {
            day,
            worker_id: acc.worker_id.unwrap_or_default(),
            worker_name,
            container_type,
            record_count: acc.records,
            total_count: acc.totals.pieces,
            average_price: acc.totals.unit_price(),
            total_cost: acc.totals.cost,
            first_time: acc.first_time,
            last_time: acc.last_time,
            field_names: acc.field_names.into_iter().collect(),
            crop_blocks: acc.crop_blocks.into_iter().collect(),
        })
        .collect()
}

/// 按 (day, worker) 汇总的只读视图
pub fn fold_worker_summary(
    rollups: &[DeliveryRollup],
    resolver: &mut PriceResolver,
) -> Vec<WorkerDaySummary> {
    let mut groups: BTreeMap<(NaiveDate, String), ViewAccumulator> = BTreeMap::new();

    for row in rollups {
        if let Some(price) = resolver.resolve(&context_of(row)).price() {
            groups
                .entry((row.date, row.worker_name.clone()))
                .or_default()
                .add(row, price);
        }
    }

    groups
        .into_iter()
        .map(|((day, worker_name), acc)| WorkerDaySummary {
            day,
            worker_id: acc.worker_id.unwrap_or_default(),
            worker_name,
            container_types: acc.container_types.len(),
            total_pieces: acc.totals.pieces,
            total_cost: acc.totals.cost,
            first_time: acc.first_time,
            last_time: acc.last_time,
        })
        .collect()
}

// ==========================================
// GenerationSummary - 一次生成的结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub settlement_count: usize,
    pub skipped_deliveries: i64,
    pub bootstrapped_rules: usize,
    pub total_cost: f64,
    #[serde(skip)]
    pub settlements: Vec<SettlementRecord>,
    #[serde(skip)]
    pub details: Vec<SettlementRecord>,
}

// ==========================================
// SettlementAggregator - 结算聚合引擎
// ==========================================
pub struct SettlementAggregator {
    deliveries: Arc<dyn DeliveryStore>,
    catalog: Arc<dyn PriceCatalog>,
    settlements: Arc<SettlementRepository>,
}

impl SettlementAggregator {
    pub fn new(
        deliveries: Arc<dyn DeliveryStore>,
        catalog: Arc<dyn PriceCatalog>,
        settlements: Arc<SettlementRepository>,
    ) -> Self {
        Self {
            deliveries,
            catalog,
            settlements,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 全量重建结算
    ///
    /// # 参数
    /// - price_overrides: 容器类型 → 默认单价（价格解析第 5 步）
    ///
    /// # 返回
    /// 新生成的结算集合及计数
    #[instrument(skip(self, price_overrides), fields(overrides = price_overrides.len()))]
    pub fn generate(
        &self,
        price_overrides: HashMap<String, f64>,
    ) -> RepositoryResult<GenerationSummary> {
        let rollups = self.deliveries.rollup(None, None)?;
        let mut resolver = PriceResolver::new(self.catalog.active_rules()?, price_overrides);
        let outcome = fold_settlements(&rollups, &mut resolver);

        // 引导规则与结算同一事务写入: 任一失败则整体回滚
        let replaced = self
            .settlements
            .replace_all(&outcome.settlements, &outcome.bootstrapped)?;

        info!(
            deleted = replaced.deleted,
            inserted = replaced.inserted,
            skipped_deliveries = outcome.skipped_deliveries,
            bootstrapped = replaced.rules_persisted,
            total_cost = outcome.total_cost,
            "结算生成完成"
        );

        Ok(GenerationSummary {
            settlement_count: replaced.inserted,
            skipped_deliveries: outcome.skipped_deliveries,
            bootstrapped_rules: replaced.rules_persisted,
            total_cost: outcome.total_cost,
            settlements: outcome.settlements,
            details: outcome.details,
        })
    }

    /// 按日/工人/容器的结算视图（只读解析,不引导默认价）
    pub fn aggregated_view(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<AggregatedSettlement>> {
        let rollups = self.deliveries.rollup(start, end)?;
        let mut resolver = PriceResolver::read_only(self.catalog.active_rules()?);
        Ok(fold_aggregated_view(&rollups, &mut resolver))
    }

    /// 按日/工人的汇总视图
    pub fn worker_summary(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<WorkerDaySummary>> {
        let rollups = self.deliveries.rollup(start, end)?;
        let mut resolver = PriceResolver::read_only(self.catalog.active_rules()?);
        Ok(fold_worker_summary(&rollups, &mut resolver))
    }
}
