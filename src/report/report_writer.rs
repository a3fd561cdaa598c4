// ==========================================
// 采收计件结算系统 - 报表生成
// ==========================================
// 职责: 结算记录 → xlsx 工作簿（内存缓冲,不落盘）
// 工作表:
// - 结算明细（单表,或按工人分表）
// - 容器明细（可选）
// - 汇总透视（按工人+日期重新分组）
// ==========================================

use crate::domain::{ReportLayout, SettlementRecord, WorkerDayKey};
use crate::i18n::t_in;
use crate::report::error::{ReportError, ReportResult};
use crate::report::sheet_name::SheetNamer;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// 明细表列宽
pub const DETAIL_COLUMN_WIDTH: f64 = 15.0;
/// 汇总表列宽
pub const SUMMARY_COLUMN_WIDTH: f64 = 20.0;
/// 明细表表头底色
pub const DETAIL_HEADER_FILL: u32 = 0xE6F3FF;
/// 汇总表表头底色
pub const SUMMARY_HEADER_FILL: u32 = 0xD4E6F1;
/// 汇总表中容器标签的连接符
pub const CONTAINER_SEPARATOR: &str = ", ";

const DETAIL_HEADERS: [&str; 9] = [
    "report.header.worker",
    "report.header.date",
    "report.header.container",
    "report.header.piece_price",
    "report.header.piece_count",
    "report.header.piece_cost",
    "report.header.hourly_rate",
    "report.header.hour_count",
    "report.header.hourly_cost",
];

const SUMMARY_HEADERS: [&str; 5] = [
    "report.header.worker",
    "report.header.date",
    "report.header.container",
    "report.header.total_pieces",
    "report.header.total_cost",
];

// ==========================================
// SummaryRow - 汇总透视行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub worker_name: String,
    pub date: chrono::NaiveDate,
    pub containers: Vec<String>,
    pub total_pieces: i64,
    pub total_cost: f64,
}

/// 按 (worker, date) 重新分组
///
/// 只有件数或金额大于 0 的行参与汇总；容器标签去重后排序
pub fn summarize(rows: &[SettlementRecord]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<WorkerDayKey, (BTreeSet<&str>, i64, f64)> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.piece_count > 0 || r.piece_cost > 0.0) {
        let entry = groups
            .entry(WorkerDayKey::new(&row.worker_name, row.settle_date))
            .or_default();
        entry.0.insert(row.label.as_str());
        entry.1 += row.piece_count;
        entry.2 += row.piece_cost;
    }

    groups
        .into_iter()
        .map(|(key, (labels, pieces, cost))| SummaryRow {
            worker_name: key.worker_name,
            date: key.date,
            containers: labels.into_iter().map(str::to_string).collect(),
            total_pieces: pieces,
            total_cost: cost,
        })
        .collect()
}

// ==========================================
// ReportWriter
// ==========================================
pub struct ReportWriter {
    locale: String,
    layout: ReportLayout,
}

impl ReportWriter {
    /// # 参数
    /// - locale: 表头语言（"es" / "zh-CN"）
    /// - layout: 单表或按工人分表
    pub fn new(locale: &str, layout: ReportLayout) -> Self {
        Self {
            locale: locale.to_string(),
            layout,
        }
    }

    fn label(&self, key: &str) -> String {
        t_in(&self.locale, key)
    }

    fn header_format(fill: u32) -> Format {
        Format::new()
            .set_bold()
            .set_background_color(Color::RGB(fill))
            .set_pattern(FormatPattern::Solid)
    }

    /// 生成工作簿字节
    ///
    /// # 参数
    /// - settlements: 结算记录（已按工人、日期排序）
    /// - details: 可选的按容器明细行；提供时汇总表以其为数据源
    ///
    /// # 返回
    /// - Ok(bytes): xlsx 内容
    /// - Err(NoSheets): 按工人分表但没有任何结算记录
    #[instrument(skip_all, fields(settlements = settlements.len(), layout = %self.layout))]
    pub fn render(
        &self,
        settlements: &[SettlementRecord],
        details: Option<&[SettlementRecord]>,
    ) -> ReportResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let mut namer = SheetNamer::new();

        let summary_name = self.label("report.summary_sheet");
        namer.reserve(&summary_name);

        match self.layout {
            ReportLayout::SingleSheet => {
                let name = namer.unique(&self.label("report.detail_sheet"), "Sheet");
                self.write_detail_sheet(workbook.add_worksheet(), &name, settlements)?;
            }
            ReportLayout::PerWorker => {
                if settlements.is_empty() {
                    return Err(ReportError::NoSheets);
                }
                let fallback = self.label("report.worker_sheet_fallback");
                let mut by_worker: BTreeMap<&str, Vec<SettlementRecord>> = BTreeMap::new();
                for record in settlements {
                    by_worker
                        .entry(record.worker_name.as_str())
                        .or_default()
                        .push(record.clone());
                }
                for (worker, rows) in by_worker {
                    let name = namer.unique(worker, &fallback);
                    self.write_detail_sheet(workbook.add_worksheet(), &name, &rows)?;
                }
            }
        }

        if let Some(details) = details {
            let name = namer.unique(&self.label("report.breakdown_sheet"), "Sheet");
            self.write_detail_sheet(workbook.add_worksheet(), &name, details)?;
        }

        let summary_rows = summarize(details.unwrap_or(settlements));
        self.write_summary_sheet(workbook.add_worksheet(), &summary_name, &summary_rows)?;

        let bytes = workbook.save_to_buffer()?;
        debug!(bytes = bytes.len(), summary_rows = summary_rows.len(), "报表生成完成");
        Ok(bytes)
    }

    fn write_detail_sheet(
        &self,
        sheet: &mut Worksheet,
        name: &str,
        rows: &[SettlementRecord],
    ) -> ReportResult<()> {
        sheet
            .set_name(name)
            .map_err(|_| ReportError::InvalidSheetName(name.to_string()))?;

        let header = Self::header_format(DETAIL_HEADER_FILL);
        for (col, key) in DETAIL_HEADERS.iter().enumerate() {
            let col = col as u16;
            sheet.set_column_width(col, DETAIL_COLUMN_WIDTH)?;
            sheet.write_string_with_format(0, col, self.label(key), &header)?;
        }

        for (i, record) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, &record.worker_name)?;
            sheet.write_string(row, 1, record.settle_date.format("%Y-%m-%d").to_string())?;
            sheet.write_string(row, 2, &record.label)?;
            sheet.write_number(row, 3, record.unit_price)?;
            sheet.write_number(row, 4, record.piece_count as f64)?;
            sheet.write_number(row, 5, record.piece_cost)?;

            // 计时字段未使用时留空
            let hourly = [record.hourly_rate, record.hour_count, record.hourly_cost];
            for (offset, value) in hourly.into_iter().enumerate() {
                if let Some(v) = value {
                    sheet.write_number(row, 6 + offset as u16, v)?;
                }
            }
        }
        Ok(())
    }

    fn write_summary_sheet(
        &self,
        sheet: &mut Worksheet,
        name: &str,
        rows: &[SummaryRow],
    ) -> ReportResult<()> {
        sheet
            .set_name(name)
            .map_err(|_| ReportError::InvalidSheetName(name.to_string()))?;

        let header = Self::header_format(SUMMARY_HEADER_FILL);
        for (col, key) in SUMMARY_HEADERS.iter().enumerate() {
            let col = col as u16;
            sheet.set_column_width(col, SUMMARY_COLUMN_WIDTH)?;
            sheet.write_string_with_format(0, col, self.label(key), &header)?;
        }

        if rows.is_empty() {
            sheet.write_string(1, 0, self.label("report.no_data"))?;
            sheet.write_string(1, 1, self.label("report.no_data_hint"))?;
            return Ok(());
        }

        for (i, summary) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, &summary.worker_name)?;
            sheet.write_string(row, 1, summary.date.format("%Y-%m-%d").to_string())?;
            sheet.write_string(row, 2, summary.containers.join(CONTAINER_SEPARATOR))?;
            sheet.write_number(row, 3, summary.total_pieces as f64)?;
            sheet.write_number(row, 4, summary.total_cost)?;
        }
        Ok(())
    }
}
