// ==========================================
// 采收计件结算系统 - 导入接口定义
// ==========================================
// 职责: 定义导入管线各组件的 trait（不包含实现）
// ==========================================

use crate::importer::bulk_loader::LoadOutcome;
use crate::importer::error::ImportResult;

// ==========================================
// FileParser Trait - 文件解析
// ==========================================
// 实现者: ExcelParser / CsvParser
pub trait FileParser: Send + Sync {
    /// 按行流式遍历原始单元格
    ///
    /// # 参数
    /// - data: 文件内容（内存字节）
    /// - visit: 回调 (0 起始的绝对行索引, 单元格文本)；回调返回错误时中止遍历
    ///
    /// # 返回
    /// - Ok(rows): 遍历的行数
    fn for_each_row(
        &self,
        data: &[u8],
        visit: &mut dyn FnMut(usize, Vec<String>) -> ImportResult<()>,
    ) -> ImportResult<usize>;
}

// ==========================================
// DeliveryImporter Trait - 交付导入
// ==========================================
pub trait DeliveryImporter: Send + Sync {
    /// 标准通道: 逐块事务写入
    fn process_upload(&self, data: &[u8], filename: &str) -> ImportResult<LoadOutcome>;

    /// 暂存通道: 全量缓冲 → 批量复制 → 合并
    fn process_upload_staged(&self, data: &[u8], filename: &str) -> ImportResult<LoadOutcome>;
}
