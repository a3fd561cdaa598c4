// ==========================================
// 采收计件结算系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输入: 内存字节（上传内容不落盘）
// ==========================================

use crate::importer::delivery_importer_trait::FileParser;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{Data, DataRef, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;

fn excel_error(err: impl std::fmt::Display) -> ImportError {
    ImportError::ExcelParseError(err.to_string())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn for_each_row(
        &self,
        data: &[u8],
        visit: &mut dyn FnMut(usize, Vec<String>) -> ImportResult<()>,
    ) -> ImportResult<usize> {
        // 不推断表头: 第 0 行与 Excel 一样由标准化器跳过
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(data);

        // 按字节读取: 非法 UTF-8 只影响所在单元格,由行标准化按行计错
        let mut rows = 0;
        for (row_idx, result) in reader.byte_records().enumerate() {
            let record = result?;
            let cells = record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();
            visit(row_idx, cells)?;
            rows += 1;
        }
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelFlavor {
    Xlsx,
    Xls,
}

pub struct ExcelParser {
    flavor: ExcelFlavor,
}

impl ExcelParser {
    pub fn new(flavor: ExcelFlavor) -> Self {
        Self { flavor }
    }

    /// .xlsx: 逐单元格流式读取第一个工作表,按行回调
    fn stream_xlsx(
        &self,
        data: &[u8],
        visit: &mut dyn FnMut(usize, Vec<String>) -> ImportResult<()>,
    ) -> ImportResult<usize> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data)).map_err(excel_error)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| excel_error("Excel 文件无工作表"))?;
        let mut reader = workbook
            .worksheet_cells_reader(&sheet_name)
            .map_err(excel_error)?;

        let mut rows = 0;
        let mut current: Option<(usize, Vec<String>)> = None;
        while let Some(cell) = reader.next_cell().map_err(excel_error)? {
            let (row, col) = cell.get_position();
            let (row, col) = (row as usize, col as usize);

            if current.as_ref().map_or(true, |(r, _)| *r != row) {
                if let Some((r, cells)) = current.take() {
                    visit(r, cells)?;
                    rows += 1;
                }
                current = Some((row, Vec::new()));
            }
            if let Some((_, cells)) = current.as_mut() {
                // 已用区域可能不从 A 列开始: 按绝对列位置放置
                if cells.len() <= col {
                    cells.resize(col + 1, String::new());
                }
                cells[col] = data_ref_to_string(cell.get_value());
            }
        }
        if let Some((r, cells)) = current {
            visit(r, cells)?;
            rows += 1;
        }
        Ok(rows)
    }

    /// .xls: BIFF 格式只能整表读取
    fn read_xls(
        &self,
        data: &[u8],
        visit: &mut dyn FnMut(usize, Vec<String>) -> ImportResult<()>,
    ) -> ImportResult<usize> {
        let mut workbook: Xls<_> = Xls::new(Cursor::new(data)).map_err(excel_error)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| excel_error("Excel 文件无工作表"))?
            .map_err(excel_error)?;

        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = 0;
        for (offset, row) in range.rows().enumerate() {
            let mut cells = vec![String::new(); start_col];
            cells.extend(row.iter().map(cell_to_string));
            visit(start_row + offset, cells)?;
            rows += 1;
        }
        Ok(rows)
    }
}

impl FileParser for ExcelParser {
    fn for_each_row(
        &self,
        data: &[u8],
        visit: &mut dyn FnMut(usize, Vec<String>) -> ImportResult<()>,
    ) -> ImportResult<usize> {
        match self.flavor {
            ExcelFlavor::Xlsx => self.stream_xlsx(data, visit),
            ExcelFlavor::Xls => self.read_xls(data, visit),
        }
    }
}

/// 流式单元格 → 文本
///
/// 日期/时刻单元格输出 Excel 序列号,由清洗器按列解析（日期取整数部分,时刻取小数部分）
fn data_ref_to_string(cell: &DataRef<'_>) -> String {
    match cell {
        DataRef::Empty => String::new(),
        DataRef::String(s) | DataRef::DateTimeIso(s) | DataRef::DurationIso(s) => s.clone(),
        DataRef::SharedString(s) => s.to_string(),
        DataRef::Int(i) => i.to_string(),
        DataRef::Float(f) => f.to_string(),
        DataRef::Bool(b) => b.to_string(),
        DataRef::DateTime(dt) => dt.as_f64().to_string(),
        DataRef::Error(_) => String::new(),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

/// 整表单元格 → 文本（规则同上）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(_) => String::new(),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 按文件名扩展名选择解析器
    pub fn for_filename(filename: &str) -> ImportResult<Box<dyn FileParser>> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Box::new(CsvParser)),
            "xlsx" => Ok(Box::new(ExcelParser::new(ExcelFlavor::Xlsx))),
            "xls" => Ok(Box::new(ExcelParser::new(ExcelFlavor::Xls))),
            _ => Err(ImportError::UnsupportedFormat(filename.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::data_cleaner::DataCleaner;
    use chrono::NaiveTime;
    use rust_xlsxwriter::{Format, Workbook};

    fn collect_rows(parser: &dyn FileParser, data: &[u8]) -> Vec<(usize, Vec<String>)> {
        let mut rows = Vec::new();
        parser
            .for_each_row(data, &mut |idx, cells| {
                rows.push((idx, cells));
                Ok(())
            })
            .unwrap();
        rows
    }

    #[test]
    fn test_csv_parser_keeps_header_row_and_ragged_lines() {
        let data = "id,nombre\nE1,Ana\nE2\n";
        let rows = collect_rows(&CsvParser, data.as_bytes());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].1, vec!["id".to_string(), "nombre".to_string()]);
        assert_eq!(rows[2], (2, vec!["E2".to_string()]));
    }

    #[test]
    fn test_csv_parser_decodes_invalid_utf8_lossily() {
        let mut data = b"id,fecha\nE1,2024-03-01\nE2,".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b"\nE3,2024-03-02\n");

        let rows = collect_rows(&CsvParser, &data);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].1[0], "E2");
        assert_eq!(rows[2].1[1], "\u{fffd}\u{fffd}");
        assert_eq!(rows[3].1, vec!["E3".to_string(), "2024-03-02".to_string()]);
    }

    #[test]
    fn test_excel_time_cell_keeps_serial_for_cleaner() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let time_format = Format::new().set_num_format("hh:mm:ss");
        sheet.write_string(0, 0, "hora").unwrap();
        sheet
            .write_number_with_format(1, 11, 0.35069444, &time_format)
            .unwrap();
        let data = workbook.save_to_buffer().unwrap();

        let rows = collect_rows(&ExcelParser::new(ExcelFlavor::Xlsx), &data);
        let raw = &rows[1].1[11];
        assert_eq!(DataCleaner.parse_time(raw), NaiveTime::from_hms_opt(8, 25, 0));
    }

    #[test]
    fn test_excel_parser_reads_first_sheet_from_memory() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id_entrega").unwrap();
        sheet.write_string(1, 0, "E1").unwrap();
        sheet.write_number(1, 2, 45306.0).unwrap();
        let data = workbook.save_to_buffer().unwrap();

        let rows = collect_rows(&ExcelParser::new(ExcelFlavor::Xlsx), &data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, 1);
        assert_eq!(rows[1].1[0], "E1");
        assert_eq!(rows[1].1[1], "");
        assert_eq!(rows[1].1[2], "45306");
    }

    #[test]
    fn test_excel_parser_restores_absolute_positions() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "B3").unwrap();
        let data = workbook.save_to_buffer().unwrap();

        let rows = collect_rows(&ExcelParser::new(ExcelFlavor::Xlsx), &data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[0].1, vec![String::new(), "B3".to_string()]);
    }

    #[test]
    fn test_excel_parser_rejects_garbage_bytes() {
        let parser = ExcelParser::new(ExcelFlavor::Xlsx);
        let result = parser.for_each_row(b"not a workbook", &mut |_, _| Ok(()));
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_universal_parser_dispatch() {
        assert!(UniversalFileParser::for_filename("entregas.XLSX").is_ok());
        assert!(UniversalFileParser::for_filename("entregas.csv").is_ok());
        assert!(matches!(
            UniversalFileParser::for_filename("entregas.pdf"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }
}
