//! Tabular Source Parser
//!
//! Reads named sheets from Excel workbooks (and single-table CSV extracts)
//! into raw, header-normalised tables.

use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use crate::error::{CrosstabError, CrosstabResult};

/// Supported source file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Excel, // XLSX
    Csv,
}

impl SourceFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(Self::Excel),
            "csv" | "txt" => Some(Self::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Identifier text. Whole numbers print without a fractional part so that
    /// numeric order and component numbers read back as typed.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
        }
    }

    /// Finite numeric value. Text cells accept a decimal comma.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<f64>()
                    .ok()
                    .or_else(|| {
                        if trimmed.contains(',') && !trimmed.contains('.') {
                            trimmed.replace(',', ".").parse::<f64>().ok()
                        } else {
                            None
                        }
                    })?
            }
            Self::Empty | Self::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }
}

impl From<&DataType> for CellValue {
    fn from(cell: &DataType) -> Self {
        match cell {
            DataType::Empty => Self::Empty,
            DataType::String(s) => Self::from_text(s),
            DataType::Float(f) => Self::Number(*f),
            DataType::Int(i) => Self::Number(*i as f64),
            DataType::Bool(b) => Self::Bool(*b),
            other => Self::from_text(&other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based spreadsheet row number
    pub row_number: usize,
    pub cells: Vec<CellValue>,
}

impl RawRow {
    pub fn get(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&CellValue::Empty)
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

/// A sheet's rows with the first row taken as (lowercased, trimmed) headers.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// `rows` yields (1-based row number, cells); the first item is the header.
    fn from_rows(sheet: &str, mut rows: impl Iterator<Item = (usize, Vec<CellValue>)>) -> CrosstabResult<Self> {
        let (_, header_cells) = rows
            .next()
            .ok_or_else(|| CrosstabError::load(sheet, "Sheet is empty"))?;
        let headers = header_cells
            .iter()
            .map(|cell| normalize_header(&cell.as_text().unwrap_or_default()))
            .collect();

        let rows = rows
            .map(|(row_number, cells)| RawRow { row_number, cells })
            .filter(|row| !row.is_blank())
            .collect();

        Ok(Self {
            sheet: sheet.to_string(),
            headers,
            rows,
        })
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        let wanted = normalize_header(header);
        self.headers.iter().position(|h| *h == wanted)
    }
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Anything that can hand out named tables.
pub trait TabularSource {
    fn name(&self) -> &str;

    fn read_table(&mut self, sheet: &str) -> CrosstabResult<RawTable>;
}

/// Excel workbook source backed by calamine.
pub struct XlsxSource<R: Read + Seek> {
    name: String,
    workbook: Xlsx<R>,
}

impl XlsxSource<Cursor<Vec<u8>>> {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> CrosstabResult<Self> {
        let name = name.into();
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
            .map_err(|e| CrosstabError::load(&name, format!("Failed to open Excel workbook: {}", e)))?;
        Ok(Self { name, workbook })
    }
}

impl XlsxSource<BufReader<File>> {
    pub fn open(path: &Path) -> CrosstabResult<Self> {
        let name = path.display().to_string();
        let file = File::open(path)
            .map_err(|e| CrosstabError::load(&name, format!("Failed to open file: {}", e)))?;
        let workbook: Xlsx<_> = open_workbook_from_rs(BufReader::new(file))
            .map_err(|e| CrosstabError::load(&name, format!("Failed to open Excel workbook: {}", e)))?;
        Ok(Self { name, workbook })
    }
}

impl<R: Read + Seek> TabularSource for XlsxSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_table(&mut self, sheet: &str) -> CrosstabResult<RawTable> {
        let range = self
            .workbook
            .worksheet_range(sheet)
            .ok_or_else(|| {
                CrosstabError::load(
                    sheet,
                    format!(
                        "Sheet not found in '{}' (available: {})",
                        self.name,
                        self.workbook.sheet_names().join(", ")
                    ),
                )
            })?
            .map_err(|e| CrosstabError::load(sheet, format!("Failed to read worksheet: {}", e)))?;

        let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
        RawTable::from_rows(
            sheet,
            range
                .rows()
                .enumerate()
                .map(|(idx, row)| (first_row + idx, row.iter().map(CellValue::from).collect())),
        )
    }
}

/// Single-table CSV source; every sheet name resolves to the same table.
pub struct CsvSource {
    name: String,
    data: Vec<u8>,
}

impl CsvSource {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    fn delimiter(&self) -> u8 {
        let header_line = self.data.split(|b| *b == b'\n').next().unwrap_or_default();
        let semicolons = header_line.iter().filter(|b| **b == b';').count();
        let commas = header_line.iter().filter(|b| **b == b',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }
}

impl TabularSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_table(&mut self, sheet: &str) -> CrosstabResult<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter())
            .from_reader(self.data.as_slice());

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                CrosstabError::load(sheet, format!("Record {}: Parse error - {}", idx + 1, e))
            })?;
            let line = record
                .position()
                .map(|p| line_at(&self.data, p.byte() as usize))
                .unwrap_or(idx + 1);
            rows.push((line, record.iter().map(CellValue::from_text).collect::<Vec<_>>()));
        }

        RawTable::from_rows(sheet, rows.into_iter())
    }
}

/// 1-based line of the record starting at `offset`. The offset csv reports
/// sits before any blank lines it skipped on the way to the record.
fn line_at(data: &[u8], offset: usize) -> usize {
    let offset = offset.min(data.len());
    let start = data[offset..]
        .iter()
        .position(|b| *b != b'\n' && *b != b'\r')
        .map_or(data.len(), |skipped| offset + skipped);
    data[..start].iter().filter(|b| **b == b'\n').count() + 1
}

/// Opens uploaded bytes as a tabular source, choosing the reader by file name.
pub fn open_source(filename: &str, data: Vec<u8>) -> CrosstabResult<Box<dyn TabularSource>> {
    let format = SourceFormat::from_extension(Path::new(filename))
        .ok_or_else(|| CrosstabError::load(filename, "Could not determine file format"))?;

    match format {
        SourceFormat::Excel => Ok(Box::new(XlsxSource::from_bytes(filename, data)?)),
        SourceFormat::Csv => Ok(Box::new(CsvSource::from_bytes(filename, data))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("BOM_EA").unwrap();
        sheet.write_string(0, 0, "Modelo").unwrap();
        sheet.write_string(0, 1, "Nº componentes").unwrap();
        sheet.write_string(0, 2, "Ctd.componente (UMB)").unwrap();
        sheet.write_string(1, 0, "X").unwrap();
        sheet.write_number(1, 1, 100200.0).unwrap();
        sheet.write_number(1, 2, 2.5).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_extension(Path::new("a.xlsx")), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::from_extension(Path::new("a.CSV")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension(Path::new("a.pdf")), None);
    }

    #[test]
    fn test_number_as_identifier_text() {
        assert_eq!(CellValue::Number(100200.0).as_text(), Some("100200".to_string()));
        assert_eq!(CellValue::Number(1.5).as_text(), Some("1.5".to_string()));
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(CellValue::Text("2,5".into()).as_number(), Some(2.5));
        assert_eq!(CellValue::Text("abc".into()).as_number(), None);
        assert_eq!(CellValue::Text("inf".into()).as_number(), None);
    }

    #[test]
    fn test_xlsx_read_table() {
        let mut source = XlsxSource::from_bytes("stocks.xlsx", workbook_bytes()).unwrap();
        let table = source.read_table("BOM_EA").unwrap();

        assert_eq!(table.headers, vec!["modelo", "nº componentes", "ctd.componente (umb)"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(table.rows[0].get(1).as_text(), Some("100200".to_string()));
        assert_eq!(table.column_index("Ctd.componente (UMB)"), Some(2));
    }

    #[test]
    fn test_missing_sheet_is_load_error() {
        let mut source = XlsxSource::from_bytes("stocks.xlsx", workbook_bytes()).unwrap();
        let err = source.read_table("BOM_EB").unwrap_err();
        assert!(err.is_load_error());
        assert!(err.to_string().contains("BOM_EB"));
    }

    #[test]
    fn test_csv_semicolon_delimited() {
        let data = b"Orden;Modelo;Material;Cantidad tomada\n1001;X;A;10\n\n1002;X;B;2,5\n".to_vec();
        let mut source = CsvSource::from_bytes("coois.csv", data);
        let table = source.read_table("COOIS").unwrap();

        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].row_number, 4);
        assert_eq!(table.rows[1].get(3).as_number(), Some(2.5));
    }

    #[test]
    fn test_csv_rows_keep_line_numbers_after_blank_lines() {
        let data = b"Modelo,Material,Cantidad\r\n\r\nX,A,1\r\n\r\n\r\nX,\"multi\nline\",2\r\nX,B,oops\r\n".to_vec();
        let mut source = CsvSource::from_bytes("bom.csv", data);
        let table = source.read_table("BOM_EA").unwrap();

        let rows: Vec<usize> = table.rows.iter().map(|r| r.row_number).collect();
        assert_eq!(rows, vec![3, 6, 8]);
    }
}
