//! Xlsx Report Writer
//!
//! Renders a `Report` as a workbook: the "Índice" sheet first, then one sheet
//! per model with the component header row, the expected quantity row and a
//! fill per classified cell.

use chrono::{DateTime, Utc};
use crosstab_models::{
    Classification, ClassifiedSheet, ExpectedQuantity, Report, ReportSummary, Subset, EXPECTED_LABEL,
    INDEX_HEADER, INDEX_SHEET_NAME, MATERIAL_LABEL,
};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatUnderline, Url, Workbook, Worksheet};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{CrosstabError, CrosstabResult};

const INDEX_COLUMN_WIDTH: f64 = 30.0;
const MAX_SHEET_NAME_CHARS: usize = 31;
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const RESERVED_SHEET_NAMES: [&str; 2] = [INDEX_SHEET_NAME, "History"];
const FALLBACK_SHEET_NAME: &str = "Modelo";

/// A report persisted to disk.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub subset: Subset,
    pub label: String,
    pub path: PathBuf,
    pub summary: ReportSummary,
}

impl GeneratedReport {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Destination for rendered reports. `write_all` renders every report before
/// persisting any, and removes what it persisted if a later report fails.
pub trait ReportWriter {
    fn render(&self, report: &Report) -> CrosstabResult<Vec<u8>> {
        render_report(report)
    }

    fn persist(&self, report: &Report, bytes: &[u8]) -> CrosstabResult<GeneratedReport>;

    fn discard(&self, generated: &GeneratedReport) {
        if let Err(e) = fs::remove_file(&generated.path) {
            crate::log_warn!("Could not remove {}: {}", generated.path.display(), e);
        }
    }

    fn write_all(&self, reports: &[Report]) -> CrosstabResult<Vec<GeneratedReport>> {
        let rendered = reports
            .iter()
            .map(|report| self.render(report).map(|bytes| (report, bytes)))
            .collect::<CrosstabResult<Vec<_>>>()?;

        let mut generated = Vec::with_capacity(rendered.len());
        for (report, bytes) in rendered {
            match self.persist(report, &bytes) {
                Ok(written) => generated.push(written),
                Err(e) => {
                    crate::log_error!(
                        e,
                        "Persisting report {} failed, removing {} written files",
                        report.label,
                        generated.len()
                    );
                    for written in &generated {
                        self.discard(written);
                    }
                    return Err(e);
                }
            }
        }
        Ok(generated)
    }
}

struct ReportStyles {
    header: Format,
    index_header: Format,
    back_link: Format,
    expected: Format,
    group_key: Format,
    under: Format,
    exact: Format,
    over: Format,
}

impl ReportStyles {
    fn new() -> Self {
        let header = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0x4F81BD))
            .set_font_color(Color::White)
            .set_border(FormatBorder::Thin);

        Self {
            index_header: header.clone(),
            back_link: header.clone().set_underline(FormatUnderline::Single),
            header,
            expected: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xDDEBF7))
                .set_border(FormatBorder::Thin),
            group_key: Format::new()
                .set_background_color(Color::RGB(0xEDEDED))
                .set_border(FormatBorder::Thin),
            under: Format::new().set_background_color(Color::RGB(0xFFC7CE)),
            exact: Format::new().set_background_color(Color::RGB(0xC6EFCE)),
            over: Format::new().set_background_color(Color::RGB(0xFFEB9C)),
        }
    }

    fn for_classification(&self, classification: Classification) -> &Format {
        match classification {
            Classification::Under => &self.under,
            Classification::Exact => &self.exact,
            Classification::Over => &self.over,
        }
    }
}

/// In-document link target for a sheet, quoting the name the way Excel does.
fn internal_link(sheet: &str) -> String {
    format!("internal:'{}'!A1", sheet.replace('\'', "''"))
}

/// Worksheet name per model, in sheet order. Excel matches names ignoring
/// case, caps them at 31 characters and rejects `[]:*?/\`; a clash gets a
/// numeric suffix.
fn sheet_names(report: &Report) -> Vec<String> {
    let mut taken: HashSet<String> = RESERVED_SHEET_NAMES.iter().map(|name| name.to_lowercase()).collect();

    report
        .sheets
        .iter()
        .map(|sheet| {
            let base = clean_sheet_name(&sheet.model);
            let mut name = base.clone();
            let mut suffix = 1u32;
            while !taken.insert(name.to_lowercase()) {
                let tail = suffix.to_string();
                name = format!("{}{}", truncate_chars(&base, MAX_SHEET_NAME_CHARS - tail.len()), tail);
                suffix += 1;
            }
            name
        })
        .collect()
}

fn clean_sheet_name(model: &str) -> String {
    let replaced: String = model
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let name = truncate_chars(&replaced, MAX_SHEET_NAME_CHARS).trim_matches('\'');

    if name.is_empty() {
        FALLBACK_SHEET_NAME.to_string()
    } else {
        name.to_string()
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the workbook in memory.
pub fn render_report(report: &Report) -> CrosstabResult<Vec<u8>> {
    let styles = ReportStyles::new();
    let mut workbook = Workbook::new();

    let names = sheet_names(report);

    write_index_sheet(workbook.add_worksheet(), report, &names, &styles)?;
    for (sheet, name) in report.sheets.iter().zip(&names) {
        write_model_sheet(workbook.add_worksheet(), sheet, name, &styles)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_index_sheet(
    worksheet: &mut Worksheet,
    report: &Report,
    names: &[String],
    styles: &ReportStyles,
) -> CrosstabResult<()> {
    worksheet.set_name(INDEX_SHEET_NAME)?;
    worksheet.write_string_with_format(0, 0, INDEX_HEADER, &styles.index_header)?;

    for (idx, (model, name)) in report.index.models.iter().zip(names).enumerate() {
        let row = (idx + 1) as u32;
        worksheet.write_url(row, 0, Url::new(internal_link(name)).set_text(model))?;
    }

    worksheet.set_column_width(0, INDEX_COLUMN_WIDTH)?;
    Ok(())
}

fn write_model_sheet(
    worksheet: &mut Worksheet,
    sheet: &ClassifiedSheet,
    name: &str,
    styles: &ReportStyles,
) -> CrosstabResult<()> {
    worksheet.set_name(name).map_err(|e| {
        CrosstabError::write(&sheet.model, format!("model cannot be used as a sheet name: {}", e))
    })?;

    // A1 doubles as the way back to the index
    worksheet.write_url_with_format(
        0,
        0,
        Url::new(internal_link(INDEX_SHEET_NAME)).set_text(MATERIAL_LABEL),
        &styles.back_link,
    )?;
    worksheet.write_string_with_format(1, 0, EXPECTED_LABEL, &styles.expected)?;

    for (idx, (component, expected)) in sheet.components.iter().zip(&sheet.expected).enumerate() {
        let col = (idx + 1) as u16;
        worksheet.write_string_with_format(0, col, component, &styles.header)?;
        match expected {
            ExpectedQuantity::Quantity(qty) => {
                worksheet.write_number_with_format(1, col, *qty, &styles.expected)?;
            }
            ExpectedQuantity::NotApplicable => {
                worksheet.write_string_with_format(1, col, expected.to_string(), &styles.expected)?;
            }
        }
    }

    for (idx, row) in sheet.rows.iter().enumerate() {
        let row_num = (idx + 2) as u32;
        worksheet.write_string_with_format(row_num, 0, &row.group_key, &styles.group_key)?;

        for (col_idx, cell) in row.cells.iter().enumerate() {
            let col = (col_idx + 1) as u16;
            match cell.classification {
                Some(classification) => {
                    worksheet.write_number_with_format(
                        row_num,
                        col,
                        cell.value,
                        styles.for_classification(classification),
                    )?;
                }
                None => {
                    worksheet.write_number(row_num, col, cell.value)?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(2, 1)?;
    worksheet.autofit();
    Ok(())
}

/// Writes workbooks under `{results_dir}/crosstabs_{LABEL}/`, one file name
/// per run so concurrent runs never collide.
pub struct XlsxReportWriter {
    results_dir: PathBuf,
    run_id: String,
}

impl XlsxReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self::with_run_id(results_dir, run_id)
    }

    pub fn with_run_id(results_dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            results_dir: results_dir.into(),
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn output_path(&self, label: &str, generated_at: DateTime<Utc>) -> PathBuf {
        self.results_dir.join(format!("crosstabs_{}", label)).join(format!(
            "crosstabs_materiales_{}_{}_{}.xlsx",
            label,
            generated_at.format("%Y%m%d%H%M%S"),
            self.run_id
        ))
    }
}

/// Temp file in the target directory, renamed into place once complete.
fn write_atomic(path: &Path, bytes: &[u8]) -> CrosstabResult<()> {
    let display = path.display().to_string();
    let dir = path
        .parent()
        .ok_or_else(|| CrosstabError::write(&display, "output path has no parent directory"))?;

    fs::create_dir_all(dir).map_err(|e| CrosstabError::write(&display, e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CrosstabError::write(&display, e.to_string()))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CrosstabError::write(&display, e.to_string()))?;
    tmp.persist(path)
        .map_err(|e| CrosstabError::write(&display, e.error.to_string()))?;

    Ok(())
}

impl ReportWriter for XlsxReportWriter {
    fn persist(&self, report: &Report, bytes: &[u8]) -> CrosstabResult<GeneratedReport> {
        let path = self.output_path(&report.label, report.generated_at);

        write_atomic(&path, bytes)?;
        crate::log_info!("Wrote report {} to {}", report.label, path.display());

        Ok(GeneratedReport {
            subset: report.subset,
            label: report.label.clone(),
            path,
            summary: report.summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};
    use crosstab_models::{ClassifiedCell, ClassifiedRow};
    use std::io::{Cursor, Read};

    fn sample_report() -> Report {
        let sheet = ClassifiedSheet {
            model: "X".to_string(),
            components: vec!["A".to_string(), "B".to_string(), "Q".to_string()],
            expected: vec![
                ExpectedQuantity::Quantity(10.0),
                ExpectedQuantity::Quantity(5.0),
                ExpectedQuantity::NotApplicable,
            ],
            rows: vec![ClassifiedRow {
                group_key: "G1".to_string(),
                cells: vec![
                    ClassifiedCell { value: 10.0, classification: Some(Classification::Exact) },
                    ClassifiedCell { value: 3.0, classification: Some(Classification::Under) },
                    ClassifiedCell { value: 2.0, classification: None },
                ],
            }],
        };
        Report::new(Subset::A, "EA", vec![sheet])
    }

    fn zip_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_render_layout() {
        let bytes = render_report(&sample_report()).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();

        assert_eq!(workbook.sheet_names().to_vec(), vec![INDEX_SHEET_NAME.to_string(), "X".to_string()]);

        let index = workbook.worksheet_range(INDEX_SHEET_NAME).unwrap().unwrap();
        assert_eq!(index.get_value((0, 0)), Some(&DataType::String("Modelo".into())));
        assert_eq!(index.get_value((1, 0)), Some(&DataType::String("X".into())));

        let sheet = workbook.worksheet_range("X").unwrap().unwrap();
        assert_eq!(sheet.get_value((0, 0)), Some(&DataType::String("Material".into())));
        assert_eq!(sheet.get_value((0, 2)), Some(&DataType::String("B".into())));
        assert_eq!(sheet.get_value((1, 0)), Some(&DataType::String("Cantidad_BOM".into())));
        assert_eq!(sheet.get_value((1, 1)), Some(&DataType::Float(10.0)));
        assert_eq!(sheet.get_value((1, 3)), Some(&DataType::String("N/A".into())));
        assert_eq!(sheet.get_value((2, 0)), Some(&DataType::String("G1".into())));
        assert_eq!(sheet.get_value((2, 2)), Some(&DataType::Float(3.0)));
    }

    #[test]
    fn test_render_links_fills_and_panes() {
        let bytes = render_report(&sample_report()).unwrap();

        let index_xml = zip_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(index_xml.contains("location=\"'X'!A1\""));

        let model_xml = zip_entry(&bytes, "xl/worksheets/sheet2.xml");
        assert!(model_xml.contains("location=\"'Índice'!A1\""));
        assert!(model_xml.contains("topLeftCell=\"B3\""));

        let styles = zip_entry(&bytes, "xl/styles.xml");
        for fill in ["FFFFC7CE", "FFC6EFCE", "FF4F81BD", "FFDDEBF7"] {
            assert!(styles.contains(fill), "missing fill {}", fill);
        }
    }

    #[test]
    fn test_sheet_link_quotes_apostrophes() {
        assert_eq!(internal_link("O'Neil"), "internal:'O''Neil'!A1");
    }

    fn report_for(models: &[&str]) -> Report {
        let template = sample_report().sheets.remove(0);
        let sheets = models
            .iter()
            .map(|model| ClassifiedSheet {
                model: model.to_string(),
                ..template.clone()
            })
            .collect();
        Report::new(Subset::A, "EA", sheets)
    }

    #[test]
    fn test_models_clashing_ignoring_case_get_distinct_sheets() {
        let report = report_for(&["X", "x", "Índice"]);
        let bytes = render_report(&report).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.clone())).unwrap();

        assert_eq!(
            workbook.sheet_names().to_vec(),
            vec!["Índice", "X", "x1", "Índice1"]
        );

        let index = workbook.worksheet_range(INDEX_SHEET_NAME).unwrap().unwrap();
        assert_eq!(index.get_value((2, 0)), Some(&DataType::String("x".into())));
        assert_eq!(index.get_value((3, 0)), Some(&DataType::String("Índice".into())));

        let index_xml = zip_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(index_xml.contains("location=\"'x1'!A1\""));
        assert!(index_xml.contains("location=\"'Índice1'!A1\""));

        let sheet = workbook.worksheet_range("x1").unwrap().unwrap();
        assert_eq!(sheet.get_value((0, 0)), Some(&DataType::String("Material".into())));
    }

    #[test]
    fn test_long_and_invalid_model_names_are_cleaned() {
        let report = report_for(&[
            "bad/name:1",
            "MODEL-NAME-LONGER-THAN-31-CHARACTERS",
            "MODEL-NAME-LONGER-THAN-31-CHARACTERS-B",
            "'quoted'",
        ]);
        let names = sheet_names(&report);

        assert_eq!(names[0], "bad_name_1");
        assert_eq!(names[1], "MODEL-NAME-LONGER-THAN-31-CHARA");
        assert_eq!(names[2], "MODEL-NAME-LONGER-THAN-31-CHAR1");
        assert_eq!(names[3], "quoted");
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME_CHARS));

        render_report(&report).unwrap();
    }

    #[test]
    fn test_writer_persists_under_label_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = XlsxReportWriter::with_run_id(dir.path(), "run1");
        assert_eq!(writer.run_id(), "run1");
        let report = sample_report();

        let generated = writer.write_all(std::slice::from_ref(&report)).unwrap().remove(0);
        let expected_name = format!(
            "crosstabs_materiales_EA_{}_run1.xlsx",
            report.generated_at.format("%Y%m%d%H%M%S")
        );

        assert_eq!(generated.file_name(), Some(expected_name.as_str()));
        assert_eq!(generated.path.parent().unwrap(), dir.path().join("crosstabs_EA"));
        assert!(generated.path.exists());
        assert_eq!(generated.summary.cells.unclassified, 1);

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("crosstabs_EA")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
