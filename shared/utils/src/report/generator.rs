//! Report Generator
//!
//! Runs the whole pipeline for one request: load, partition, assemble and
//! write one workbook per subset.

use crosstab_models::Subset;
use std::fs;
use std::time::Instant;

use super::assembler::assemble;
use super::writer::{GeneratedReport, ReportWriter, XlsxReportWriter};
use crate::config::{AppConfig, ReportSettings};
use crate::error::{CrosstabError, CrosstabResult};
use crate::loader::{open_source, DataLoader, LoadedData, SourceFormat, TabularSource, XlsxSource};

/// An uploaded workbook or CSV extract.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    fn into_source(self) -> CrosstabResult<Box<dyn TabularSource>> {
        open_source(&self.file_name, self.data)
    }
}

#[derive(Debug, Clone)]
pub enum WorkbookInput {
    /// One workbook holding both BOM sheets and the consumption sheet
    Combined(UploadedFile),
    /// BOM sheets and consumption uploaded separately. Without `stocks` the
    /// configured default stocks workbook is read.
    Split {
        stocks: Option<UploadedFile>,
        consumption: UploadedFile,
    },
}

pub struct ReportGenerator {
    settings: ReportSettings,
    loader: DataLoader,
}

impl ReportGenerator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            settings: config.reports.clone(),
            loader: DataLoader::from_config(config),
        }
    }

    /// Generates and writes a report for every subset. Nothing is left on
    /// disk unless every subset assembles, renders and persists.
    pub fn generate(&self, input: WorkbookInput) -> CrosstabResult<Vec<GeneratedReport>> {
        let writer = XlsxReportWriter::new(self.settings.results_dir());
        crate::log_debug!("Starting report run {}", writer.run_id());
        self.generate_with(input, &writer)
    }

    pub fn generate_with(&self, input: WorkbookInput, writer: &dyn ReportWriter) -> CrosstabResult<Vec<GeneratedReport>> {
        let started = Instant::now();

        let data = self.load(input)?;
        let consumption = self.loader.partition(&data);
        let reports = assemble(&data.bom, &consumption, &self.settings.subsets)?;

        let generated = writer.write_all(&reports)?;

        crate::log_info!(
            "Generated {} reports in {} ms",
            generated.len(),
            started.elapsed().as_millis()
        );
        Ok(generated)
    }

    fn load(&self, input: WorkbookInput) -> CrosstabResult<LoadedData> {
        match input {
            WorkbookInput::Combined(file) => {
                let mut source = file.into_source()?;
                self.loader.load(source.as_mut(), &self.settings.sheets)
            }
            WorkbookInput::Split { stocks, consumption } => {
                let mut stocks = match stocks {
                    Some(file) => file.into_source()?,
                    None => self.default_stocks()?,
                };
                let mut consumption = consumption.into_source()?;
                self.loader
                    .load_split(stocks.as_mut(), consumption.as_mut(), &self.settings.sheets)
            }
        }
    }

    fn default_stocks(&self) -> CrosstabResult<Box<dyn TabularSource>> {
        let path = self.settings.default_stocks_path().ok_or_else(|| {
            CrosstabError::validation("archivo_stocks", "no stocks workbook uploaded and no default configured")
        })?;

        crate::log_debug!("Using default stocks workbook {}", path.display());
        if SourceFormat::from_extension(&path) == Some(SourceFormat::Excel) {
            return Ok(Box::new(XlsxSource::open(&path)?));
        }

        let display = path.display().to_string();
        let data = fs::read(&path).map_err(|e| CrosstabError::load(&display, e.to_string()))?;
        open_source(&display, data)
    }
}

/// Reports of the requested subsets, in subset order.
pub fn select_reports(reports: &[GeneratedReport], subsets: &[Subset]) -> Vec<GeneratedReport> {
    reports
        .iter()
        .filter(|r| subsets.contains(&r.subset))
        .cloned()
        .collect()
}
