//! Report Generation Handler
//!
//! Accepts the source workbooks as a multipart upload, generates the subset
//! reports and answers with a zip of the requested workbooks.

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::Response,
};
use crosstab_models::{ReportSummary, Subset};
use crosstab_utils::{
    select_reports, zip_reports, CrosstabError, CrosstabResult, UploadedFile, WorkbookInput, ARCHIVE_NAME,
};
use tracing::{debug, info, warn};

use crate::middleware::ApiError;
use crate::AppState;

pub const SUMMARY_HEADER: &str = "x-report-summary";

const NOTHING_REQUESTED: &str = "No files generated or requested for download";

/// Fields of the upload form
#[derive(Debug, Default)]
struct GenerateForm {
    archivo: Option<UploadedFile>,
    archivo_stocks: Option<UploadedFile>,
    archivo_coois: Option<UploadedFile>,
    download_ea: Option<bool>,
    download_eb: Option<bool>,
}

fn parse_flag(field: &str, value: &str) -> CrosstabResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(CrosstabError::validation(field, format!("'{}' is not a boolean", other))),
    }
}

impl GenerateForm {
    async fn read(multipart: &mut Multipart) -> CrosstabResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| CrosstabError::validation("multipart", format!("Failed to read upload: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "archivo" | "archivo_stocks" | "archivo_coois" => {
                    let file_name = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{}.xlsx", name));
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| CrosstabError::validation(&name, format!("Failed to read file data: {}", e)))?;

                    // Browsers send an empty part for an unused file input
                    if data.is_empty() {
                        continue;
                    }

                    let file = Some(UploadedFile::new(file_name, data.to_vec()));
                    match name.as_str() {
                        "archivo" => form.archivo = file,
                        "archivo_stocks" => form.archivo_stocks = file,
                        _ => form.archivo_coois = file,
                    }
                }
                "download_ea" | "download_eb" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| CrosstabError::validation(&name, e.to_string()))?;
                    let flag = Some(parse_flag(&name, &value)?);
                    if name == "download_ea" {
                        form.download_ea = flag;
                    } else {
                        form.download_eb = flag;
                    }
                }
                other => debug!("Ignoring form field '{}'", other),
            }
        }

        Ok(form)
    }

    fn requested_subsets(&self) -> Vec<Subset> {
        let mut subsets = Vec::new();
        if self.download_ea.unwrap_or(true) {
            subsets.push(Subset::A);
        }
        if self.download_eb.unwrap_or(true) {
            subsets.push(Subset::B);
        }
        subsets
    }

    fn into_input(self) -> CrosstabResult<WorkbookInput> {
        if let Some(archivo) = self.archivo {
            if self.archivo_stocks.is_some() || self.archivo_coois.is_some() {
                warn!("Both a combined workbook and separate files were uploaded; using the combined workbook");
            }
            return Ok(WorkbookInput::Combined(archivo));
        }

        let consumption = self.archivo_coois.ok_or_else(|| {
            CrosstabError::validation(
                "archivo_coois",
                "upload a consumption extract (archivo_coois) or a combined workbook (archivo)",
            )
        })?;

        Ok(WorkbookInput::Split {
            stocks: self.archivo_stocks,
            consumption,
        })
    }
}

/// Generate the subset workbooks and download them as a zip
///
/// POST /generate_excel/
pub async fn generate_excel(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = GenerateForm::read(&mut multipart).await?;

    let subsets = form.requested_subsets();
    if subsets.is_empty() {
        return Err(CrosstabError::not_found(NOTHING_REQUESTED).into());
    }
    let input = form.into_input()?;

    let generator = state.generator.clone();
    let timer = state.metrics.generation_seconds.start_timer();
    let outcome = tokio::task::spawn_blocking(move || {
        let reports = generator.generate(input)?;
        let selected = select_reports(&reports, &subsets);
        let paths: Vec<_> = selected.iter().map(|r| r.path.clone()).collect();
        let archive = zip_reports(&paths)?;
        Ok::<_, CrosstabError>((selected, archive))
    })
    .await
    .map_err(|e| CrosstabError::internal(format!("Report generation task failed: {}", e)))?;
    timer.observe_duration();

    let (selected, archive) = outcome.map_err(|e| {
        state
            .metrics
            .generation_failures
            .with_label_values(&[e.error_code()])
            .inc();
        e
    })?;

    for report in &selected {
        state
            .metrics
            .reports_generated
            .with_label_values(&[report.label.as_str()])
            .inc();
        info!(
            subset = %report.label,
            path = %report.path.display(),
            models = report.summary.models,
            under = report.summary.cells.under,
            exact = report.summary.cells.exact,
            over = report.summary.cells.over,
            unclassified = report.summary.cells.unclassified,
            "Report ready for download"
        );
    }

    let summaries: Vec<&ReportSummary> = selected.iter().map(|r| &r.summary).collect();
    let summary_header = serde_json::to_string(&summaries).map_err(CrosstabError::from)?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ARCHIVE_NAME),
        )
        .header(SUMMARY_HEADER, summary_header)
        .body(Body::from(archive))
        .map_err(|e| CrosstabError::internal(e.to_string()).into())
}
