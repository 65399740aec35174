//! Report Assembler
//!
//! Builds one report per subset: a classified sheet for every model listed
//! in the subset's BOM, in byte order, plus the index over them.

use crosstab_models::{BomTable, BySubset, ConsumptionTable, Report, Subset, SubsetLabels};

use crate::crosstab::classify_model;
use crate::error::CrosstabResult;

/// Any per-model failure aborts the whole run; no partial report is returned.
pub fn assemble(
    bom: &BySubset<BomTable>,
    consumption: &BySubset<ConsumptionTable>,
    labels: &SubsetLabels,
) -> CrosstabResult<Vec<Report>> {
    Subset::ALL
        .into_iter()
        .map(|subset| {
            assemble_subset(
                subset,
                labels.label(subset),
                bom.get(subset),
                consumption.get(subset),
            )
        })
        .collect()
}

pub fn assemble_subset(
    subset: Subset,
    label: &str,
    bom: &BomTable,
    consumption: &ConsumptionTable,
) -> CrosstabResult<Report> {
    let models = bom.models();
    let mut sheets = Vec::with_capacity(models.len());

    for model in models {
        let sheet = classify_model(bom, consumption, model).map_err(|e| {
            crate::log_error!(e, "Failed to build sheet for model '{}' in subset {}", model, label);
            e
        })?;
        sheets.push(sheet);
    }

    let report = Report::new(subset, label, sheets);
    let summary = report.summary();
    crate::log_info!(
        "Assembled report {}: {} models, {} under, {} exact, {} over, {} unclassified",
        label,
        summary.models,
        summary.cells.under,
        summary.cells.exact,
        summary.cells.over,
        summary.cells.unclassified
    );

    Ok(report)
}
