//! Record Extractor
//!
//! Maps raw sheet rows onto BOM and consumption records, resolving each
//! required column through a list of accepted header names.

use crosstab_models::{BomRecord, BomTable, ConsumptionRecord, ConsumptionTable};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::parser::{normalize_header, RawRow, RawTable};
use crate::error::{CrosstabError, CrosstabResult};

/// Accepted header names for the BOM sheets
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BomColumns {
    #[validate(length(min = 1))]
    pub model: Vec<String>,
    #[validate(length(min = 1))]
    pub component: Vec<String>,
    #[validate(length(min = 1))]
    pub expected_quantity: Vec<String>,
}

/// Accepted header names for the consumption extract
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConsumptionColumns {
    #[validate(length(min = 1))]
    pub model: Vec<String>,
    #[validate(length(min = 1))]
    pub component: Vec<String>,
    #[validate(length(min = 1))]
    pub group_key: Vec<String>,
    #[validate(length(min = 1))]
    pub quantity: Vec<String>,
    /// Optional explicit subset column
    pub subset: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ColumnAliases {
    #[validate]
    pub bom: BomColumns,
    #[validate]
    pub consumption: ConsumptionColumns,
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            bom: BomColumns {
                model: names(&["Modelo", "Model"]),
                component: names(&["Nº componentes", "N° componentes", "Componente", "ComponentNumber"]),
                expected_quantity: names(&[
                    "Ctd.componente (UMB)",
                    "Cantidad_BOM",
                    "ExpectedQuantityPerUnit",
                ]),
            },
            consumption: ConsumptionColumns {
                model: names(&["Modelo", "Model"]),
                component: names(&["Nº componentes", "Componente", "Material", "ComponentNumber"]),
                group_key: names(&["Orden", "Order", "GroupKey"]),
                quantity: names(&["Cantidad tomada", "Ctd.tomada", "Cantidad", "QuantityConsumed"]),
                subset: names(&["Subconjunto", "Subset"]),
            },
        }
    }
}

/// Index of the first accepted header present in the table.
fn resolve_column(table: &RawTable, canonical: &str, aliases: &[String]) -> CrosstabResult<usize> {
    resolve_optional(table, aliases).ok_or_else(|| {
        CrosstabError::missing_column(
            &table.sheet,
            format!("{} (accepted headers: {})", canonical, aliases.join(" | ")),
        )
    })
}

fn resolve_optional(table: &RawTable, aliases: &[String]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| table.headers.iter().position(|h| *h == normalize_header(alias)))
}

fn text_at(row: &RawRow, idx: usize) -> Option<String> {
    row.get(idx).as_text()
}

pub struct RecordExtractor<'a> {
    aliases: &'a ColumnAliases,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(aliases: &'a ColumnAliases) -> Self {
        Self { aliases }
    }

    /// Rows without a model or component are skipped; a row that names both
    /// must carry a numeric expected quantity.
    pub fn bom(&self, table: &RawTable) -> CrosstabResult<BomTable> {
        let cols = &self.aliases.bom;
        let model_idx = resolve_column(table, "Model", &cols.model)?;
        let component_idx = resolve_column(table, "ComponentNumber", &cols.component)?;
        let qty_idx = resolve_column(table, "ExpectedQuantityPerUnit", &cols.expected_quantity)?;

        let mut records = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;

        for row in &table.rows {
            let (Some(model), Some(component)) = (text_at(row, model_idx), text_at(row, component_idx)) else {
                skipped += 1;
                continue;
            };

            let expected_quantity = row.get(qty_idx).as_number().ok_or_else(|| {
                CrosstabError::invalid_value(
                    &table.sheet,
                    row.row_number,
                    &table.headers[qty_idx],
                    "expected quantity is not a number",
                )
            })?;

            records.push(BomRecord {
                model,
                component,
                expected_quantity,
                source_row: row.row_number,
            });
        }

        if skipped > 0 {
            crate::log_debug!("Skipped {} BOM rows without model or component in '{}'", skipped, table.sheet);
        }

        Ok(BomTable::new(&table.sheet, records))
    }

    /// Rows without model, component or group key are skipped. An empty
    /// quantity counts as zero; non-numeric text is rejected.
    pub fn consumption(&self, table: &RawTable, require_subset: bool) -> CrosstabResult<ConsumptionTable> {
        let cols = &self.aliases.consumption;
        let model_idx = resolve_column(table, "Model", &cols.model)?;
        let component_idx = resolve_column(table, "ComponentNumber", &cols.component)?;
        let group_idx = resolve_column(table, "GroupKey", &cols.group_key)?;
        let qty_idx = resolve_column(table, "QuantityConsumed", &cols.quantity)?;
        let subset_idx = if require_subset {
            Some(resolve_column(table, "Subset", &cols.subset)?)
        } else {
            resolve_optional(table, &cols.subset)
        };

        let mut records = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;

        for row in &table.rows {
            let (Some(model), Some(component), Some(group_key)) = (
                text_at(row, model_idx),
                text_at(row, component_idx),
                text_at(row, group_idx),
            ) else {
                skipped += 1;
                continue;
            };

            let cell = row.get(qty_idx);
            let quantity = if cell.is_empty() {
                0.0
            } else {
                cell.as_number().ok_or_else(|| {
                    CrosstabError::invalid_value(
                        &table.sheet,
                        row.row_number,
                        &table.headers[qty_idx],
                        "consumed quantity is not a number",
                    )
                })?
            };

            records.push(ConsumptionRecord {
                model,
                component,
                group_key,
                quantity,
                subset_tag: subset_idx.and_then(|idx| text_at(row, idx)),
                source_row: row.row_number,
            });
        }

        if skipped > 0 {
            crate::log_debug!(
                "Skipped {} consumption rows without model, component or group key in '{}'",
                skipped,
                table.sheet
            );
        }

        Ok(ConsumptionTable::new(&table.sheet, records))
    }
}
