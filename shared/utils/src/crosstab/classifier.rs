//! Cell Classifier
//!
//! Attaches the expected BOM quantity to every pivot column and labels each
//! data cell UNDER, EXACT or OVER against it.

use crosstab_models::{
    BomTable, ClassifiedCell, ClassifiedRow, ClassifiedSheet, ExpectedQuantity, PivotTable,
};

use crate::error::{CrosstabError, CrosstabResult};

/// Fails with `UnknownModel` when the BOM has no rows for `model`.
///
/// Columns whose component has no BOM entry get `ExpectedQuantity::NotApplicable`
/// and their cells stay unclassified.
pub fn annotate(pivot: &PivotTable, bom: &BomTable, model: &str) -> CrosstabResult<ClassifiedSheet> {
    if !bom.has_model(model) {
        return Err(CrosstabError::unknown_model(model));
    }

    let lookup = bom.expected_for(model);
    let expected: Vec<ExpectedQuantity> = pivot
        .components
        .iter()
        .map(|component| {
            lookup
                .get(component.as_str())
                .map_or(ExpectedQuantity::NotApplicable, |qty| ExpectedQuantity::Quantity(*qty))
        })
        .collect();

    let rows = pivot
        .rows()
        .map(|(group_key, values)| ClassifiedRow {
            group_key: group_key.to_string(),
            cells: values
                .iter()
                .zip(&expected)
                .map(|(value, expected)| ClassifiedCell {
                    value: *value,
                    classification: expected.classify(*value),
                })
                .collect(),
        })
        .collect();

    Ok(ClassifiedSheet {
        model: model.to_string(),
        components: pivot.components.clone(),
        expected,
        rows,
    })
}
