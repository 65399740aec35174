//! Crosstab Builder
//!
//! Pivots one model's consumption records into a group key x component
//! matrix of summed quantities.

use crosstab_models::{BomTable, ConsumptionTable, PivotTable};
use std::collections::{BTreeMap, BTreeSet};

/// Rows are the model's distinct group keys and columns the union of
/// components seen in consumption and in the BOM, both sorted. Pairs with no
/// consumption are zero.
///
/// Group keys sort by byte order, except that a model whose keys are all
/// digits (plain order numbers) gets them in numeric order.
pub fn build_crosstab(bom: &BomTable, consumption: &ConsumptionTable, model: &str) -> PivotTable {
    let mut group_keys: BTreeSet<&str> = BTreeSet::new();
    let mut components: BTreeSet<&str> = BTreeSet::new();
    let mut sums: BTreeMap<(&str, &str), f64> = BTreeMap::new();

    for record in consumption.for_model(model) {
        group_keys.insert(&record.group_key);
        components.insert(&record.component);
        *sums
            .entry((record.group_key.as_str(), record.component.as_str()))
            .or_insert(0.0) += record.quantity;
    }

    for record in bom.rows_for(model) {
        components.insert(&record.component);
    }

    let group_keys = order_group_keys(group_keys);

    let values = group_keys
        .iter()
        .map(|group| {
            components
                .iter()
                .map(|component| sums.get(&(*group, *component)).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    PivotTable::new(
        model,
        group_keys.into_iter().map(String::from).collect(),
        components.into_iter().map(String::from).collect(),
        values,
    )
}

fn order_group_keys(keys: BTreeSet<&str>) -> Vec<&str> {
    let mut keys: Vec<&str> = keys.into_iter().collect();
    if keys.iter().all(|key| !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())) {
        // Stable, so "01" and "1" keep their byte order
        keys.sort_by(|x, y| numeric_key(x).cmp(&numeric_key(y)));
    }
    keys
}

fn numeric_key(digits: &str) -> (usize, &str) {
    let significant = digits.trim_start_matches('0');
    (significant.len(), significant)
}
