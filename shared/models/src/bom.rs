//! Bill of materials domain models.
//!
//! A BOM record states how much of a component one unit of a model is
//! expected to consume. The table keeps rows in load order, which is what
//! makes the "last row wins" lookup well defined.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomRecord {
    pub model: String,
    pub component: String,
    /// Expected quantity per unit (UMB)
    pub expected_quantity: f64,
    /// 1-based spreadsheet row the record was read from
    pub source_row: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BomTable {
    pub sheet: String,
    pub records: Vec<BomRecord>,
}

/// A (model, component) pair that appears on more than one BOM row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateBomEntry {
    pub model: String,
    pub component: String,
    pub rows: Vec<usize>,
}

impl BomTable {
    pub fn new(sheet: impl Into<String>, records: Vec<BomRecord>) -> Self {
        Self {
            sheet: sheet.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct models, sorted by byte order.
    pub fn models(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.model.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.records.iter().any(|r| r.model == model)
    }

    pub fn rows_for<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a BomRecord> + 'a {
        self.records.iter().filter(move |r| r.model == model)
    }

    /// Expected quantity per component for `model`. Later rows override
    /// earlier ones for the same component.
    pub fn expected_for<'a>(&'a self, model: &'a str) -> BTreeMap<&'a str, f64> {
        self.rows_for(model)
            .map(|r| (r.component.as_str(), r.expected_quantity))
            .collect()
    }

    /// Every (model, component) pair listed more than once, in key order.
    pub fn duplicates(&self) -> Vec<DuplicateBomEntry> {
        let mut seen: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
        for record in &self.records {
            seen.entry((record.model.as_str(), record.component.as_str()))
                .or_default()
                .push(record.source_row);
        }

        seen.into_iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|((model, component), rows)| DuplicateBomEntry {
                model: model.to_string(),
                component: component.to_string(),
                rows,
            })
            .collect()
    }
}
