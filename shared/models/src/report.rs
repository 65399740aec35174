//! Report domain models: one report per subset, one sheet per model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ClassificationCounts, ClassifiedSheet, Subset};

pub const MATERIAL_LABEL: &str = "Material";
pub const EXPECTED_LABEL: &str = "Cantidad_BOM";
pub const INDEX_SHEET_NAME: &str = "Índice";
pub const INDEX_HEADER: &str = "Modelo";

/// Lists every model of a report; each entry links to the model's sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSheet {
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub subset: Subset,
    pub label: String,
    pub generated_at: DateTime<Utc>,
    pub index: IndexSheet,
    pub sheets: Vec<ClassifiedSheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub subset: String,
    pub models: usize,
    pub cells: ClassificationCounts,
}

impl Report {
    pub fn new(subset: Subset, label: impl Into<String>, sheets: Vec<ClassifiedSheet>) -> Self {
        let index = IndexSheet {
            models: sheets.iter().map(|s| s.model.clone()).collect(),
        };

        Self {
            id: Uuid::new_v4(),
            subset,
            label: label.into(),
            generated_at: Utc::now(),
            index,
            sheets,
        }
    }

    pub fn sheet(&self, model: &str) -> Option<&ClassifiedSheet> {
        self.sheets.iter().find(|s| s.model == model)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut cells = ClassificationCounts::default();
        for sheet in &self.sheets {
            cells.merge(&sheet.counts());
        }

        ReportSummary {
            subset: self.label.clone(),
            models: self.sheets.len(),
            cells,
        }
    }
}
