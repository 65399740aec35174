//! Production order consumption records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub model: String,
    pub component: String,
    /// Production order (or other grouping) the consumption is booked against
    pub group_key: String,
    pub quantity: f64,
    /// Value of the optional subset column, when the extract carries one
    pub subset_tag: Option<String>,
    pub source_row: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionTable {
    pub sheet: String,
    pub records: Vec<ConsumptionRecord>,
}

impl ConsumptionTable {
    pub fn new(sheet: impl Into<String>, records: Vec<ConsumptionRecord>) -> Self {
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

    pub fn for_model<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a ConsumptionRecord> + 'a {
        self.records.iter().filter(move |r| r.model == model)
    }
}
