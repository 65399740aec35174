//! Data Loader
//!
//! Reads the two BOM sheets and the production order consumption sheet,
//! normalises them into relational tables and partitions consumption by
//! subset.

pub mod parser;
pub mod extractor;
pub mod validator;
pub mod partition;

pub use parser::{open_source, CellValue, CsvSource, RawTable, SourceFormat, TabularSource, XlsxSource};
pub use extractor::{BomColumns, ColumnAliases, ConsumptionColumns, RecordExtractor};
pub use validator::{BomValidator, DuplicatePolicy};
pub use partition::{split_consumption_by_subset, PartitionRule, RuleMembership, SubsetMembership};

use crosstab_models::{BomTable, BySubset, ConsumptionTable, Subset};
use serde::{Deserialize, Serialize};
use ::validator::Validate;

use crate::config::AppConfig;
use crate::error::CrosstabResult;

/// Names of the three source sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SheetRefs {
    #[validate(length(min = 1))]
    pub bom_a: String,
    #[validate(length(min = 1))]
    pub bom_b: String,
    #[validate(length(min = 1))]
    pub consumption: String,
}

impl SheetRefs {
    pub fn bom(&self, subset: Subset) -> &str {
        match subset {
            Subset::A => &self.bom_a,
            Subset::B => &self.bom_b,
        }
    }
}

impl Default for SheetRefs {
    fn default() -> Self {
        Self {
            bom_a: "BOM_EA".to_string(),
            bom_b: "BOM_EB".to_string(),
            consumption: "COOIS".to_string(),
        }
    }
}

/// Everything a run reads, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bom: BySubset<BomTable>,
    pub consumption: ConsumptionTable,
}

pub struct DataLoader {
    columns: ColumnAliases,
    partition: PartitionRule,
    validator: BomValidator,
}

impl DataLoader {
    pub fn new(columns: ColumnAliases, partition: PartitionRule, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            columns,
            partition,
            validator: BomValidator::new(duplicate_policy),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.columns.clone(),
            config.reports.partition.clone(),
            config.reports.duplicate_policy,
        )
    }

    /// Loads all three sheets from one source.
    pub fn load(&self, source: &mut dyn TabularSource, refs: &SheetRefs) -> CrosstabResult<LoadedData> {
        let bom_a = source.read_table(&refs.bom_a)?;
        let bom_b = source.read_table(&refs.bom_b)?;
        let consumption = source.read_table(&refs.consumption)?;
        self.normalize(bom_a, bom_b, consumption)
    }

    /// Loads the BOM sheets from `stocks` and the consumption sheet from a
    /// separate extract.
    pub fn load_split(
        &self,
        stocks: &mut dyn TabularSource,
        consumption: &mut dyn TabularSource,
        refs: &SheetRefs,
    ) -> CrosstabResult<LoadedData> {
        let bom_a = stocks.read_table(&refs.bom_a)?;
        let bom_b = stocks.read_table(&refs.bom_b)?;
        let consumption = consumption.read_table(&refs.consumption)?;
        self.normalize(bom_a, bom_b, consumption)
    }

    fn normalize(&self, bom_a: RawTable, bom_b: RawTable, consumption: RawTable) -> CrosstabResult<LoadedData> {
        let extractor = RecordExtractor::new(&self.columns);
        let bom = BySubset::new(extractor.bom(&bom_a)?, extractor.bom(&bom_b)?);
        for (_, table) in bom.iter() {
            self.validator.check_duplicates(table)?;
        }

        let consumption = extractor.consumption(&consumption, self.partition.needs_subset_column())?;

        crate::log_info!(
            "Loaded {} + {} BOM rows and {} consumption rows",
            bom.a.len(),
            bom.b.len(),
            consumption.len()
        );

        Ok(LoadedData { bom, consumption })
    }

    /// Consumption split per subset using the configured partition rule.
    pub fn partition(&self, data: &LoadedData) -> BySubset<ConsumptionTable> {
        let membership = RuleMembership::new(&self.partition, &data.bom);
        split_consumption_by_subset(&data.consumption, &membership)
    }
}
