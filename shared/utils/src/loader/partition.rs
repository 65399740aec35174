//! Consumption partitioning by subset.
//!
//! The consumption extract covers every model; each subset report only sees
//! the records that belong to it. Membership is a predicate so callers can
//! plug in their own rule.

use crosstab_models::{BomTable, BySubset, ConsumptionRecord, ConsumptionTable, Subset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PartitionRule {
    /// A record belongs to every subset whose BOM lists its model
    #[default]
    BomMembership,
    /// A record belongs to a subset when its model starts with one of the prefixes
    ModelPrefix { a: Vec<String>, b: Vec<String> },
    /// A record belongs to a subset when its subset column holds one of the values
    SubsetColumn { a: Vec<String>, b: Vec<String> },
}

impl PartitionRule {
    pub fn needs_subset_column(&self) -> bool {
        matches!(self, Self::SubsetColumn { .. })
    }
}

impl fmt::Display for PartitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BomMembership => write!(f, "bom_membership"),
            Self::ModelPrefix { a, b } => write!(f, "model_prefix(a={:?}, b={:?})", a, b),
            Self::SubsetColumn { a, b } => write!(f, "subset_column(a={:?}, b={:?})", a, b),
        }
    }
}

pub trait SubsetMembership {
    fn belongs_to(&self, record: &ConsumptionRecord, subset: Subset) -> bool;
}

impl<F> SubsetMembership for F
where
    F: Fn(&ConsumptionRecord, Subset) -> bool,
{
    fn belongs_to(&self, record: &ConsumptionRecord, subset: Subset) -> bool {
        self(record, subset)
    }
}

/// `PartitionRule` bound to the loaded BOM tables.
pub struct RuleMembership<'a> {
    rule: &'a PartitionRule,
    bom_models: BySubset<BTreeSet<&'a str>>,
}

impl<'a> RuleMembership<'a> {
    pub fn new(rule: &'a PartitionRule, bom: &'a BySubset<BomTable>) -> Self {
        Self {
            rule,
            bom_models: BySubset::new(
                bom.a.models().into_iter().collect(),
                bom.b.models().into_iter().collect(),
            ),
        }
    }
}

impl SubsetMembership for RuleMembership<'_> {
    fn belongs_to(&self, record: &ConsumptionRecord, subset: Subset) -> bool {
        match self.rule {
            PartitionRule::BomMembership => self.bom_models.get(subset).contains(record.model.as_str()),
            PartitionRule::ModelPrefix { a, b } => pick(subset, a, b)
                .iter()
                .any(|prefix| record.model.starts_with(prefix.as_str())),
            PartitionRule::SubsetColumn { a, b } => record.subset_tag.as_deref().map_or(false, |tag| {
                pick(subset, a, b)
                    .iter()
                    .any(|value| value.trim().eq_ignore_ascii_case(tag.trim()))
            }),
        }
    }
}

fn pick<'v>(subset: Subset, a: &'v [String], b: &'v [String]) -> &'v [String] {
    match subset {
        Subset::A => a,
        Subset::B => b,
    }
}

pub fn split_consumption_by_subset(
    consumption: &ConsumptionTable,
    membership: &dyn SubsetMembership,
) -> BySubset<ConsumptionTable> {
    let mut split = BySubset::new(
        ConsumptionTable::new(&consumption.sheet, Vec::new()),
        ConsumptionTable::new(&consumption.sheet, Vec::new()),
    );
    let mut unassigned = 0usize;

    for record in &consumption.records {
        let mut assigned = false;
        for subset in Subset::ALL {
            if membership.belongs_to(record, subset) {
                split.get_mut(subset).records.push(record.clone());
                assigned = true;
            }
        }
        if !assigned {
            unassigned += 1;
        }
    }

    if unassigned > 0 {
        crate::log_warn!(
            "{} consumption records in '{}' belong to no subset and were left out",
            unassigned,
            consumption.sheet
        );
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstab_models::BomRecord;

    fn consumption(model: &str, tag: Option<&str>) -> ConsumptionRecord {
        ConsumptionRecord {
            model: model.into(),
            component: "C".into(),
            group_key: "G".into(),
            quantity: 1.0,
            subset_tag: tag.map(String::from),
            source_row: 2,
        }
    }

    fn bom(models: &[&str]) -> BomTable {
        BomTable::new(
            "BOM",
            models
                .iter()
                .map(|m| BomRecord {
                    model: m.to_string(),
                    component: "C".into(),
                    expected_quantity: 1.0,
                    source_row: 2,
                })
                .collect(),
        )
    }

    #[test]
    fn test_bom_membership_split() {
        let boms = BySubset::new(bom(&["A1", "AB"]), bom(&["B1", "AB"]));
        let table = ConsumptionTable::new(
            "COOIS",
            vec![consumption("A1", None), consumption("B1", None), consumption("AB", None), consumption("Z", None)],
        );

        let rule = PartitionRule::BomMembership;
        let split = split_consumption_by_subset(&table, &RuleMembership::new(&rule, &boms));

        let models = |t: &ConsumptionTable| t.records.iter().map(|r| r.model.clone()).collect::<Vec<_>>();
        assert_eq!(models(&split.a), vec!["A1", "AB"]);
        assert_eq!(models(&split.b), vec!["B1", "AB"]);
    }

    #[test]
    fn test_model_prefix_split() {
        let boms = BySubset::default();
        let rule = PartitionRule::ModelPrefix {
            a: vec!["EA".into()],
            b: vec!["EB".into(), "XB".into()],
        };
        let table = ConsumptionTable::new(
            "COOIS",
            vec![consumption("EA-100", None), consumption("XB-1", None), consumption("Q", None)],
        );

        let split = split_consumption_by_subset(&table, &RuleMembership::new(&rule, &boms));
        assert_eq!(split.a.len(), 1);
        assert_eq!(split.b.len(), 1);
        assert_eq!(split.b.records[0].model, "XB-1");
    }

    #[test]
    fn test_column_split_is_case_insensitive() {
        let boms = BySubset::default();
        let rule = PartitionRule::SubsetColumn {
            a: vec!["EA".into()],
            b: vec!["EB".into()],
        };
        let table = ConsumptionTable::new(
            "COOIS",
            vec![consumption("M", Some("ea")), consumption("M", Some("EB")), consumption("M", None)],
        );

        let split = split_consumption_by_subset(&table, &RuleMembership::new(&rule, &boms));
        assert_eq!(split.a.len(), 1);
        assert_eq!(split.b.len(), 1);
    }

    #[test]
    fn test_subset_column_rule_from_config() {
        let source = config::Config::builder()
            .add_source(config::File::from_str(
                "strategy = \"subset_column\"\na = [\"EA\"]\nb = [\"EB\"]\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let rule: PartitionRule = source.try_deserialize().unwrap();
        assert!(rule.needs_subset_column());
        assert_eq!(rule.to_string(), "subset_column(a=[\"EA\"], b=[\"EB\"])");
    }

    #[test]
    fn test_closure_membership() {
        let table = ConsumptionTable::new("COOIS", vec![consumption("M1", None), consumption("M2", None)]);
        let only_b = |record: &ConsumptionRecord, subset: Subset| subset == Subset::B && record.model == "M2";

        let split = split_consumption_by_subset(&table, &only_b);
        assert!(split.a.is_empty());
        assert_eq!(split.b.len(), 1);
    }
}
