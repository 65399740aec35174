//! Property-based tests for the crosstab domain models
//!
//! Covers the classification invariants and the BOM lookup guarantees that
//! the report layer relies on.

use proptest::prelude::*;

use crate::{
    BomRecord, BomTable, Classification, ClassificationCounts, ClassifiedCell, ClassifiedRow,
    ClassifiedSheet, ExpectedQuantity,
};

prop_compose! {
    fn arb_quantity()(whole in 0u32..1000, frac in prop::sample::select(vec![0.0, 0.25, 0.5, 0.125])) -> f64 {
        whole as f64 + frac
    }
}

prop_compose! {
    fn arb_bom_record()(
        model in "M[0-9]{1,2}",
        component in "C[0-9]{1,2}",
        expected_quantity in arb_quantity(),
        source_row in 2usize..500,
    ) -> BomRecord {
        BomRecord { model, component, expected_quantity, source_row }
    }
}

proptest! {
    /// Exactly one classification is produced and EXACT iff the values are equal
    #[test]
    fn prop_classification_total_and_exact(value in arb_quantity(), expected in arb_quantity()) {
        let class = Classification::classify(value, expected);
        prop_assert_eq!(class == Classification::Exact, value == expected);
        prop_assert_eq!(class == Classification::Under, value < expected);
        prop_assert_eq!(class == Classification::Over, value > expected);
    }

    #[test]
    fn prop_classification_any_float(value in any::<f64>(), expected in any::<f64>()) {
        let class = Classification::classify(value, expected);
        prop_assert_eq!(class == Classification::Exact, value == expected);
    }

    #[test]
    fn prop_not_applicable_never_classified(value in arb_quantity()) {
        prop_assert!(ExpectedQuantity::NotApplicable.classify(value).is_none());
    }

    /// The lookup holds the quantity of the last row listing each component
    #[test]
    fn prop_expected_for_last_wins(records in prop::collection::vec(arb_bom_record(), 1..40)) {
        let bom = BomTable::new("BOM", records.clone());
        for model in bom.models() {
            let expected = bom.expected_for(model);
            for (component, qty) in &expected {
                let last = records.iter()
                    .filter(|r| r.model == model && r.component == *component)
                    .last()
                    .map(|r| r.expected_quantity);
                prop_assert_eq!(last, Some(*qty));
            }
        }
    }

    #[test]
    fn prop_models_sorted_unique(records in prop::collection::vec(arb_bom_record(), 0..40)) {
        let bom = BomTable::new("BOM", records);
        let models = bom.models();
        prop_assert!(models.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_counts_cover_every_cell(values in prop::collection::vec(arb_quantity(), 1..20), expected in arb_quantity()) {
        let cells: Vec<ClassifiedCell> = values.iter()
            .map(|v| ClassifiedCell { value: *v, classification: Some(Classification::classify(*v, expected)) })
            .collect();
        let sheet = ClassifiedSheet {
            model: "M".into(),
            components: (0..cells.len()).map(|i| format!("C{}", i)).collect(),
            expected: vec![ExpectedQuantity::Quantity(expected); cells.len()],
            rows: vec![ClassifiedRow { group_key: "G".into(), cells }],
        };

        let counts: ClassificationCounts = sheet.counts();
        prop_assert_eq!(counts.total(), values.len());
        prop_assert_eq!(counts.unclassified, 0);
    }
}
