//! Per-model pivot of consumed quantities.

use serde::{Deserialize, Serialize};

/// Dense group key x component matrix for one model.
///
/// Every (group key, component) pair has a value; pairs with no recorded
/// consumption hold `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub model: String,
    pub group_keys: Vec<String>,
    pub components: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl PivotTable {
    /// `values` is row-major, one row per group key with one value per component.
    pub fn new(
        model: impl Into<String>,
        group_keys: Vec<String>,
        components: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(values.len(), group_keys.len());
        debug_assert!(values.iter().all(|row| row.len() == components.len()));

        Self {
            model: model.into(),
            group_keys,
            components,
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.group_keys.is_empty()
    }

    /// Value for a (group key, component) pair; `None` only if either key is
    /// not part of the pivot.
    pub fn value(&self, group_key: &str, component: &str) -> Option<f64> {
        let row = self.group_keys.iter().position(|g| g == group_key)?;
        let col = self.components.iter().position(|c| c == component)?;
        Some(self.values[row][col])
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.group_keys
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_lookup() {
        let pivot = PivotTable::new(
            "X",
            vec!["G1".into(), "G2".into()],
            vec!["A".into(), "B".into()],
            vec![vec![10.0, 3.0], vec![12.0, 0.0]],
        );

        assert_eq!(pivot.value("G1", "B"), Some(3.0));
        assert_eq!(pivot.value("G2", "B"), Some(0.0));
        assert_eq!(pivot.value("G3", "A"), None);
        assert_eq!(pivot.rows().count(), 2);
    }
}
