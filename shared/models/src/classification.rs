//! Cell classification against the expected BOM quantity.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Under,
    Exact,
    Over,
}

impl Classification {
    /// Exact comparison, no tolerance. `Exact` holds iff `value == expected`.
    pub fn classify(value: f64, expected: f64) -> Self {
        if value < expected {
            Self::Under
        } else if value == expected {
            Self::Exact
        } else {
            Self::Over
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Under => write!(f, "UNDER"),
            Self::Exact => write!(f, "EXACT"),
            Self::Over => write!(f, "OVER"),
        }
    }
}

/// Expected quantity for one component column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExpectedQuantity {
    Quantity(f64),
    /// The component was consumed but has no BOM entry for the model
    NotApplicable,
}

impl ExpectedQuantity {
    pub fn classify(&self, value: f64) -> Option<Classification> {
        match self {
            Self::Quantity(expected) => Some(Classification::classify(value, *expected)),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for ExpectedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity(q) => write!(f, "{}", q),
            Self::NotApplicable => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCell {
    pub value: f64,
    /// `None` for columns whose expected quantity is not applicable
    pub classification: Option<Classification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    pub group_key: String,
    pub cells: Vec<ClassifiedCell>,
}

/// A model's pivot with the "Material" / "Cantidad_BOM" header rows resolved
/// and every data cell classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSheet {
    pub model: String,
    pub components: Vec<String>,
    pub expected: Vec<ExpectedQuantity>,
    pub rows: Vec<ClassifiedRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub under: usize,
    pub exact: usize,
    pub over: usize,
    pub unclassified: usize,
}

impl ClassificationCounts {
    pub fn record(&mut self, classification: Option<Classification>) {
        match classification {
            Some(Classification::Under) => self.under += 1,
            Some(Classification::Exact) => self.exact += 1,
            Some(Classification::Over) => self.over += 1,
            None => self.unclassified += 1,
        }
    }

    pub fn merge(&mut self, other: &ClassificationCounts) {
        self.under += other.under;
        self.exact += other.exact;
        self.over += other.over;
        self.unclassified += other.unclassified;
    }

    pub fn total(&self) -> usize {
        self.under + self.exact + self.over + self.unclassified
    }
}

impl ClassifiedSheet {
    pub fn cell(&self, group_key: &str, component: &str) -> Option<&ClassifiedCell> {
        let col = self.components.iter().position(|c| c == component)?;
        self.rows
            .iter()
            .find(|r| r.group_key == group_key)
            .and_then(|r| r.cells.get(col))
    }

    pub fn expected_for(&self, component: &str) -> Option<ExpectedQuantity> {
        let col = self.components.iter().position(|c| c == component)?;
        self.expected.get(col).copied()
    }

    pub fn counts(&self) -> ClassificationCounts {
        let mut counts = ClassificationCounts::default();
        for cell in self.rows.iter().flat_map(|r| r.cells.iter()) {
            counts.record(cell.classification);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_three_way() {
        assert_eq!(Classification::classify(3.0, 5.0), Classification::Under);
        assert_eq!(Classification::classify(5.0, 5.0), Classification::Exact);
        assert_eq!(Classification::classify(12.0, 10.0), Classification::Over);
        assert_eq!(Classification::classify(0.0, 0.0), Classification::Exact);
    }

    #[test]
    fn test_no_tolerance_on_equality() {
        let summed = 0.1 + 0.2;
        assert_eq!(Classification::classify(summed, 0.3), Classification::Over);
    }

    #[test]
    fn test_not_applicable_is_unclassified() {
        assert_eq!(ExpectedQuantity::NotApplicable.classify(4.0), None);
        assert_eq!(ExpectedQuantity::NotApplicable.to_string(), "N/A");
        assert_eq!(
            ExpectedQuantity::Quantity(2.0).classify(4.0),
            Some(Classification::Over)
        );
    }

    #[test]
    fn test_counts() {
        let sheet = ClassifiedSheet {
            model: "X".into(),
            components: vec!["A".into(), "B".into()],
            expected: vec![ExpectedQuantity::Quantity(1.0), ExpectedQuantity::NotApplicable],
            rows: vec![ClassifiedRow {
                group_key: "G1".into(),
                cells: vec![
                    ClassifiedCell { value: 1.0, classification: Some(Classification::Exact) },
                    ClassifiedCell { value: 7.0, classification: None },
                ],
            }],
        };

        let counts = sheet.counts();
        assert_eq!(counts.exact, 1);
        assert_eq!(counts.unclassified, 1);
        assert_eq!(counts.total(), 2);
        assert_eq!(sheet.cell("G1", "B").map(|c| c.value), Some(7.0));
    }
}
