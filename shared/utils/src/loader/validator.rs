//! BOM Validator
//!
//! Detects (model, component) pairs listed more than once and applies the
//! configured duplicate policy.

use crosstab_models::{BomTable, DuplicateBomEntry};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CrosstabError, CrosstabResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The row loaded last is authoritative; duplicates are logged
    #[default]
    LastWins,
    /// Any duplicate fails the load
    Reject,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWins => write!(f, "last_wins"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

pub struct BomValidator {
    policy: DuplicatePolicy,
}

impl BomValidator {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    /// Returns the duplicates found; fails on the first one under `Reject`.
    pub fn check_duplicates(&self, bom: &BomTable) -> CrosstabResult<Vec<DuplicateBomEntry>> {
        let duplicates = bom.duplicates();

        match (self.policy, duplicates.first()) {
            (DuplicatePolicy::Reject, Some(first)) => Err(CrosstabError::DuplicateBomEntry {
                sheet: bom.sheet.clone(),
                model: first.model.clone(),
                component: first.component.clone(),
                rows: first.rows.clone(),
            }),
            _ => {
                for dup in &duplicates {
                    crate::log_warn!(
                        "Duplicate BOM entry in '{}': model '{}', component '{}' on rows {:?}; using row {}",
                        bom.sheet,
                        dup.model,
                        dup.component,
                        dup.rows,
                        dup.rows.last().copied().unwrap_or_default()
                    );
                }
                Ok(duplicates)
            }
        }
    }
}
