//! Product subsets.
//!
//! Models are partitioned into two subsets that are reported independently,
//! each into its own workbook.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subset {
    A,
    B,
}

impl Subset {
    pub const ALL: [Subset; 2] = [Subset::A, Subset::B];
}

/// Display labels for the two subsets, used in file names and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetLabels {
    pub a: String,
    pub b: String,
}

impl SubsetLabels {
    pub fn label(&self, subset: Subset) -> &str {
        match subset {
            Subset::A => &self.a,
            Subset::B => &self.b,
        }
    }
}

impl Default for SubsetLabels {
    fn default() -> Self {
        Self {
            a: "EA".to_string(),
            b: "EB".to_string(),
        }
    }
}

/// A value held once per subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BySubset<T> {
    pub a: T,
    pub b: T,
}

impl<T> BySubset<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn get(&self, subset: Subset) -> &T {
        match subset {
            Subset::A => &self.a,
            Subset::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, subset: Subset) -> &mut T {
        match subset {
            Subset::A => &mut self.a,
            Subset::B => &mut self.b,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subset, &T)> {
        [(Subset::A, &self.a), (Subset::B, &self.b)].into_iter()
    }
}
