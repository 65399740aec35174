//! # Crosstab Core Domain Models
//!
//! Domain types shared by the loader, the crosstab engine and the HTTP gateway.
//!
//! ## Key Models
//!
//! - **BomTable / BomRecord**: expected component quantity per model (the "UMB" quantity)
//! - **ConsumptionTable / ConsumptionRecord**: quantities consumed per production order
//! - **PivotTable**: group key x component matrix of summed consumption for one model
//! - **ClassifiedSheet**: a pivot annotated with the expected quantity row and a
//!   per-cell UNDER / EXACT / OVER classification
//! - **Report**: one workbook worth of classified sheets for a subset, plus its index

pub mod subset;
pub mod bom;
pub mod consumption;
pub mod pivot;
pub mod classification;
pub mod report;

#[cfg(test)]
pub mod property_tests;

pub use subset::*;
pub use bom::*;
pub use consumption::*;
pub use pivot::*;
pub use classification::*;
pub use report::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_labels_default() {
        let labels = SubsetLabels::default();
        assert_eq!(labels.label(Subset::A), "EA");
        assert_eq!(labels.label(Subset::B), "EB");
    }

    #[test]
    fn test_header_labels() {
        assert_eq!(MATERIAL_LABEL, "Material");
        assert_eq!(EXPECTED_LABEL, "Cantidad_BOM");
        assert_eq!(INDEX_SHEET_NAME, "Índice");
        assert_eq!(INDEX_HEADER, "Modelo");
    }
}
