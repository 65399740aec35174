pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod loader;
pub mod crosstab;
pub mod report;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use validation::*;
pub use loader::{DataLoader, DuplicatePolicy, LoadedData, PartitionRule, SheetRefs};
pub use crosstab::{annotate, build_crosstab, classify_model};
pub use report::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.reports.sheets.consumption, "COOIS");
    }

    #[test]
    fn test_error_handling() {
        let error = CrosstabError::validation("test_field", "test message");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.http_status_code(), 400);

        let error = CrosstabError::unknown_model("Y");
        assert_eq!(error.error_code(), "UNKNOWN_MODEL");
        assert_eq!(error.http_status_code(), 422);
        assert!(!error.is_load_error());
    }

    #[test]
    fn test_error_response_details() {
        let response = ErrorResponse::from(CrosstabError::invalid_value("BOM_EA", 7, "ctd", "not a number"));
        assert_eq!(response.code, "LOAD_ERROR");
        assert_eq!(response.details.unwrap()["row"], 7);
    }
}
