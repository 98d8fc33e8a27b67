pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod import;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.import.max_rows, 10_000);
    }

    #[test]
    fn test_error_handling() {
        let error = FieldOpsError::validation("test_field", "test message");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.http_status_code(), 400);

        let error = FieldOpsError::parse("missing header line");
        assert_eq!(error.http_status_code(), 400);
        assert_eq!(error.into_message(), "missing header line");

        assert_eq!(FieldOpsError::persistence("x").http_status_code(), 500);
    }
}
