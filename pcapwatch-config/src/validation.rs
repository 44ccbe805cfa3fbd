// pcapwatch-config/src/validation.rs
//! Custom validation functions for configuration.

use std::net::IpAddr;

use validator::ValidationError;

/// Validate that the listen host is a literal IP address.
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    host.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_host"))
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts() {
        assert!(validate_host("0.0.0.0").is_ok());
        assert!(validate_host("::").is_ok());
        assert!(validate_host("localhost").is_err());
    }

    #[test]
    fn log_levels() {
        assert!(validate_log_level("INFO").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
