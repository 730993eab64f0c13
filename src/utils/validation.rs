use crate::utils::error::{ReviewError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.trim().is_empty() {
        return Err(ReviewError::configuration(format!(
            "{}: URL cannot be empty",
            field_name
        )));
    }

    let url = Url::parse(url_str.trim()).map_err(|e| {
        ReviewError::configuration(format!("{}: invalid URL '{}': {}", field_name, url_str, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ReviewError::configuration(format!(
            "{}: unsupported URL scheme: {}",
            field_name, scheme
        ))),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReviewError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ReviewError::configuration(format!(
            "{}: value {} must be between {} and {}",
            field_name, value, min, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://example.com").is_ok());
        assert!(validate_url("base_url", "http://localhost:8080/api").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "   ").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("review", "hello").is_ok());
        assert!(validate_non_empty_string("review", " \n\t").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("timeout_seconds", 30u64, 1, 300).is_ok());
        assert!(validate_range("timeout_seconds", 0u64, 1, 300).is_err());
        assert!(validate_range("timeout_seconds", 301u64, 1, 300).is_err());
    }
}
