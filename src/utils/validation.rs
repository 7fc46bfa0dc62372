use crate::utils::error::{Result, ScrapeError};
use std::fmt::Display;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Accepts absolute http(s) URLs only.
pub fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ScrapeError::invalid_value(field, value, "URL cannot be empty"));
    }

    let url = Url::parse(value)
        .map_err(|e| ScrapeError::invalid_value(field, value, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ScrapeError::invalid_value(
            field,
            value,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ScrapeError::invalid_value(field, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(ScrapeError::invalid_value(field, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(ScrapeError::invalid_value(
            field,
            value,
            format!("Value must be at least {}", min),
        ));
    }
    Ok(())
}

/// Case-insensitive extension check.
pub fn validate_file_extension(field: &str, file: &str, allowed: &[&str]) -> Result<()> {
    let Some(extension) = Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return Err(ScrapeError::invalid_value(field, file, "File has no extension"));
    };

    if allowed.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ScrapeError::invalid_value(
            field,
            file,
            format!(
                "Unsupported file extension '{}', expected one of: {}",
                extension,
                allowed.join(", ")
            ),
        ))
    }
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScrapeError::invalid_value(
            field,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(ScrapeError::invalid_value(
            field,
            &value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("site.base_url", "https://www.google.com/maps").is_ok());
        assert!(validate_url("site.base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("site.base_url", "").is_err());
        assert!(validate_url("site.base_url", "invalid-url").is_err());
        assert!(validate_url("site.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("max_results", 5, 1).is_ok());
        assert!(validate_positive_number("max_results", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        let allowed = ["xlsx", "zip", "json"];
        assert!(validate_file_extension("output", "out/businesses.xlsx", &allowed).is_ok());
        assert!(validate_file_extension("output", "BUSINESSES.XLSX", &allowed).is_ok());
        assert!(validate_file_extension("output", "businesses.txt", &allowed).is_err());
        assert!(validate_file_extension("output", "businesses", &allowed).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("retry.backoff.factor", 2.0, 1.0, 10.0).is_ok());
        assert!(validate_range("retry.backoff.factor", 0.5, 1.0, 10.0).is_err());
    }
}
