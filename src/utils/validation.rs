use crate::utils::error::{AdvisorError, Result};
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> AdvisorError {
    AdvisorError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 上游 API 的 base URL 只接受 http/https
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            ))
        }
    }
    if url.host_str().is_none() {
        return Err(invalid(field_name, url_str, "URL has no host"));
    }
    Ok(())
}

pub fn validate_socket_addr(field_name: &str, addr: &str) -> Result<()> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| invalid(field_name, addr, "Expected host:port, e.g. 0.0.0.0:8000"))
}

/// Catalog and index files are JSON documents.
pub fn validate_json_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    let is_json = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        return Err(invalid(field_name, path, "Expected a .json file"));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
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
        return Err(invalid(
            field_name,
            value,
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
        assert!(validate_url("openai.base_url", "https://api.openai.com/v1").is_ok());
        assert!(validate_url("soil.weather_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("brave.base_url", "").is_err());
        assert!(validate_url("brave.base_url", "invalid-url").is_err());
        assert!(validate_url("nass.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_socket_addr() {
        assert!(validate_socket_addr("server.addr", "0.0.0.0:8000").is_ok());
        assert!(validate_socket_addr("server.addr", "localhost").is_err());
    }

    #[test]
    fn test_validate_json_path() {
        assert!(validate_json_path("grants.catalog_path", "data/usda_grants.json").is_ok());
        assert!(validate_json_path("grants.index_path", "data/usda_grants.faiss").is_err());
        assert!(validate_json_path("grants.index_path", " ").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("grants.top_k", 5, 1, 50).is_ok());
        assert!(validate_range("grants.top_k", 0, 1, 50).is_err());
        assert!(validate_range("http.timeout_seconds", 301, 1, 300).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("openai.chat_model", "gpt-4o").is_ok());
        match validate_non_empty_string("openai.chat_model", "   ") {
            Err(AdvisorError::InvalidConfigValueError { field, .. }) => {
                assert_eq!(field, "openai.chat_model")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
