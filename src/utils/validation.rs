use crate::utils::error::{CaptureError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str, allowed_schemes: &[&str]) -> Result<()> {
    if url_str.is_empty() {
        return Err(CaptureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => {
            if allowed_schemes.contains(&url.scheme()) {
                Ok(())
            } else {
                Err(CaptureError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: format!("Unsupported URL scheme: {}", url.scheme()),
                })
            }
        }
        Err(e) => Err(CaptureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// The template must contain exactly one `{slug}` placeholder and render to an http(s) URL.
pub fn validate_url_template(field_name: &str, template: &str) -> Result<()> {
    if template.matches("{slug}").count() != 1 {
        return Err(CaptureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: template.to_string(),
            reason: "Template must contain exactly one {slug} placeholder".to_string(),
        });
    }
    validate_url(field_name, &template.replace("{slug}", "venue"), &["http", "https"])
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CaptureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CaptureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CaptureError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_site_ids(field_name: &str, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(CaptureError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    for id in ids {
        validate_non_empty_string(field_name, id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        let web = ["http", "https"];
        assert!(validate_url("devtools_url", "http://127.0.0.1:9222", &web).is_ok());
        assert!(validate_url("devtools_url", "", &web).is_err());
        assert!(validate_url("devtools_url", "not a url", &web).is_err());
        assert!(validate_url("devtools_url", "ws://127.0.0.1:9222", &web).is_err());
        assert!(validate_url("ws_url", "ws://127.0.0.1:9222", &["ws", "wss"]).is_ok());
    }

    #[test]
    fn test_validate_url_template() {
        assert!(validate_url_template("venue_url", "https://www.curzon.com/venues/{slug}/").is_ok());
        assert!(validate_url_template("venue_url", "https://www.curzon.com/venues/").is_err());
        assert!(validate_url_template("venue_url", "{slug}/{slug}").is_err());
    }

    #[test]
    fn test_validate_site_ids() {
        assert!(validate_site_ids("allowlist", &["MAY1".to_string()]).is_ok());
        assert!(matches!(
            validate_site_ids("allowlist", &[]),
            Err(CaptureError::MissingConfigError { .. })
        ));
        assert!(validate_site_ids("allowlist", &["  ".to_string()]).is_err());
    }
}
